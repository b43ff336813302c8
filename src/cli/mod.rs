// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI (command line interface) of the `stepwright` binary.
//!
//! Every option maps onto a [`Config`] key. Options left unspecified keep
//! whatever the [`Config`] they're [applied] to already says.
//!
//! [applied]: Opts::apply

use std::{path::PathBuf, time::Duration};

pub use clap::{Args, Parser};

use crate::{
    config::{Config, StepLoading},
    detect::DetectionMode,
};

/// Root CLI of the `stepwright` binary.
#[derive(Clone, Debug, Parser)]
#[command(
    name = "stepwright",
    about = "Detect the runtime modules every scenario needs",
    long_about = "Parses `.feature` files and reports the runtime modules \
                  (ui, api, database, soap) each scenario would be started \
                  with."
)]
pub struct Opts {
    /// `.feature` file or directory to load scenarios from.
    #[arg(value_name = "path")]
    pub path: PathBuf,

    /// Module detection options.
    #[command(flatten)]
    pub detection: Detection,

    /// Healing options.
    #[command(flatten)]
    pub healing: Healing,

    /// Which step definitions a scenario sees.
    #[arg(long, value_name = "all|selective")]
    pub step_loading: Option<StepLoading>,

    /// Time bound of a step without its own override.
    ///
    /// Duration is represented in a human-readable format like `1m30s`.
    #[arg(long, value_name = "duration", value_parser = humantime::parse_duration)]
    pub step_timeout: Option<Duration>,

    /// Number of scenarios to run in parallel.
    #[arg(long, short, value_name = "int")]
    pub concurrency: Option<usize>,

    /// Print results as JSON.
    #[cfg(feature = "output-json")]
    #[arg(long)]
    pub json: bool,
}

/// CLI options of module detection.
#[derive(Clone, Copy, Debug, Default, Args)]
#[group(skip)]
pub struct Detection {
    /// Detection policy.
    #[arg(long = "detection", value_name = "auto|explicit|hybrid")]
    pub mode: Option<DetectionMode>,

    /// Require every module for every scenario.
    #[arg(long)]
    pub no_detection: bool,

    /// Don't fall back to the browser when nothing is detected.
    #[arg(long)]
    pub no_default_browser: bool,

    /// Always require the browser.
    #[arg(long)]
    pub force_browser: bool,
}

/// CLI options of the healing engine.
#[derive(Clone, Copy, Debug, Default, Args)]
#[group(skip)]
pub struct Healing {
    /// Report failing UI steps without trying to heal them.
    #[arg(long)]
    pub no_healing: bool,

    /// Maximum number of strategy invocations per failure.
    #[arg(long, value_name = "int")]
    pub max_healing_attempts: Option<usize>,

    /// Minimum confidence of an accepted recovery, in `[0, 1]`.
    #[arg(long, value_name = "float", value_parser = parse_threshold)]
    pub confidence_threshold: Option<f64>,

    /// How long the wait-for-visibility strategy waits.
    #[arg(long, value_name = "duration", value_parser = humantime::parse_duration)]
    pub wait_timeout: Option<Duration>,
}

impl Opts {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require the trait
    /// being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as Parser>::parse()
    }

    /// Overrides the given [`Config`] with the specified options.
    #[must_use]
    pub fn apply(&self, mut config: Config) -> Config {
        let (d, h) = (&self.detection, &self.healing);

        if let Some(mode) = d.mode {
            config.detection.mode = mode;
        }
        config.detection.enabled &= !d.no_detection;
        config.detection.default_browser &= !d.no_default_browser;
        config.detection.force_browser |= d.force_browser;

        config.healing.enabled &= !h.no_healing;
        if let Some(max) = h.max_healing_attempts {
            config.healing.max_attempts = max;
        }
        if let Some(threshold) = h.confidence_threshold {
            config.healing.confidence_threshold = threshold;
        }
        if let Some(timeout) = h.wait_timeout {
            config.healing.wait_timeout = timeout;
        }

        if let Some(loading) = self.step_loading {
            config.step_loading = loading;
        }
        if let Some(timeout) = self.step_timeout {
            config.step_timeout = timeout;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config
    }

    /// [`Config`] with the specified options applied over the defaults.
    #[must_use]
    pub fn config(&self) -> Config {
        self.apply(Config::default())
    }
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let v = s.parse::<f64>().map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{v} is not within [0, 1]"))
    }
}
