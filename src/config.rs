// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Settings consumed by the engine.
//!
//! Loading them from files or the environment is up to the caller: the
//! engine only receives a ready [`Config`]. [`cli::Opts`] is one way of
//! building it.
//!
//! [`cli::Opts`]: crate::cli::Opts

use std::{str::FromStr, time::Duration};

use derive_more::with_trait::{Display, Error};
use smart_default::SmartDefault;

use crate::detect::{DetectionMode, Detector};

/// Which step definitions a worker loads.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum StepLoading {
    /// Every registered definition.
    #[default]
    #[display("all")]
    All,

    /// Unscoped definitions, and the ones scoped to a required module.
    #[display("selective")]
    Selective,
}

/// Error of parsing an unknown [`StepLoading`].
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("unknown step loading strategy `{_0}`, expected `all` or `selective`")]
pub struct UnknownStepLoading(#[error(not(source))] pub String);

impl FromStr for StepLoading {
    type Err = UnknownStepLoading;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "selective" => Ok(Self::Selective),
            _ => Err(UnknownStepLoading(s.to_owned())),
        }
    }
}

/// Settings of module detection.
#[derive(Clone, Copy, Debug, PartialEq, SmartDefault)]
pub struct DetectionConfig {
    /// Whether detection runs at all.
    #[default = true]
    pub enabled: bool,

    /// Detection policy.
    pub mode: DetectionMode,

    /// Whether a scenario signaling nothing requires the browser.
    #[default = true]
    pub default_browser: bool,

    /// Whether every scenario requires the browser.
    pub force_browser: bool,
}

impl DetectionConfig {
    /// Builds the [`Detector`] these settings describe.
    #[must_use]
    pub const fn detector(&self) -> Detector {
        Detector {
            enabled: self.enabled,
            mode: self.mode,
            default_browser: self.default_browser,
            force_browser: self.force_browser,
        }
    }
}

/// Settings of the healing engine.
#[derive(Clone, Copy, Debug, PartialEq, SmartDefault)]
pub struct HealingConfig {
    /// Whether failing UI steps are healed.
    #[default = true]
    pub enabled: bool,

    /// Maximum number of strategy invocations per failure.
    #[default = 8]
    pub max_attempts: usize,

    /// Minimum confidence of an accepted recovery, in `[0, 1]`.
    #[default = 0.7]
    pub confidence_threshold: f64,

    /// How long the wait-for-visibility strategy waits.
    #[default(Duration::from_secs(5))]
    pub wait_timeout: Duration,
}

/// Complete engine settings.
#[derive(Clone, Copy, Debug, PartialEq, SmartDefault)]
pub struct Config {
    /// Module detection.
    pub detection: DetectionConfig,

    /// Step definitions loading.
    pub step_loading: StepLoading,

    /// Healing.
    pub healing: HealingConfig,

    /// Time bound of a step without its own override.
    #[default(Duration::from_secs(30))]
    pub step_timeout: Duration,

    /// Number of workers running scenarios in parallel.
    #[default = 1]
    pub concurrency: usize,
}
