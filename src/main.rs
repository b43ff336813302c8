// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Offline dry run of module detection over `.feature` files.

use std::io;

use anyhow::Context as _;
use stepwright::{cli::Opts, parser, Detector, Scenario};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let opts = Opts::parsed();
    let config = opts.config();
    let scenarios = parser::parse_path(&opts.path)
        .with_context(|| format!("failed to load `{}`", opts.path.display()))?;
    tracing::info!(scenarios = scenarios.len(), "features loaded");

    let detector = config.detection.detector();

    #[cfg(feature = "output-json")]
    if opts.json {
        let report = scenarios
            .iter()
            .map(|s| {
                serde_json::json!({
                    "feature": s.feature,
                    "scenario": s.name,
                    "line": s.line,
                    "modules": detector.detect(&s.descriptor()),
                })
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut out = io::stdout().lock();
    for scenario in &scenarios {
        report(&mut out, &detector, scenario)?;
    }
    Ok(())
}

fn report(out: &mut impl io::Write, detector: &Detector, s: &Scenario) -> io::Result<()> {
    let modules = detector.detect(&s.descriptor());
    let ui_steps = s.steps.iter().filter(|st| Detector::is_ui_step(&st.text)).count();
    writeln!(
        out,
        "{feature} / {name} (line {line}): {modules} [{ui_steps}/{total} UI steps]",
        feature = s.feature,
        name = s.name,
        line = s.line,
        total = s.steps.len(),
    )
}
