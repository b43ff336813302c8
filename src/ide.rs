// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Optional IDE integration.
//!
//! Editor plugins may want to know which step phrases exist and where they
//! are declared. The [`Registry`] reports every successful registration to a
//! [`MetadataSink`], which does nothing unless one is installed.
//!
//! [`Registry`]: crate::step::Registry

use std::time::Duration;

use crate::{
    detect::Module,
    step::{Keyword, Location},
};

/// Registration metadata of a single step definition.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
pub struct StepMetadata {
    /// Template the step was declared with.
    pub template: String,

    /// Keyword the step was declared with. Cosmetic only.
    pub keyword: Keyword,

    /// Where the step was declared.
    pub location: Option<Location>,

    /// Module the step belongs to, if scoped.
    pub module: Option<Module>,

    /// Timeout override of the step.
    #[cfg_attr(
        feature = "output-json",
        serde(serialize_with = "crate::writer::json::millis_opt")
    )]
    pub timeout: Option<Duration>,
}

/// Receiver of [`StepMetadata`].
///
/// Never blocks registration: implementations should only record.
pub trait MetadataSink: Send + Sync {
    /// Called once for every successfully registered step.
    fn step_registered(&self, step: &StepMetadata) {
        _ = step;
    }
}

/// [`MetadataSink`] ignoring everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl MetadataSink for NoopSink {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_accepts_anything() {
        NoopSink.step_registered(&StepMetadata {
            template: "I do {word}".into(),
            keyword: Keyword::When,
            location: None,
            module: Some(Module::Ui),
            timeout: None,
        });
    }
}
