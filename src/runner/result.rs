// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Structured results handed to reporters.

use std::time::Duration;

use derive_more::with_trait::Display;

use crate::{
    detect::ModuleRequirement,
    error::{ErrorKind, StepError},
    heal::Attempt,
    parser::Scenario,
    step::{Keyword, Location, Step},
};

/// Final state of a step.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
#[cfg_attr(feature = "output-json", serde(rename_all = "kebab-case"))]
pub enum Status {
    /// Handler succeeded, possibly after healing.
    #[display("passed")]
    Passed,

    /// Handler failed, or the step is ambiguous.
    #[display("failed")]
    Failed,

    /// Handler exceeded its time bound.
    #[display("timed-out")]
    TimedOut,

    /// No definition matches the step.
    #[display("undefined")]
    Undefined,

    /// Not run, because a previous step didn't pass.
    #[display("skipped")]
    Skipped,
}

impl From<ErrorKind> for Status {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Undefined => Self::Undefined,
            ErrorKind::Timeout => Self::TimedOut,
            ErrorKind::Ambiguous | ErrorKind::Handler => Self::Failed,
        }
    }
}

/// Outcome of a single step.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
pub struct StepResult {
    /// Keyword the step was written with.
    pub keyword: Keyword,

    /// Step text.
    pub text: String,

    /// Final [`Status`].
    pub status: Status,

    /// Time spent, healing and retry included.
    #[cfg_attr(
        feature = "output-json",
        serde(rename = "duration_ms", serialize_with = "crate::writer::json::millis")
    )]
    pub duration: Duration,

    /// Error the step failed with. After a failed retry it's the retry's
    /// error.
    #[cfg_attr(
        feature = "output-json",
        serde(serialize_with = "crate::writer::json::step_error")
    )]
    pub error: Option<StepError>,

    /// Every healing [`Attempt`], in invocation order.
    pub healing: Vec<Attempt>,

    /// Whether the step passed thanks to healing.
    pub healed: bool,

    /// Declaration site of the matched definition, if any.
    pub definition: Option<Location>,
}

impl StepResult {
    pub(crate) fn new(step: &Step, status: Status) -> Self {
        Self {
            keyword: step.keyword,
            text: step.text.clone(),
            status,
            duration: Duration::ZERO,
            error: None,
            healing: Vec::new(),
            healed: false,
            definition: None,
        }
    }

    pub(crate) fn skipped(step: &Step) -> Self {
        Self::new(step, Status::Skipped)
    }

    pub(crate) fn failed(step: &Step, error: StepError) -> Self {
        Self {
            error: Some(error.clone()),
            ..Self::new(step, error.kind().into())
        }
    }

    /// [`ErrorKind`] of the [`StepResult::error`], if any.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(StepError::kind)
    }

    /// Indicates whether the step passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == Status::Passed
    }
}

/// Outcome of a whole scenario.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
pub struct ScenarioResult {
    /// Name of the enclosing feature.
    pub feature: String,

    /// Name of the scenario.
    pub name: String,

    /// Modules the scenario was detected to need.
    pub modules: ModuleRequirement,

    /// Results of every step, in declaration order.
    pub steps: Vec<StepResult>,

    /// Why the scenario couldn't run at all, if it couldn't.
    pub error: Option<String>,

    /// Time spent, world creation included.
    #[cfg_attr(
        feature = "output-json",
        serde(rename = "duration_ms", serialize_with = "crate::writer::json::millis")
    )]
    pub duration: Duration,
}

impl ScenarioResult {
    /// Result of a [`Scenario`] whose steps never ran, all of them reported
    /// as [`Status::Skipped`].
    pub(crate) fn not_run(
        scenario: &Scenario,
        modules: ModuleRequirement,
        error: String,
    ) -> Self {
        Self {
            feature: scenario.feature.clone(),
            name: scenario.name.clone(),
            modules,
            steps: scenario.steps.iter().map(StepResult::skipped).collect(),
            error: Some(error),
            duration: Duration::ZERO,
        }
    }

    /// Indicates whether every step passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.steps.iter().all(StepResult::passed)
    }

    /// Iterates over the steps that didn't pass and weren't skipped.
    pub fn failures(&self) -> impl Iterator<Item = &StepResult> + '_ {
        self.steps
            .iter()
            .filter(|s| !matches!(s.status, Status::Passed | Status::Skipped))
    }
}
