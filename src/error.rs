// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error taxonomy of registering and executing steps.
//!
//! Registration errors ([`RegistrationError`]) are unrecoverable and must stop
//! a run before any scenario executes. Step errors ([`StepError`]) are always
//! recovered into a structured [`StepResult`] by the dispatcher.
//!
//! [`StepResult`]: crate::runner::StepResult

use std::{any::Any, fmt, time::Duration};

use derive_more::with_trait::{Display, Error, From};

use crate::{heal::Locator, ide::StepMetadata, pattern::PatternError};

/// Error of two [`Definition`]s matching the same step text.
///
/// [`Definition`]: crate::step::Definition
#[derive(Clone, Debug, Error)]
pub struct AmbiguousStepError {
    /// Step text matched by several definitions, if the ambiguity was found
    /// while resolving a concrete text rather than at registration.
    pub text: Option<String>,

    /// Conflicting definitions. The first one is the newly registered one,
    /// when detected at registration.
    pub definitions: Vec<StepMetadata>,
}

impl AmbiguousStepError {
    /// Number of conflicting definitions.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.definitions.len()
    }

    /// Iterates over the templates of the conflicting definitions.
    pub fn templates(&self) -> impl Iterator<Item = &str> + '_ {
        self.definitions.iter().map(|d| d.template.as_str())
    }
}

impl Display for AmbiguousStepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "Step `{text}` is ambiguous, possible matches:")?,
            None => write!(f, "Step definitions overlap:")?,
        }
        for def in &self.definitions {
            write!(f, "\n{} {}", def.keyword, def.template)?;
            if let Some(loc) = def.location {
                write!(f, " --> {loc}")?;
            }
        }
        Ok(())
    }
}

/// Error of a step text not matching any [`Definition`].
///
/// [`Definition`]: crate::step::Definition
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("Step doesn't match any definition: `{text}`")]
pub struct UndefinedStepError {
    /// Unmatched step text.
    pub text: String,
}

/// Error of a step handler exceeding its time bound.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("Step timed out after {}: `{step}`", humantime::format_duration(*after))]
pub struct TimeoutError {
    /// Step text whose handler timed out.
    pub step: String,

    /// Applied time bound.
    pub after: Duration,
}

/// Failure reported by a step handler.
///
/// Handlers that fail to find a UI element should attach the [`Locator`] they
/// used via [`HandlerError::element_not_found()`], which makes the failure
/// eligible for healing.
#[derive(Clone, Debug, Display, Error)]
#[display("{message}")]
pub struct HandlerError {
    /// Human-readable description of the failure.
    pub message: String,

    /// Target the handler failed to interact with, if any.
    #[error(not(source))]
    pub target: Option<Locator>,

    /// Whether the handler panicked instead of returning an error.
    pub panicked: bool,
}

impl HandlerError {
    /// Creates a new [`HandlerError`] with the given `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            target: None,
            panicked: false,
        }
    }

    /// Creates a new [`HandlerError`] signaling that the element addressed by
    /// the `target` [`Locator`] cannot be found or interacted with.
    #[must_use]
    pub fn element_not_found(target: Locator) -> Self {
        Self {
            message: format!("element not found: {target}"),
            target: Some(target),
            panicked: false,
        }
    }

    /// Attaches the given `target` [`Locator`].
    #[must_use]
    pub fn with_target(mut self, target: Locator) -> Self {
        self.target = Some(target);
        self
    }

    /// Converts a panic payload into a [`HandlerError`].
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self {
            message: format!("step panicked: {}", panic_message(payload)),
            target: None,
            panicked: true,
        }
    }
}

/// Coerces a panic payload into a message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_owned()))
        .unwrap_or_else(|| "opaque panic payload".to_owned())
}

impl From<anyhow::Error> for HandlerError {
    fn from(e: anyhow::Error) -> Self {
        Self::new(format!("{e:#}"))
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Error of registering a step [`Definition`].
///
/// [`Definition`]: crate::step::Definition
#[derive(Clone, Debug, Display, Error, From)]
pub enum RegistrationError {
    /// Template cannot be compiled.
    #[display("{_0}")]
    Pattern(PatternError),

    /// Template overlaps an already registered one.
    #[display("{_0}")]
    Ambiguous(AmbiguousStepError),

    /// Timeout override must be positive.
    #[display("Step `{template}` declares a zero timeout")]
    #[from(ignore)]
    ZeroTimeout {
        /// Template of the offending definition.
        template: String,
    },
}

/// Error of executing a single step.
#[derive(Clone, Debug, Display, Error, From)]
pub enum StepError {
    /// No definition matches the step text.
    #[display("{_0}")]
    Undefined(UndefinedStepError),

    /// Several definitions match the step text.
    #[display("{_0}")]
    Ambiguous(AmbiguousStepError),

    /// Handler exceeded its time bound.
    #[display("{_0}")]
    Timeout(TimeoutError),

    /// Handler failed.
    #[display("{_0}")]
    Handler(HandlerError),
}

/// Reportable kind of a [`StepError`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
#[cfg_attr(feature = "output-json", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// See [`StepError::Undefined`].
    #[display("undefined")]
    Undefined,

    /// See [`StepError::Ambiguous`].
    #[display("ambiguous")]
    Ambiguous,

    /// See [`StepError::Timeout`].
    #[display("timeout")]
    Timeout,

    /// See [`StepError::Handler`].
    #[display("handler")]
    Handler,
}

impl StepError {
    /// Returns the [`ErrorKind`] of this [`StepError`].
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Undefined(_) => ErrorKind::Undefined,
            Self::Ambiguous(_) => ErrorKind::Ambiguous,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Handler(_) => ErrorKind::Handler,
        }
    }
}
