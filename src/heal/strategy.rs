// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Strategy`] abstraction.

use async_trait::async_trait;
use derive_more::with_trait::{Display, Error, From};

use crate::error::HandlerError;

use super::{Browser, DriverError, Locator};

/// Failure a [`Strategy`] tries to recover from.
#[derive(Clone, Debug)]
pub struct FailureContext {
    /// Text of the failed step.
    pub step: String,

    /// Error the handler failed with.
    pub error: HandlerError,

    /// Element the handler failed to interact with.
    pub target: Option<Locator>,

    /// Minimum confidence of an accepted recovery, as set by the [`Engine`]
    /// running the chain.
    ///
    /// [`Engine`]: super::Engine
    pub threshold: f64,
}

impl FailureContext {
    /// Creates a new [`FailureContext`] targeting whatever the `error` names.
    #[must_use]
    pub fn new(step: impl Into<String>, error: HandlerError) -> Self {
        let target = error.target.clone();
        Self {
            step: step.into(),
            error,
            target,
            threshold: 0.0,
        }
    }

    /// Indicates whether a recovery with the given `confidence` would be
    /// accepted.
    ///
    /// A [`Strategy`] changing the page should check it before acting, so a
    /// recovery bound to be rejected leaves the page as it was.
    #[must_use]
    pub fn accepts(&self, confidence: f64) -> bool {
        confidence >= self.threshold
    }

    /// Descriptor of the original target, as recorded in an [`Attempt`].
    ///
    /// [`Attempt`]: super::Attempt
    #[must_use]
    pub fn original(&self) -> String {
        self.target
            .as_ref()
            .map_or_else(|| "<none>".to_owned(), ToString::to_string)
    }
}

/// Successful recovery.
#[derive(Clone, Debug, PartialEq)]
pub struct Healed {
    /// [`Locator`] the handler should be retried with.
    pub target: Locator,

    /// How sure the strategy is that `target` is the intended element, in
    /// `[0, 1]`.
    pub confidence: f64,
}

/// Error of a [`Strategy`] itself, as opposed to it finding nothing.
#[derive(Clone, Debug, Display, Error, From)]
pub enum StrategyError {
    /// [`Browser`] primitive failed.
    #[display("{_0}")]
    Driver(DriverError),

    /// Strategy panicked.
    #[display("strategy panicked: {_0}")]
    #[from(ignore)]
    Panicked(#[error(not(source))] String),
}

/// Way of recovering from a UI-element failure.
///
/// Strategies are immutable once constructed and keep nothing between
/// attempts. An attempt that finds nothing to do must leave the page as it
/// was. Page changes an attempt does make are recorded on its [`Attempt`].
///
/// [`Attempt`]: super::Attempt
#[async_trait(?Send)]
pub trait Strategy {
    /// Stable name, recorded in every [`Attempt`].
    ///
    /// [`Attempt`]: super::Attempt
    fn name(&self) -> &str;

    /// Higher is tried first.
    fn priority(&self) -> i32;

    /// Indicates whether this [`Strategy`] can do anything about the given
    /// failure.
    fn is_applicable(&self, ctx: &FailureContext) -> bool;

    /// Tries to recover, returning [`None`] if nothing was found.
    ///
    /// # Errors
    ///
    /// If a [`Browser`] primitive fails.
    async fn attempt(
        &self,
        browser: &mut dyn Browser,
        ctx: &FailureContext,
    ) -> Result<Option<Healed>, StrategyError>;
}
