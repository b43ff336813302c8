// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Narrow browser capability the healing strategies act through.

use std::time::Duration;

use async_trait::async_trait;
use derive_more::with_trait::{Display, Error};

use super::{Fingerprint, Locator};

/// State of an element addressed by a [`Locator`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Presence {
    /// Nothing matches the [`Locator`].
    #[display("missing")]
    Missing,

    /// Element exists but isn't rendered.
    #[display("hidden")]
    Hidden,

    /// Element is rendered outside of the viewport.
    #[display("out of view")]
    OutOfView,

    /// Element is rendered, but another element covers it.
    #[display("obscured")]
    Obscured,

    /// Element can be interacted with.
    #[display("actionable")]
    Actionable,
}

/// Element currently present on the page.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSnapshot {
    /// How to address the element.
    pub locator: Locator,

    /// What the element looks like.
    pub fingerprint: Fingerprint,
}

/// Error of a [`Browser`] primitive.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("browser error: {message}")]
pub struct DriverError {
    /// Human-readable description.
    pub message: String,
}

impl DriverError {
    /// Creates a new [`DriverError`].
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Browser automation primitives needed for healing.
///
/// Implemented by whatever drives the real browser. Every mutating primitive
/// is only called once a probe showed it's needed, so implementations don't
/// have to guard against pointless calls.
#[async_trait(?Send)]
pub trait Browser {
    /// Reports the [`Presence`] of the element addressed by the `locator`.
    async fn probe(&mut self, locator: &Locator) -> Result<Presence, DriverError>;

    /// Scrolls the element into the viewport, returning whether it moved.
    async fn scroll_into_view(
        &mut self,
        locator: &Locator,
    ) -> Result<bool, DriverError>;

    /// Waits up to the `timeout` for the element to become visible.
    async fn wait_for_visible(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<bool, DriverError>;

    /// Removes the elements covering the one addressed by the `locator`,
    /// returning how many were removed.
    async fn remove_overlays(
        &mut self,
        locator: &Locator,
    ) -> Result<usize, DriverError>;

    /// Closes open modal dialogs, returning how many were closed.
    async fn dismiss_modals(&mut self) -> Result<usize, DriverError>;

    /// Lists interactable elements of the current page.
    async fn candidates(&mut self) -> Result<Vec<ElementSnapshot>, DriverError>;
}
