// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Recovery of UI steps failing to find or interact with an element.
//!
//! - [`locator`]: element descriptors and fingerprints
//! - [`browser`]: the [`Browser`] capability strategies act through
//! - [`strategy`]: the [`Strategy`] abstraction
//! - [`builtin`]: the built-in [`Strategy`]s
//! - [`engine`]: the [`Engine`] running them in priority order

pub mod browser;
pub mod builtin;
pub mod engine;
pub mod locator;
pub mod strategy;

pub use self::{
    browser::{Browser, DriverError, ElementSnapshot, Presence},
    engine::{Attempt, Engine, Outcome},
    locator::{Bounds, Fingerprint, Locator, LocatorKind},
    strategy::{FailureContext, Healed, Strategy, StrategyError},
};
