// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for executing [`Step`]s and [`Scenario`]s.
//!
//! Per-step state machine of the [`Dispatcher`]:
//!
//! ```text
//! Pending -> Matching -> Invoking -> Passed
//!                                 -> Failed -> Healing -> Healed -> Invoking (once)
//!                                                      -> Exhausted -> Failed
//! ```
//!
//! Only failures of UI-classified steps reported by the handler itself (not
//! timeouts, undefined or ambiguous steps) enter healing.
//!
//! [`Scenario`]: crate::parser::Scenario
//! [`Step`]: crate::step::Step

mod dispatcher;
mod result;

pub use self::{
    dispatcher::Dispatcher,
    result::{ScenarioResult, Status, StepResult},
};
