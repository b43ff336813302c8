// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Behavior-driven step execution engine.
//!
//! Step phrases are compiled into typed [`StepPattern`]s and kept in a
//! [`Registry`]. Every scenario is inspected by a [`Detector`] deciding which
//! runtime [`Module`]s its [`World`] has to start, and is then executed step
//! by step by a [`Dispatcher`]. A UI step failing to find its element is
//! handed to a healing [`Engine`], which tries its [`Strategy`]s in priority
//! order and, on success, re-invokes the step once with the healed
//! [`Locator`].
//!
//! ```rust
//! # use std::convert::Infallible;
//! use futures::FutureExt as _;
//! use stepwright::{
//!     Config, Context, HandlerError, ModuleRequirement, Registry,
//!     Status, World, WorkerPool,
//! };
//! use futures::future::LocalBoxFuture;
//!
//! #[derive(Default)]
//! struct Basket {
//!     items: i64,
//! }
//!
//! impl World for Basket {
//!     type Error = Infallible;
//!
//!     async fn new(_: &ModuleRequirement) -> Result<Self, Infallible> {
//!         Ok(Self::default())
//!     }
//! }
//!
//! fn add(w: &mut Basket, ctx: Context) -> LocalBoxFuture<'_, Result<(), HandlerError>> {
//!     async move {
//!         w.items += ctx.int(0).ok_or("no amount")?;
//!         Ok(())
//!     }
//!     .boxed_local()
//! }
//!
//! let mut steps = Registry::new();
//! steps.when("I add {int} items", add).unwrap();
//!
//! let scenarios = stepwright::parser::parse_str(
//!     "Feature: Basket\n  Scenario: adding\n    When I add 3 items\n",
//! )
//! .unwrap();
//!
//! let results = WorkerPool::new(steps, Config::default()).run(scenarios);
//! assert_eq!(results[0].steps[0].status, Status::Passed);
//! ```
//!
//! [`StepPattern`]: pattern::StepPattern
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod heal;
pub mod ide;
pub mod parser;
pub mod pattern;
pub mod runner;
pub mod step;
pub mod worker;
mod world;
pub mod writer;

#[doc(no_inline)]
pub use gherkin;

#[doc(inline)]
pub use self::{
    config::{Config, DetectionConfig, HealingConfig, StepLoading},
    detect::{DetectionMode, Detector, Module, ModuleRequirement, ScenarioDescriptor},
    error::{HandlerError, StepError},
    heal::{Browser, Engine, Locator, Strategy},
    parser::{ParseError, Scenario},
    runner::{Dispatcher, ScenarioResult, Status, StepResult},
    step::{Context, Definition, Keyword, Registry, Step},
    worker::{WorkerExecutionContext, WorkerPool},
    world::World,
};
