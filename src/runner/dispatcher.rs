// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step dispatch: resolution, bounded invocation and healing.

use std::{
    fmt,
    panic::AssertUnwindSafe,
    time::{Duration, Instant},
};

use futures::FutureExt as _;
use tokio::time;
use tracing::{debug, info_span, warn, Instrument as _};

use crate::{
    config::Config,
    detect::{Detector, ModuleRequirement},
    error::{panic_message, HandlerError, StepError, TimeoutError},
    heal::{Engine, FailureContext},
    parser::Scenario,
    step::{Context, Handler, Registry, Step},
    World,
};

use super::{ScenarioResult, Status, StepResult};

/// Executes steps against a [`Registry`], healing UI failures with an
/// [`Engine`].
///
/// Holds only shared references: one is built per scenario from whatever a
/// worker owns.
pub struct Dispatcher<'c, W> {
    registry: &'c Registry<W>,
    engine: &'c Engine,
    config: &'c Config,
}

// Implemented manually to omit redundant `W: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<W> Clone for Dispatcher<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for Dispatcher<'_, W> {}

impl<W> fmt::Debug for Dispatcher<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", self.registry)
            .field("engine", self.engine)
            .field("config", self.config)
            .finish()
    }
}

impl<'c, W: World> Dispatcher<'c, W> {
    /// Creates a new [`Dispatcher`].
    #[must_use]
    pub const fn new(
        registry: &'c Registry<W>,
        engine: &'c Engine,
        config: &'c Config,
    ) -> Self {
        Self {
            registry,
            engine,
            config,
        }
    }

    /// Executes a single step.
    ///
    /// Never fails: every error ends up in the returned [`StepResult`].
    pub async fn execute(&self, world: &mut W, step: &Step) -> StepResult {
        let span = info_span!("step", keyword = %step.keyword, text = %step.text);
        async {
            let started = Instant::now();
            let mut result = self.dispatch(world, step).await;
            result.duration = started.elapsed();
            debug!(status = %result.status, ?result.duration, "step finished");
            result
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, world: &mut W, step: &Step) -> StepResult {
        let resolved = match self.registry.resolve(&step.text) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "step not resolved");
                return StepResult::failed(step, e);
            }
        };
        let definition = resolved.definition;
        let handler = definition.handler();
        let timeout = definition.timeout().unwrap_or(self.config.step_timeout);
        let ctx = Context::new(step.clone(), resolved.args);

        let mut result = match invoke(handler, world, ctx.clone(), timeout).await {
            Ok(()) => StepResult::new(step, Status::Passed),
            Err(e) => StepResult::failed(step, e),
        };
        result.definition = definition.location();

        let Some(StepError::Handler(error)) = &result.error else {
            return result;
        };
        if !self.config.healing.enabled || !Detector::is_ui_step(&step.text) {
            return result;
        }
        let Some(browser) = world.browser() else {
            debug!("no browser to heal with");
            return result;
        };

        let failure = FailureContext::new(step.text.clone(), error.clone());
        let outcome = self.engine.heal(browser, &failure).await;
        result.healing = outcome.attempts;
        let Some(healed) = outcome.healed else {
            return result;
        };

        // Exactly one retry, never healed again.
        match invoke(handler, world, ctx.healed_with(healed.target), timeout).await {
            Ok(()) => {
                result.status = Status::Passed;
                result.error = None;
                result.healed = true;
            }
            Err(e) => {
                warn!(error = %e, "retry after healing failed");
                result.status = e.kind().into();
                result.error = Some(e);
            }
        }
        result
    }

    /// Runs the given [`Scenario`] on a fresh [`World`] created with the given
    /// `modules`.
    ///
    /// Steps run strictly in order. Once one doesn't pass, the remaining ones
    /// are reported as [`Status::Skipped`].
    pub async fn run_scenario(
        &self,
        scenario: &Scenario,
        modules: ModuleRequirement,
    ) -> ScenarioResult {
        let span = info_span!("scenario", name = %scenario.name, %modules);
        async {
            let started = Instant::now();
            let mut result = ScenarioResult {
                feature: scenario.feature.clone(),
                name: scenario.name.clone(),
                modules,
                steps: Vec::with_capacity(scenario.steps.len()),
                error: None,
                duration: Duration::ZERO,
            };

            let world = match AssertUnwindSafe(W::new(&modules)).catch_unwind().await {
                Ok(Ok(world)) => Some(world),
                Ok(Err(e)) => {
                    result.error = Some(format!("Failed to initialize world: {e}"));
                    None
                }
                Err(panic) => {
                    result.error = Some(format!(
                        "World panicked on initialization: {}",
                        panic_message(&*panic),
                    ));
                    None
                }
            };

            match world {
                Some(mut world) => {
                    let mut failed = false;
                    for step in &scenario.steps {
                        if failed {
                            result.steps.push(StepResult::skipped(step));
                            continue;
                        }
                        let step_result = self.execute(&mut world, step).await;
                        failed = !step_result.passed();
                        result.steps.push(step_result);
                    }
                }
                None => {
                    warn!(error = ?result.error, "scenario not run");
                    result
                        .steps
                        .extend(scenario.steps.iter().map(StepResult::skipped));
                }
            }

            result.duration = started.elapsed();
            debug!(passed = result.passed(), "scenario finished");
            result
        }
        .instrument(span)
        .await
    }
}

/// Invokes the `handler` within the `timeout`, catching panics.
async fn invoke<W>(
    handler: Handler<W>,
    world: &mut W,
    ctx: Context,
    timeout: Duration,
) -> Result<(), StepError> {
    let text = ctx.step.text.clone();
    let fut = AssertUnwindSafe(handler(world, ctx)).catch_unwind();

    match time::timeout(timeout, fut).await {
        Ok(Ok(res)) => res.map_err(Into::into),
        Ok(Err(panic)) => Err(HandlerError::from_panic(&*panic).into()),
        Err(_) => {
            warn!(after = ?timeout, "step timed out");
            Err(TimeoutError {
                step: text,
                after: timeout,
            }
            .into())
        }
    }
}
