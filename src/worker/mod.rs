// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Isolated parallel execution of [`Scenario`]s.
//!
//! Every worker owns a [`WorkerExecutionContext`]: its own [`Registry`]
//! snapshot, detection cache and healing [`Engine`]. Nothing is shared
//! between workers but the read-only inputs they're built from, so nothing
//! is locked.

use std::{
    collections::HashMap,
    fmt,
    panic::AssertUnwindSafe,
    sync::Arc,
    thread,
};

use futures::{
    channel::mpsc, executor, FutureExt as _, StreamExt as _,
};
use tokio::runtime;
use tracing::{debug, error, info_span, Instrument as _};

use crate::{
    config::{Config, HealingConfig, StepLoading},
    detect::{Detector, ModuleRequirement, ScenarioDescriptor},
    error::panic_message,
    heal::Engine,
    parser::Scenario,
    runner::{Dispatcher, ScenarioResult},
    step::Registry,
    World,
};

/// Builds the healing [`Engine`] of a single worker.
pub type EngineFactory = Arc<dyn Fn(&HealingConfig) -> Engine + Send + Sync>;

/// State owned by a single execution unit.
///
/// Released on [`Drop`], so teardown happens however the unit terminates.
pub struct WorkerExecutionContext<W> {
    /// Index of the worker owning this context.
    id: usize,

    /// Full [`Registry`] snapshot.
    registry: Registry<W>,

    /// Per-requirement [`Registry`] selections, built lazily under
    /// [`StepLoading::Selective`].
    selections: HashMap<ModuleRequirement, Registry<W>>,

    /// Cache of detection results.
    detections: HashMap<ScenarioDescriptor, ModuleRequirement>,

    /// Detection policy.
    detector: Detector,

    /// Healing [`Engine`] of this worker only.
    engine: Engine,

    /// Settings.
    config: Config,
}

impl<W> fmt::Debug for WorkerExecutionContext<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerExecutionContext")
            .field("id", &self.id)
            .field("registry", &self.registry)
            .field("selections", &self.selections.len())
            .field("detections", &self.detections.len())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl<W: World> WorkerExecutionContext<W> {
    /// Creates a new [`WorkerExecutionContext`].
    #[must_use]
    pub fn new(id: usize, registry: Registry<W>, engine: Engine, config: Config) -> Self {
        debug!(worker = id, steps = registry.len(), "worker context created");
        Self {
            id,
            registry,
            selections: HashMap::new(),
            detections: HashMap::new(),
            detector: config.detection.detector(),
            engine,
            config,
        }
    }

    /// Index of the worker owning this context.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Detects the [`ModuleRequirement`] of the given [`Scenario`], reusing
    /// the previous result for an identical one.
    pub fn detect(&mut self, scenario: &Scenario) -> ModuleRequirement {
        let detector = self.detector;
        *self
            .detections
            .entry(scenario.descriptor())
            .or_insert_with_key(|d| detector.detect(d))
    }

    /// Runs the given [`Scenario`] to completion.
    pub async fn run(&mut self, scenario: &Scenario) -> ScenarioResult {
        let modules = self.detect(scenario);
        let registry = match self.config.step_loading {
            StepLoading::All => &self.registry,
            StepLoading::Selective => {
                let all = &self.registry;
                &*self
                    .selections
                    .entry(modules)
                    .or_insert_with(|| all.select(&modules))
            }
        };
        Dispatcher::new(registry, &self.engine, &self.config)
            .run_scenario(scenario, modules)
            .await
    }
}

impl<W> Drop for WorkerExecutionContext<W> {
    fn drop(&mut self) {
        self.engine.clear();
        self.selections.clear();
        self.detections.clear();
        debug!(worker = self.id, "worker context released");
    }
}

/// Runs [`Scenario`]s over [`Config::concurrency`] OS threads.
///
/// Each thread drives its own single-threaded [`tokio`] runtime, as step
/// handlers and [`World`]s are not required to be [`Send`].
pub struct WorkerPool<W> {
    /// Registry every worker snapshots.
    registry: Registry<W>,

    /// Settings.
    config: Config,

    /// Healing [`Engine`] builder.
    engines: EngineFactory,
}

// Implemented manually to omit redundant `W: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<W> Clone for WorkerPool<W> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            config: self.config,
            engines: Arc::clone(&self.engines),
        }
    }
}

impl<W> fmt::Debug for WorkerPool<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<W: World> WorkerPool<W> {
    /// Creates a new [`WorkerPool`] healing with the built-in strategies.
    #[must_use]
    pub fn new(registry: Registry<W>, config: Config) -> Self {
        Self::with_engine(registry, config, Engine::builtin)
    }

    /// Creates a new [`WorkerPool`] building every worker's [`Engine`] with
    /// the given `factory`.
    #[must_use]
    pub fn with_engine(
        registry: Registry<W>,
        config: Config,
        factory: impl Fn(&HealingConfig) -> Engine + Send + Sync + 'static,
    ) -> Self {
        Self {
            registry,
            config,
            engines: Arc::new(factory),
        }
    }

    /// Number of workers that would run the given number of scenarios.
    #[must_use]
    pub fn workers_for(&self, scenarios: usize) -> usize {
        self.config.concurrency.max(1).min(scenarios)
    }

    /// Runs all the given [`Scenario`]s, returning their results in the
    /// order the scenarios were given.
    ///
    /// Scenarios are dealt round-robin. Within a worker they run
    /// sequentially, across workers in parallel.
    #[must_use]
    pub fn run(&self, scenarios: Vec<Scenario>) -> Vec<ScenarioResult> {
        let total = scenarios.len();
        let workers = self.workers_for(total);
        if workers == 0 {
            return Vec::new();
        }

        let mut parts = (0..workers).map(|_| Vec::new()).collect::<Vec<_>>();
        for (i, scenario) in scenarios.into_iter().enumerate() {
            if let Some(part) = parts.get_mut(i % workers) {
                part.push((i, scenario));
            }
        }

        let (sender, receiver) = mpsc::unbounded();
        thread::scope(|s| {
            for (id, part) in parts.into_iter().enumerate() {
                let sender = sender.clone();
                _ = s.spawn(move || self.work(id, part, &sender));
            }
        });
        drop(sender);

        let mut results =
            executor::block_on(receiver.collect::<Vec<(usize, ScenarioResult)>>());
        results.sort_by_key(|(i, _)| *i);
        debug_assert_eq!(results.len(), total, "every scenario reports");
        results.into_iter().map(|(_, r)| r).collect()
    }

    /// Body of a single worker thread.
    fn work(
        &self,
        id: usize,
        scenarios: Vec<(usize, Scenario)>,
        sender: &mpsc::UnboundedSender<(usize, ScenarioResult)>,
    ) {
        let rt = match runtime::Builder::new_current_thread().enable_time().build() {
            Ok(rt) => rt,
            Err(e) => {
                error!(worker = id, error = %e, "failed to start worker runtime");
                for (i, scenario) in scenarios {
                    let result = ScenarioResult::not_run(
                        &scenario,
                        ModuleRequirement::none(),
                        format!("Failed to start worker runtime: {e}"),
                    );
                    drop(sender.unbounded_send((i, result)));
                }
                return;
            }
        };

        let mut ctx = WorkerExecutionContext::new(
            id,
            self.registry.clone(),
            (self.engines)(&self.config.healing),
            self.config,
        );
        rt.block_on(
            async {
                for (i, scenario) in scenarios {
                    let result = AssertUnwindSafe(ctx.run(&scenario))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|p| {
                            ScenarioResult::not_run(
                                &scenario,
                                ModuleRequirement::none(),
                                format!("Worker panicked: {}", panic_message(&*p)),
                            )
                        });
                    drop(sender.unbounded_send((i, result)));
                }
            }
            .instrument(info_span!("worker", id)),
        );
    }
}
