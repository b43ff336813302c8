// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Priority-ordered chain of [`Strategy`]s.

use std::{
    cmp::Reverse,
    fmt,
    panic::AssertUnwindSafe,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use futures::FutureExt as _;
use tracing::{debug, info, trace, warn};

use crate::{config::HealingConfig, error::panic_message};

use super::{
    builtin, Browser, DriverError, ElementSnapshot, FailureContext, Healed,
    Locator, Presence, Strategy, StrategyError,
};

/// Audit record of a single [`Strategy`] invocation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
pub struct Attempt {
    /// [`Strategy::name()`].
    pub strategy: String,

    /// Whether the [`Strategy`] healed the failure.
    pub success: bool,

    /// Reported confidence, `0` if nothing was found.
    pub confidence: f64,

    /// How long the invocation took.
    #[cfg_attr(
        feature = "output-json",
        serde(rename = "duration_ms", serialize_with = "crate::writer::json::millis")
    )]
    pub duration: Duration,

    /// Descriptor of the target that failed.
    pub original: String,

    /// Descriptor of the target the [`Strategy`] proposed, if any.
    pub healed: Option<String>,

    /// Why the invocation didn't heal, if it errored or wasn't confident
    /// enough.
    pub error: Option<String>,

    /// Page changes the invocation made, in order.
    #[cfg_attr(feature = "output-json", serde(skip_serializing_if = "Vec::is_empty"))]
    pub effects: Vec<String>,
}

/// Result of running the [`Engine`] over a failure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
    /// Accepted recovery, if any.
    pub healed: Option<Healed>,

    /// Every invoked [`Strategy`], in invocation order.
    pub attempts: Vec<Attempt>,

    /// Whether applicable [`Strategy`]s were left untried because the
    /// attempt budget ran out.
    pub exhausted: bool,
}

impl Outcome {
    /// Indicates whether the failure was healed.
    #[must_use]
    pub const fn is_healed(&self) -> bool {
        self.healed.is_some()
    }
}

/// Healing engine.
///
/// Owns its [`Strategy`]s, which are never shared with another [`Engine`].
pub struct Engine {
    /// Sorted by descending priority, registration order among equals.
    strategies: Vec<Box<dyn Strategy>>,

    /// Maximum number of [`Strategy`] invocations per failure.
    max_attempts: usize,

    /// Minimum confidence of an accepted recovery.
    threshold: f64,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("max_attempts", &self.max_attempts)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl Engine {
    /// Creates a new [`Engine`] without any [`Strategy`].
    #[must_use]
    pub fn new(max_attempts: usize, threshold: f64) -> Self {
        Self {
            strategies: Vec::new(),
            max_attempts,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Creates a new [`Engine`] with all the built-in [`Strategy`]s.
    #[must_use]
    pub fn builtin(cfg: &HealingConfig) -> Self {
        Self::new(cfg.max_attempts, cfg.confidence_threshold)
            .with_strategy(builtin::AlternativeLocator)
            .with_strategy(builtin::ScrollIntoView)
            .with_strategy(builtin::WaitForVisibility {
                timeout: cfg.wait_timeout,
            })
            .with_strategy(builtin::OverlayRemoval)
            .with_strategy(builtin::ModalDismissal)
            .with_strategy(builtin::HistoricalPattern)
            .with_strategy(builtin::VisualSimilarity)
            .with_strategy(builtin::ForcedInteraction)
    }

    /// Adds the given [`Strategy`], keeping the chain ordered.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self.strategies.sort_by_key(|s| Reverse(s.priority()));
        self
    }

    /// Iterates over the [`Strategy`]s in the order they're tried.
    pub fn strategies(&self) -> impl Iterator<Item = &dyn Strategy> + '_ {
        self.strategies.iter().map(AsRef::as_ref)
    }

    /// Drops all the held [`Strategy`]s.
    pub fn clear(&mut self) {
        self.strategies.clear();
    }

    /// Runs the chain over the given failure.
    ///
    /// Stops at the first [`Strategy`] healing with enough confidence. Errors
    /// and panics of a [`Strategy`] are recorded as failed [`Attempt`]s and
    /// the chain goes on.
    pub async fn heal(
        &self,
        browser: &mut dyn Browser,
        ctx: &FailureContext,
    ) -> Outcome {
        let ctx = &FailureContext {
            threshold: self.threshold,
            ..ctx.clone()
        };
        let original = ctx.original();
        let mut outcome = Outcome::default();

        for strategy in &self.strategies {
            if !strategy.is_applicable(ctx) {
                trace!(strategy = strategy.name(), "not applicable");
                continue;
            }
            if outcome.attempts.len() >= self.max_attempts {
                warn!(
                    step = %ctx.step,
                    budget = self.max_attempts,
                    "healing budget exhausted",
                );
                outcome.exhausted = true;
                break;
            }

            let started = Instant::now();
            let mut recorder = Recorder::new(&mut *browser);
            let result = AssertUnwindSafe(strategy.attempt(&mut recorder, ctx))
                .catch_unwind()
                .await
                .unwrap_or_else(|p| {
                    Err(StrategyError::Panicked(panic_message(&*p)))
                });

            let mut attempt = Attempt {
                strategy: strategy.name().to_owned(),
                success: false,
                confidence: 0.0,
                duration: started.elapsed(),
                original: original.clone(),
                healed: None,
                error: None,
                effects: recorder.effects,
            };

            match result {
                Ok(Some(healed)) => {
                    let confidence = healed.confidence.clamp(0.0, 1.0);
                    attempt.confidence = confidence;
                    attempt.healed = Some(healed.target.to_string());
                    if confidence >= self.threshold {
                        attempt.success = true;
                        info!(
                            step = %ctx.step,
                            strategy = strategy.name(),
                            confidence,
                            healed = %healed.target,
                            "step healed",
                        );
                        outcome.attempts.push(attempt);
                        outcome.healed = Some(Healed {
                            confidence,
                            ..healed
                        });
                        return outcome;
                    }
                    debug!(
                        strategy = strategy.name(),
                        confidence,
                        threshold = self.threshold,
                        "recovery rejected",
                    );
                    attempt.error = Some(format!(
                        "confidence {confidence:.2} is below threshold {:.2}",
                        self.threshold,
                    ));
                }
                Ok(None) => {
                    debug!(strategy = strategy.name(), "nothing found");
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "strategy failed");
                    attempt.error = Some(e.to_string());
                }
            }
            if !attempt.effects.is_empty() {
                warn!(
                    strategy = strategy.name(),
                    effects = ?attempt.effects,
                    "unsuccessful healing attempt changed the page",
                );
            }
            outcome.attempts.push(attempt);
        }

        outcome
    }
}

/// [`Browser`] recording the page changes made through it.
struct Recorder<'b> {
    browser: &'b mut dyn Browser,
    effects: Vec<String>,
}

impl<'b> Recorder<'b> {
    fn new(browser: &'b mut dyn Browser) -> Self {
        Self {
            browser,
            effects: Vec::new(),
        }
    }
}

#[async_trait(?Send)]
impl<'b> Browser for Recorder<'b> {
    async fn probe(&mut self, locator: &Locator) -> Result<Presence, DriverError> {
        self.browser.probe(locator).await
    }

    async fn scroll_into_view(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        let moved = self.browser.scroll_into_view(locator).await?;
        if moved {
            self.effects.push(format!("scrolled {locator} into view"));
        }
        Ok(moved)
    }

    async fn wait_for_visible(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<bool, DriverError> {
        self.browser.wait_for_visible(locator, timeout).await
    }

    async fn remove_overlays(&mut self, locator: &Locator) -> Result<usize, DriverError> {
        let removed = self.browser.remove_overlays(locator).await?;
        if removed > 0 {
            self.effects
                .push(format!("removed {removed} overlay(s) covering {locator}"));
        }
        Ok(removed)
    }

    async fn dismiss_modals(&mut self) -> Result<usize, DriverError> {
        let closed = self.browser.dismiss_modals().await?;
        if closed > 0 {
            self.effects.push(format!("dismissed {closed} modal(s)"));
        }
        Ok(closed)
    }

    async fn candidates(&mut self) -> Result<Vec<ElementSnapshot>, DriverError> {
        self.browser.candidates().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;

    struct Blank;

    #[async_trait(?Send)]
    impl Browser for Blank {
        async fn probe(&mut self, _: &Locator) -> Result<Presence, DriverError> {
            Ok(Presence::Missing)
        }

        async fn scroll_into_view(&mut self, _: &Locator) -> Result<bool, DriverError> {
            Ok(false)
        }

        async fn wait_for_visible(
            &mut self,
            _: &Locator,
            _: Duration,
        ) -> Result<bool, DriverError> {
            Ok(false)
        }

        async fn remove_overlays(&mut self, _: &Locator) -> Result<usize, DriverError> {
            Ok(0)
        }

        async fn dismiss_modals(&mut self) -> Result<usize, DriverError> {
            Ok(0)
        }

        async fn candidates(&mut self) -> Result<Vec<ElementSnapshot>, DriverError> {
            Ok(Vec::new())
        }
    }

    /// Page with a single modal dialog open.
    struct Cluttered {
        modals: usize,
    }

    #[async_trait(?Send)]
    impl Browser for Cluttered {
        async fn probe(&mut self, _: &Locator) -> Result<Presence, DriverError> {
            Ok(Presence::Obscured)
        }

        async fn scroll_into_view(&mut self, _: &Locator) -> Result<bool, DriverError> {
            Ok(false)
        }

        async fn wait_for_visible(
            &mut self,
            _: &Locator,
            _: Duration,
        ) -> Result<bool, DriverError> {
            Ok(false)
        }

        async fn remove_overlays(&mut self, _: &Locator) -> Result<usize, DriverError> {
            Ok(0)
        }

        async fn dismiss_modals(&mut self) -> Result<usize, DriverError> {
            Ok(std::mem::take(&mut self.modals))
        }

        async fn candidates(&mut self) -> Result<Vec<ElementSnapshot>, DriverError> {
            Ok(Vec::new())
        }
    }

    #[derive(Clone, Copy)]
    enum Behavior {
        Miss,
        Heal(f64),
        Fail,
        Panic,
        Inapplicable,
        DismissThenMiss,
        Threshold,
    }

    struct Scripted(&'static str, i32, Behavior);

    #[async_trait(?Send)]
    impl Strategy for Scripted {
        fn name(&self) -> &str {
            self.0
        }

        fn priority(&self) -> i32 {
            self.1
        }

        fn is_applicable(&self, _: &FailureContext) -> bool {
            !matches!(self.2, Behavior::Inapplicable)
        }

        async fn attempt(
            &self,
            browser: &mut dyn Browser,
            ctx: &FailureContext,
        ) -> Result<Option<Healed>, StrategyError> {
            match self.2 {
                Behavior::Miss | Behavior::Inapplicable => Ok(None),
                Behavior::DismissThenMiss => {
                    _ = browser.dismiss_modals().await?;
                    Ok(None)
                }
                Behavior::Threshold => Ok(Some(Healed {
                    target: Locator::css("#threshold"),
                    confidence: ctx.threshold,
                })),
                Behavior::Heal(confidence) => Ok(Some(Healed {
                    target: Locator::css(format!("#{}", self.0)),
                    confidence,
                })),
                Behavior::Fail => Err(DriverError::new("session lost").into()),
                Behavior::Panic => panic!("broken strategy"),
            }
        }
    }

    fn ctx() -> FailureContext {
        FailureContext::new(
            "I click buy",
            HandlerError::element_not_found(Locator::css("#buy")),
        )
    }

    fn names(outcome: &Outcome) -> Vec<&str> {
        outcome.attempts.iter().map(|a| a.strategy.as_str()).collect()
    }

    #[tokio::test]
    async fn stops_at_first_success_in_priority_order() {
        let engine = Engine::new(8, 0.7)
            .with_strategy(Scripted("C", 1, Behavior::Heal(1.0)))
            .with_strategy(Scripted("A", 10, Behavior::Miss))
            .with_strategy(Scripted("B", 9, Behavior::Heal(0.9)));

        let outcome = engine.heal(&mut Blank, &ctx()).await;

        assert_eq!(names(&outcome), ["A", "B"]);
        assert!(!outcome.attempts[0].success);
        assert!(outcome.attempts[1].success);
        assert_eq!(outcome.attempts[1].original, "css=#buy");
        assert_eq!(outcome.attempts[1].healed.as_deref(), Some("css=#B"));
        assert_eq!(outcome.healed.unwrap().target, Locator::css("#B"));
    }

    #[tokio::test]
    async fn errors_and_panics_do_not_abort_chain() {
        let engine = Engine::new(8, 0.7)
            .with_strategy(Scripted("erroring", 3, Behavior::Fail))
            .with_strategy(Scripted("panicking", 2, Behavior::Panic))
            .with_strategy(Scripted("healing", 1, Behavior::Heal(0.8)));

        let outcome = engine.heal(&mut Blank, &ctx()).await;

        assert_eq!(names(&outcome), ["erroring", "panicking", "healing"]);
        assert_eq!(
            outcome.attempts[0].error.as_deref(),
            Some("browser error: session lost"),
        );
        assert_eq!(
            outcome.attempts[1].error.as_deref(),
            Some("strategy panicked: broken strategy"),
        );
        assert!(outcome.is_healed());
    }

    #[tokio::test]
    async fn inapplicable_strategies_are_not_recorded() {
        let engine = Engine::new(8, 0.7)
            .with_strategy(Scripted("skipped", 5, Behavior::Inapplicable))
            .with_strategy(Scripted("tried", 1, Behavior::Miss));

        let outcome = engine.heal(&mut Blank, &ctx()).await;

        assert_eq!(names(&outcome), ["tried"]);
        assert!(!outcome.is_healed());
        assert!(!outcome.exhausted);
    }

    #[tokio::test]
    async fn budget_skips_remaining_strategies() {
        let engine = Engine::new(2, 0.7)
            .with_strategy(Scripted("one", 3, Behavior::Miss))
            .with_strategy(Scripted("two", 2, Behavior::Miss))
            .with_strategy(Scripted("three", 1, Behavior::Heal(1.0)));

        let outcome = engine.heal(&mut Blank, &ctx()).await;

        assert_eq!(names(&outcome), ["one", "two"]);
        assert!(outcome.exhausted);
        assert!(!outcome.is_healed());
    }

    #[tokio::test]
    async fn low_confidence_is_an_unsuccessful_attempt() {
        let engine = Engine::new(8, 0.7)
            .with_strategy(Scripted("unsure", 2, Behavior::Heal(0.4)))
            .with_strategy(Scripted("sure", 1, Behavior::Heal(0.95)));

        let outcome = engine.heal(&mut Blank, &ctx()).await;

        let unsure = &outcome.attempts[0];
        assert!(!unsure.success);
        assert!((unsure.confidence - 0.4).abs() < 1e-9);
        assert_eq!(unsure.healed.as_deref(), Some("css=#unsure"));
        assert!(unsure.error.as_deref().unwrap().contains("below threshold"));
        assert_eq!(outcome.healed.unwrap().target, Locator::css("#sure"));
    }

    #[tokio::test]
    async fn page_changes_are_recorded_on_the_attempt() {
        let engine = Engine::new(8, 0.7)
            .with_strategy(Scripted("dismissing", 2, Behavior::DismissThenMiss))
            .with_strategy(Scripted("again", 1, Behavior::DismissThenMiss));

        let outcome = engine.heal(&mut Cluttered { modals: 1 }, &ctx()).await;

        assert_eq!(names(&outcome), ["dismissing", "again"]);
        assert_eq!(outcome.attempts[0].effects, ["dismissed 1 modal(s)"]);
        assert!(!outcome.attempts[0].success);
        assert!(outcome.attempts[1].effects.is_empty());
    }

    #[tokio::test]
    async fn strategies_see_the_engine_threshold() {
        let engine = Engine::new(8, 0.85)
            .with_strategy(Scripted("echo", 1, Behavior::Threshold));

        let outcome = engine.heal(&mut Blank, &ctx()).await;

        assert!(outcome.is_healed());
        assert!((outcome.attempts[0].confidence - 0.85).abs() < 1e-9);
    }

    #[tokio::test]
    async fn builtin_chain_without_browser_help_records_misses() {
        let engine = Engine::builtin(&HealingConfig::default());
        assert_eq!(
            engine.strategies().map(Strategy::priority).collect::<Vec<_>>(),
            [100, 90, 80, 70, 60, 50, 40, 10],
        );

        let outcome = engine.heal(&mut Blank, &ctx()).await;

        // No alternatives and no fingerprint: 3 strategies aren't applicable.
        assert_eq!(
            names(&outcome),
            [
                "scroll-into-view",
                "wait-for-visibility",
                "overlay-removal",
                "modal-dismissal",
                "forced-interaction",
            ],
        );
        assert!(outcome.attempts.iter().all(|a| !a.success));
    }

    #[test]
    fn clear_drops_strategies() {
        let mut engine = Engine::builtin(&HealingConfig::default());
        engine.clear();
        assert_eq!(engine.strategies().count(), 0);
    }
}
