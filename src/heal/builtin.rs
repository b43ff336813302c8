// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Built-in [`Strategy`]s, from the most to the least conservative one.
//!
//! | Strategy              | Priority |
//! |-----------------------|----------|
//! | [`AlternativeLocator`]  | 100      |
//! | [`ScrollIntoView`]      | 90       |
//! | [`WaitForVisibility`]   | 80       |
//! | [`OverlayRemoval`]      | 70       |
//! | [`ModalDismissal`]      | 60       |
//! | [`HistoricalPattern`]   | 50       |
//! | [`VisualSimilarity`]    | 40       |
//! | [`ForcedInteraction`]   | 10       |
//!
//! Strategies reporting a fixed confidence aren't applicable when that
//! confidence is below the engine's threshold, so they never change the page
//! for a recovery that would be rejected.

use std::time::Duration;

use async_trait::async_trait;

use super::{
    Browser, ElementSnapshot, FailureContext, Fingerprint, Healed, Locator,
    Presence, Strategy, StrategyError,
};

/// Tries the target's alternative [`Locator`]s in order.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlternativeLocator;

#[async_trait(?Send)]
impl Strategy for AlternativeLocator {
    fn name(&self) -> &str {
        "alternative-locator"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn is_applicable(&self, ctx: &FailureContext) -> bool {
        ctx.target.as_ref().is_some_and(|t| !t.alternatives.is_empty())
    }

    async fn attempt(
        &self,
        browser: &mut dyn Browser,
        ctx: &FailureContext,
    ) -> Result<Option<Healed>, StrategyError> {
        let Some(target) = &ctx.target else {
            return Ok(None);
        };
        for (i, alt) in target.alternatives.iter().enumerate() {
            if browser.probe(alt).await? == Presence::Actionable {
                #[allow(clippy::cast_precision_loss)] // few alternatives
                let penalty = 0.05 * i as f64;
                return Ok(Some(Healed {
                    target: alt.substitute(target.fingerprint.as_ref()),
                    confidence: (0.95 - penalty).max(0.75),
                }));
            }
        }
        Ok(None)
    }
}

/// Scrolls an out-of-view target into the viewport.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScrollIntoView;

impl ScrollIntoView {
    /// Confidence of a successful recovery.
    pub const CONFIDENCE: f64 = 0.9;
}

#[async_trait(?Send)]
impl Strategy for ScrollIntoView {
    fn name(&self) -> &str {
        "scroll-into-view"
    }

    fn priority(&self) -> i32 {
        90
    }

    fn is_applicable(&self, ctx: &FailureContext) -> bool {
        ctx.target.is_some() && ctx.accepts(Self::CONFIDENCE)
    }

    async fn attempt(
        &self,
        browser: &mut dyn Browser,
        ctx: &FailureContext,
    ) -> Result<Option<Healed>, StrategyError> {
        let Some(target) = &ctx.target else {
            return Ok(None);
        };
        if browser.probe(target).await? != Presence::OutOfView {
            return Ok(None);
        }
        if !browser.scroll_into_view(target).await? {
            return Ok(None);
        }
        actionable(browser, target, Self::CONFIDENCE).await
    }
}

/// Waits for a hidden or not yet rendered target to show up.
#[derive(Clone, Copy, Debug)]
pub struct WaitForVisibility {
    /// How long to wait.
    pub timeout: Duration,
}

impl WaitForVisibility {
    /// Confidence of a successful recovery.
    pub const CONFIDENCE: f64 = 0.85;
}

impl Default for WaitForVisibility {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

#[async_trait(?Send)]
impl Strategy for WaitForVisibility {
    fn name(&self) -> &str {
        "wait-for-visibility"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn is_applicable(&self, ctx: &FailureContext) -> bool {
        ctx.target.is_some() && ctx.accepts(Self::CONFIDENCE)
    }

    async fn attempt(
        &self,
        browser: &mut dyn Browser,
        ctx: &FailureContext,
    ) -> Result<Option<Healed>, StrategyError> {
        let Some(target) = &ctx.target else {
            return Ok(None);
        };
        if !matches!(
            browser.probe(target).await?,
            Presence::Missing | Presence::Hidden,
        ) {
            return Ok(None);
        }
        if !browser.wait_for_visible(target, self.timeout).await? {
            return Ok(None);
        }
        actionable(browser, target, Self::CONFIDENCE).await
    }
}

/// Removes elements covering the target.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlayRemoval;

impl OverlayRemoval {
    /// Confidence of a successful recovery.
    pub const CONFIDENCE: f64 = 0.8;
}

#[async_trait(?Send)]
impl Strategy for OverlayRemoval {
    fn name(&self) -> &str {
        "overlay-removal"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn is_applicable(&self, ctx: &FailureContext) -> bool {
        ctx.target.is_some() && ctx.accepts(Self::CONFIDENCE)
    }

    async fn attempt(
        &self,
        browser: &mut dyn Browser,
        ctx: &FailureContext,
    ) -> Result<Option<Healed>, StrategyError> {
        let Some(target) = &ctx.target else {
            return Ok(None);
        };
        if browser.probe(target).await? != Presence::Obscured {
            return Ok(None);
        }
        if browser.remove_overlays(target).await? == 0 {
            return Ok(None);
        }
        actionable(browser, target, Self::CONFIDENCE).await
    }
}

/// Closes modal dialogs hiding or covering the target.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModalDismissal;

impl ModalDismissal {
    /// Confidence of a successful recovery.
    pub const CONFIDENCE: f64 = 0.75;
}

#[async_trait(?Send)]
impl Strategy for ModalDismissal {
    fn name(&self) -> &str {
        "modal-dismissal"
    }

    fn priority(&self) -> i32 {
        60
    }

    fn is_applicable(&self, ctx: &FailureContext) -> bool {
        ctx.target.is_some() && ctx.accepts(Self::CONFIDENCE)
    }

    async fn attempt(
        &self,
        browser: &mut dyn Browser,
        ctx: &FailureContext,
    ) -> Result<Option<Healed>, StrategyError> {
        let Some(target) = &ctx.target else {
            return Ok(None);
        };
        if !matches!(
            browser.probe(target).await?,
            Presence::Obscured | Presence::Hidden,
        ) {
            return Ok(None);
        }
        if browser.dismiss_modals().await? == 0 {
            return Ok(None);
        }
        actionable(browser, target, Self::CONFIDENCE).await
    }
}

/// Searches the page for the element most resembling the target's last known
/// attributes.
#[derive(Clone, Copy, Debug, Default)]
pub struct HistoricalPattern;

#[async_trait(?Send)]
impl Strategy for HistoricalPattern {
    fn name(&self) -> &str {
        "historical-pattern"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn is_applicable(&self, ctx: &FailureContext) -> bool {
        ctx.target.as_ref().is_some_and(|t| t.fingerprint.is_some())
    }

    async fn attempt(
        &self,
        browser: &mut dyn Browser,
        ctx: &FailureContext,
    ) -> Result<Option<Healed>, StrategyError> {
        let Some(target) = &ctx.target else {
            return Ok(None);
        };
        let Some(known) = &target.fingerprint else {
            return Ok(None);
        };
        let candidates = browser.candidates().await?;
        Ok(best_match(candidates, target, |c| known.similarity(&c.fingerprint)))
    }
}

/// Searches the page for the element rendered most like the target was.
#[derive(Clone, Copy, Debug, Default)]
pub struct VisualSimilarity;

impl VisualSimilarity {
    fn score(known: &Fingerprint, candidate: &Fingerprint) -> f64 {
        let (Some(was), Some(is)) = (known.bounds, candidate.bounds) else {
            return 0.0;
        };
        let same_tag = known.tag.is_none() || known.tag == candidate.tag;
        let shape = 0.6 * was.overlap(&is) + 0.4 * was.size_likeness(&is);
        if same_tag {
            shape
        } else {
            shape / 2.0
        }
    }
}

#[async_trait(?Send)]
impl Strategy for VisualSimilarity {
    fn name(&self) -> &str {
        "visual-similarity"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn is_applicable(&self, ctx: &FailureContext) -> bool {
        ctx.target
            .as_ref()
            .and_then(|t| t.fingerprint.as_ref())
            .is_some_and(|f| f.bounds.is_some())
    }

    async fn attempt(
        &self,
        browser: &mut dyn Browser,
        ctx: &FailureContext,
    ) -> Result<Option<Healed>, StrategyError> {
        let Some(target) = &ctx.target else {
            return Ok(None);
        };
        let Some(known) = &target.fingerprint else {
            return Ok(None);
        };
        let candidates = browser.candidates().await?;
        Ok(best_match(candidates, target, |c| Self::score(known, &c.fingerprint)))
    }
}

/// Directs the retry to interact with a present target bypassing
/// actionability checks.
///
/// Doesn't touch the page itself: the healed target has [`Locator::force`]
/// set, and the retried handler is the one interacting with it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForcedInteraction;

impl ForcedInteraction {
    /// Confidence of a successful recovery.
    pub const CONFIDENCE: f64 = 0.7;
}

#[async_trait(?Send)]
impl Strategy for ForcedInteraction {
    fn name(&self) -> &str {
        "forced-interaction"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn is_applicable(&self, ctx: &FailureContext) -> bool {
        ctx.target.is_some() && ctx.accepts(Self::CONFIDENCE)
    }

    async fn attempt(
        &self,
        browser: &mut dyn Browser,
        ctx: &FailureContext,
    ) -> Result<Option<Healed>, StrategyError> {
        let Some(target) = &ctx.target else {
            return Ok(None);
        };
        if browser.probe(target).await? == Presence::Missing {
            return Ok(None);
        }
        Ok(Some(Healed {
            target: target.substitute(None).forced(),
            confidence: Self::CONFIDENCE,
        }))
    }
}

/// Re-probes the `target` after a corrective action.
async fn actionable(
    browser: &mut dyn Browser,
    target: &Locator,
    confidence: f64,
) -> Result<Option<Healed>, StrategyError> {
    Ok((browser.probe(target).await? == Presence::Actionable).then(|| Healed {
        target: target.substitute(None),
        confidence,
    }))
}

/// Picks the highest scored candidate other than the failed `original`.
fn best_match(
    candidates: Vec<ElementSnapshot>,
    original: &Locator,
    score: impl Fn(&ElementSnapshot) -> f64,
) -> Option<Healed> {
    candidates
        .into_iter()
        .filter(|c| !c.locator.addresses_same(original))
        .map(|c| {
            let s = score(&c);
            (c, s)
        })
        .filter(|(_, s)| *s > 0.0)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(c, confidence)| Healed {
            target: c.locator.with_fingerprint(c.fingerprint),
            confidence,
        })
}
