// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Deciding which runtime [`Module`]s a scenario needs before it runs.
//!
//! Detection is a pure function of a [`ScenarioDescriptor`] and a configured
//! [`Detector`]: no I/O, no shared state.

mod requirement;
pub mod vocabulary;

use std::{collections::BTreeSet, str::FromStr};

use derive_more::with_trait::{Display, Error};
use smart_default::SmartDefault;
use tracing::trace;

pub use self::requirement::{Module, ModuleRequirement, UnknownModule};

/// Policy of deriving a [`ModuleRequirement`].
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
#[cfg_attr(feature = "output-json", serde(rename_all = "snake_case"))]
pub enum DetectionMode {
    /// Only scenario tags are considered (`explicit`).
    #[display("explicit")]
    Tags,

    /// Only step vocabulary is considered (`auto`).
    #[display("auto")]
    Patterns,

    /// Tags win whenever any tag maps to a module, step vocabulary is used
    /// otherwise. The two are never blended.
    #[default]
    #[display("hybrid")]
    Hybrid,
}

/// Error of parsing an unknown [`DetectionMode`].
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("unknown detection mode `{_0}`, expected `auto`, `explicit` or `hybrid`")]
pub struct UnknownDetectionMode(#[error(not(source))] pub String);

impl FromStr for DetectionMode {
    type Err = UnknownDetectionMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explicit" | "tags" => Ok(Self::Tags),
            "auto" | "patterns" => Ok(Self::Patterns),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(UnknownDetectionMode(s.to_owned())),
        }
    }
}

/// What detection looks at: a scenario's tags and step texts.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ScenarioDescriptor {
    /// Tags, normalized to lowercase without the leading `@`.
    pub tags: BTreeSet<String>,

    /// Step texts, in declaration order.
    pub steps: Vec<String>,
}

impl ScenarioDescriptor {
    /// Creates a new [`ScenarioDescriptor`], normalizing the `tags`.
    #[must_use]
    pub fn new<T, S>(
        tags: impl IntoIterator<Item = T>,
        steps: impl IntoIterator<Item = S>,
    ) -> Self
    where
        T: AsRef<str>,
        S: Into<String>,
    {
        Self {
            tags: tags
                .into_iter()
                .map(|t| t.as_ref().trim().trim_start_matches('@').to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }
}

/// Union of the [`Module`]s the `tags` request.
#[must_use]
pub fn by_tags<'t>(tags: impl IntoIterator<Item = &'t String>) -> ModuleRequirement {
    tags.into_iter().filter_map(|t| Module::from_tag(t)).collect()
}

/// Union of the [`Module`]s the `steps` vocabulary signals.
#[must_use]
pub fn by_patterns<'s>(steps: impl IntoIterator<Item = &'s String>) -> ModuleRequirement {
    steps
        .into_iter()
        .map(|s| vocabulary::signals(s))
        .fold(ModuleRequirement::none(), ModuleRequirement::union)
}

/// Configured module detection policy.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, SmartDefault)]
pub struct Detector {
    /// Whether detection runs at all. When disabled every [`Module`] is
    /// required.
    #[default = true]
    pub enabled: bool,

    /// [`DetectionMode`] to apply.
    pub mode: DetectionMode,

    /// Whether a scenario signaling nothing falls back to requiring the
    /// browser.
    #[default = true]
    pub default_browser: bool,

    /// Whether the browser is required no matter what was detected.
    pub force_browser: bool,
}

impl Detector {
    /// Creates a new enabled [`Detector`] with the given [`DetectionMode`].
    #[must_use]
    pub fn new(mode: DetectionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Sets the [`Detector::default_browser`] fallback.
    #[must_use]
    pub const fn default_browser(mut self, enabled: bool) -> Self {
        self.default_browser = enabled;
        self
    }

    /// Sets the [`Detector::force_browser`] override.
    #[must_use]
    pub const fn force_browser(mut self, enabled: bool) -> Self {
        self.force_browser = enabled;
        self
    }

    /// Computes the [`ModuleRequirement`] of the given scenario.
    #[must_use]
    pub fn detect(&self, scenario: &ScenarioDescriptor) -> ModuleRequirement {
        if !self.enabled {
            return ModuleRequirement::all();
        }

        let mut req = match self.mode {
            DetectionMode::Tags => by_tags(&scenario.tags),
            DetectionMode::Patterns => by_patterns(&scenario.steps),
            DetectionMode::Hybrid => {
                let tagged = by_tags(&scenario.tags);
                if tagged.is_empty() {
                    by_patterns(&scenario.steps)
                } else {
                    tagged
                }
            }
        };

        if req.is_empty() && self.default_browser {
            req.ui = true;
        }
        if self.force_browser {
            req.ui = true;
        }

        trace!(mode = %self.mode, tags = ?scenario.tags, %req, "modules detected");
        req
    }

    /// Indicates whether a single step is UI-classified, using the same
    /// vocabulary as [`DetectionMode::Patterns`].
    #[must_use]
    pub fn is_ui_step(text: &str) -> bool {
        vocabulary::is_ui(text)
    }
}

/// Computes the [`ModuleRequirement`] of the given `scenario` under the given
/// `policy`.
#[must_use]
pub fn detect(scenario: &ScenarioDescriptor, policy: &Detector) -> ModuleRequirement {
    policy.detect(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(tags: &[&str], steps: &[&str]) -> ScenarioDescriptor {
        ScenarioDescriptor::new(tags, steps.iter().copied())
    }

    #[test]
    fn tags_accumulate() {
        let s = scenario(&["@api", "@DB", "@smoke"], &[]);
        let req = Detector::new(DetectionMode::Tags).detect(&s);
        assert_eq!(
            req,
            ModuleRequirement { api: true, database: true, ..ModuleRequirement::none() },
        );
    }

    #[test]
    fn patterns_accumulate() {
        let s = scenario(
            &[],
            &["I open the login page", "I send a GET request to \"/health\""],
        );
        let req = Detector::new(DetectionMode::Patterns).detect(&s);
        assert_eq!(
            req,
            ModuleRequirement { ui: true, api: true, ..ModuleRequirement::none() },
        );
    }

    #[test]
    fn hybrid_tags_override_patterns() {
        let s = scenario(&["@api"], &["I click the submit button"]);
        let req = Detector::default().detect(&s);
        assert_eq!(req, ModuleRequirement::only(Module::Api));
    }

    #[test]
    fn hybrid_falls_back_to_patterns_without_module_tags() {
        let s = scenario(&["@smoke"], &["I click the submit button"]);
        let req = Detector::default().detect(&s);
        assert_eq!(req, ModuleRequirement::only(Module::Ui));
    }

    #[test]
    fn explicit_mode_ignores_patterns() {
        let s = scenario(&["@database"], &["I execute query X"]);
        let req = Detector::new(DetectionMode::Tags).detect(&s);
        assert_eq!(
            req,
            ModuleRequirement { ui: false, api: false, database: true, soap: false },
        );
    }

    #[test]
    fn no_signal_uses_default_browser_fallback() {
        let s = scenario(&[], &["the user is an administrator"]);
        assert_eq!(
            Detector::default().detect(&s),
            ModuleRequirement::only(Module::Ui),
        );
        assert_eq!(
            Detector::default().default_browser(false).detect(&s),
            ModuleRequirement::none(),
        );
    }

    #[test]
    fn force_browser_always_adds_ui() {
        let s = scenario(&["@api"], &[]);
        let req = Detector::default().force_browser(true).detect(&s);
        assert_eq!(req, ModuleRequirement::only(Module::Api).with(Module::Ui));
    }

    #[test]
    fn disabled_detection_requires_everything() {
        let s = scenario(&["@api"], &[]);
        let detector = Detector { enabled: false, ..Detector::default() };
        assert_eq!(detector.detect(&s), ModuleRequirement::all());
    }

    #[test]
    fn detection_is_pure() {
        let s = scenario(&["@soap", "@rest"], &["I click it", "I run a query"]);
        for mode in [DetectionMode::Tags, DetectionMode::Patterns, DetectionMode::Hybrid] {
            let detector = Detector::new(mode);
            let first = detect(&s, &detector);
            for _ in 0..10 {
                assert_eq!(detect(&s.clone(), &detector), first);
            }
        }
    }

    #[test]
    fn descriptor_normalizes_tags() {
        let s = scenario(&["@Api", "api", " @WEB ", "@"], &[]);
        assert_eq!(
            s.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            ["api", "web"],
        );
    }

    #[test]
    fn parses_modes() {
        assert_eq!("explicit".parse(), Ok(DetectionMode::Tags));
        assert_eq!("AUTO".parse(), Ok(DetectionMode::Patterns));
        assert_eq!("hybrid".parse(), Ok(DetectionMode::Hybrid));
        assert!("magic".parse::<DetectionMode>().is_err());
        assert_eq!(DetectionMode::Patterns.to_string(), "auto");
    }

    #[test]
    fn ui_step_classification() {
        assert!(Detector::is_ui_step("I click the login button"));
        assert!(!Detector::is_ui_step("I execute query X"));
    }
}
