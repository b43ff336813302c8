// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Descriptors of UI elements.

use std::collections::BTreeMap;

use derive_more::with_trait::Display;

/// Addressing scheme of a [`Locator`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
#[cfg_attr(feature = "output-json", serde(rename_all = "kebab-case"))]
pub enum LocatorKind {
    /// CSS selector.
    #[display("css")]
    Css,

    /// XPath expression.
    #[display("xpath")]
    XPath,

    /// Element `id` attribute.
    #[display("id")]
    Id,

    /// Visible text.
    #[display("text")]
    Text,

    /// `data-testid` attribute.
    #[display("test-id")]
    TestId,

    /// `name` attribute.
    #[display("name")]
    Name,
}

/// Description of how to find a UI element.
#[derive(Clone, Debug, Display, PartialEq)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
#[display("{kind}={value}")]
pub struct Locator {
    /// Addressing scheme.
    pub kind: LocatorKind,

    /// Selector, expression or literal, depending on the `kind`.
    pub value: String,

    /// Other ways of addressing the same element, most preferred first.
    #[cfg_attr(feature = "output-json", serde(skip_serializing_if = "Vec::is_empty"))]
    pub alternatives: Vec<Locator>,

    /// Last known shape of the element.
    #[cfg_attr(feature = "output-json", serde(skip_serializing_if = "Option::is_none"))]
    pub fingerprint: Option<Fingerprint>,

    /// Whether the element has to be interacted with bypassing visibility
    /// and actionability checks.
    ///
    /// Set only on targets healed by [`ForcedInteraction`], which leaves the
    /// interaction itself to the retried handler.
    ///
    /// [`ForcedInteraction`]: super::builtin::ForcedInteraction
    #[cfg_attr(feature = "output-json", serde(skip_serializing_if = "std::ops::Not::not"))]
    pub force: bool,
}

impl Locator {
    /// Creates a new [`Locator`] without alternatives or fingerprint.
    #[must_use]
    pub fn new(kind: LocatorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            alternatives: Vec::new(),
            fingerprint: None,
            force: false,
        }
    }

    /// Creates a new [`LocatorKind::Css`] [`Locator`].
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(LocatorKind::Css, selector)
    }

    /// Creates a new [`LocatorKind::XPath`] [`Locator`].
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::new(LocatorKind::XPath, expr)
    }

    /// Creates a new [`LocatorKind::Id`] [`Locator`].
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::new(LocatorKind::Id, id)
    }

    /// Creates a new [`LocatorKind::Text`] [`Locator`].
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(LocatorKind::Text, text)
    }

    /// Creates a new [`LocatorKind::TestId`] [`Locator`].
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::new(LocatorKind::TestId, id)
    }

    /// Creates a new [`LocatorKind::Name`] [`Locator`].
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::new(LocatorKind::Name, name)
    }

    /// Adds an alternative [`Locator`] of the same element.
    #[must_use]
    pub fn or(mut self, alternative: Self) -> Self {
        self.alternatives.push(alternative);
        self
    }

    /// Attaches the last known [`Fingerprint`] of the element.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// Marks the element to be interacted with bypassing actionability
    /// checks.
    #[must_use]
    pub const fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Indicates whether both [`Locator`]s address the element the same way,
    /// ignoring alternatives and fingerprints.
    #[must_use]
    pub fn addresses_same(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }

    /// Returns this [`Locator`] stripped of its alternatives, keeping the
    /// given `fingerprint` if it has none of its own.
    pub(crate) fn substitute(&self, fingerprint: Option<&Fingerprint>) -> Self {
        Self {
            kind: self.kind,
            value: self.value.clone(),
            alternatives: Vec::new(),
            fingerprint: self.fingerprint.clone().or_else(|| fingerprint.cloned()),
            force: false,
        }
    }
}

/// Rectangle an element occupies on the page, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
pub struct Bounds {
    /// Left edge.
    pub x: f64,

    /// Top edge.
    pub y: f64,

    /// Width.
    pub width: f64,

    /// Height.
    pub height: f64,
}

impl Bounds {
    /// Creates new [`Bounds`].
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union of both rectangles, in `[0, 1]`.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> f64 {
        let w = (self.x + self.width).min(other.x + other.width) - self.x.max(other.x);
        let h = (self.y + self.height).min(other.y + other.height) - self.y.max(other.y);
        let inter = w.max(0.0) * h.max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        (inter / union).clamp(0.0, 1.0)
    }

    /// Likeness of both rectangles' sizes, in `[0, 1]`.
    #[must_use]
    pub fn size_likeness(&self, other: &Self) -> f64 {
        let (a, b) = (self.area(), other.area());
        if a <= 0.0 || b <= 0.0 {
            return 0.0;
        }
        a.min(b) / a.max(b)
    }
}

/// Snapshot of an element's identifying features.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
pub struct Fingerprint {
    /// Tag name, lowercase.
    pub tag: Option<String>,

    /// `id` attribute.
    pub id: Option<String>,

    /// Visible text, trimmed.
    pub text: Option<String>,

    /// CSS classes.
    pub classes: Vec<String>,

    /// Remaining attributes.
    pub attributes: BTreeMap<String, String>,

    /// Rendered rectangle.
    pub bounds: Option<Bounds>,
}

impl Fingerprint {
    /// Creates a new [`Fingerprint`] of an element with the given `tag`.
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// Sets the `id`.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the visible text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Adds a CSS class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the rendered rectangle.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Weighted likeness of the identifying features, in `[0, 1]`.
    ///
    /// Only features known on `self` count, so a sparse fingerprint isn't
    /// penalized for what it never recorded.
    #[must_use]
    pub fn similarity(&self, other: &Self) -> f64 {
        let mut score = 0.0;
        let mut weight = 0.0;

        let mut feature = |w: f64, s: f64| {
            weight += w;
            score += w * s;
        };

        if let Some(tag) = &self.tag {
            feature(1.0, f64::from(u8::from(Some(tag) == other.tag.as_ref())));
        }
        if let Some(id) = &self.id {
            feature(3.0, f64::from(u8::from(Some(id) == other.id.as_ref())));
        }
        if let Some(text) = &self.text {
            let s = other
                .text
                .as_deref()
                .map_or(0.0, |t| token_likeness(text, t));
            feature(3.0, s);
        }
        if !self.classes.is_empty() {
            let shared = self
                .classes
                .iter()
                .filter(|c| other.classes.contains(c))
                .count();
            feature(1.5, ratio(shared, self.classes.len().max(other.classes.len())));
        }
        if !self.attributes.is_empty() {
            let shared = self
                .attributes
                .iter()
                .filter(|(k, v)| other.attributes.get(*k) == Some(v))
                .count();
            feature(2.0, ratio(shared, self.attributes.len()));
        }

        if weight == 0.0 {
            0.0
        } else {
            score / weight
        }
    }
}

#[allow(clippy::cast_precision_loss)] // counts are tiny
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Jaccard index of both texts' lowercase word sets.
fn token_likeness(a: &str, b: &str) -> f64 {
    let words = |s: &str| {
        s.split_whitespace()
            .map(str::to_lowercase)
            .collect::<std::collections::BTreeSet<_>>()
    };
    let (a, b) = (words(a), words(b));
    ratio(a.intersection(&b).count(), a.union(&b).count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_kind_and_value() {
        assert_eq!(Locator::css("#buy").to_string(), "css=#buy");
        assert_eq!(Locator::test_id("buy").to_string(), "test-id=buy");
        assert_eq!(
            Locator::xpath("//button[1]").or(Locator::id("buy")).to_string(),
            "xpath=//button[1]",
        );
    }

    #[test]
    fn substitute_inherits_fingerprint() {
        let fp = Fingerprint::tag("button").with_id("buy");
        let original = Locator::css("#buy")
            .or(Locator::text("Buy now"))
            .with_fingerprint(fp.clone());

        let alt = original.alternatives[0].substitute(original.fingerprint.as_ref());
        assert_eq!(alt.fingerprint, Some(fp));
        assert!(alt.alternatives.is_empty());
        assert!(!alt.force);
    }

    #[test]
    fn forcing_keeps_the_address() {
        let forced = Locator::css("#pay").forced();
        assert!(forced.force);
        assert_eq!(forced.to_string(), "css=#pay");
        assert!(forced.addresses_same(&Locator::css("#pay").or(Locator::id("pay"))));
        assert!(!forced.addresses_same(&Locator::id("pay")));
        assert!(!forced.substitute(None).force);
    }

    #[test]
    fn bounds_overlap() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!((a.overlap(&a) - 1.0).abs() < f64::EPSILON);
        assert!((a.overlap(&Bounds::new(5.0, 0.0, 10.0, 10.0)) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(a.overlap(&Bounds::new(20.0, 20.0, 5.0, 5.0)), 0.0);
        assert!((a.size_likeness(&Bounds::new(50.0, 50.0, 5.0, 20.0)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn similarity_weighs_known_features() {
        let known = Fingerprint::tag("button")
            .with_text("Buy now")
            .with_class("btn")
            .with_class("primary");

        let same = known.clone().with_id("new-id");
        assert!((known.similarity(&same) - 1.0).abs() < 1e-9);

        let renamed = Fingerprint::tag("button")
            .with_text("Buy it now")
            .with_class("btn");
        let score = known.similarity(&renamed);
        assert!(score > 0.5 && score < 1.0, "{score}");

        let unrelated = Fingerprint::tag("a").with_text("Privacy policy");
        assert!(known.similarity(&unrelated) < 0.2);
        assert_eq!(Fingerprint::default().similarity(&known), 0.0);
    }
}
