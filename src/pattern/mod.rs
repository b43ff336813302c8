// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Compiling step templates into [`StepPattern`]s and matching step texts
//! against them.
//!
//! A template is literal text with typed placeholders:
//!
//! ```text
//! I add {int} items named {string} to the {word} list
//! ```
//!
//! Literal `{`, `}` and `\` are written as `\{`, `\}` and `\\`. Matching is
//! anchored: the whole step text has to be consumed.
//!
//! Placeholders have to be separated by literal text, otherwise there would
//! be no single way to split a text like `123` between `{int}{int}`.

mod error;
mod value;

use std::{fmt, hash, mem, str::FromStr};

use itertools::Itertools as _;
use regex::Regex;

pub use self::{
    error::{PatternError, PatternErrorKind},
    value::{ParameterType, TypedValue, UnknownParameterType},
};

/// Upper bound of sample texts synthesized by [`StepPattern::samples()`].
const MAX_SAMPLES: usize = 512;

/// Single piece of a compiled template.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Segment {
    /// Text matched verbatim.
    Literal(String),

    /// Typed placeholder.
    Parameter(ParameterType),
}

/// Compiled step template.
///
/// Compiled once and immutable afterwards, so it's cheap to share across
/// every match. Two [`StepPattern`]s are equal when their templates are the
/// same after normalizing escapes.
#[derive(Clone, Debug)]
pub struct StepPattern {
    /// Template as it was written.
    template: String,

    /// Normalized form of the [`template`](StepPattern::template).
    canonical: String,

    /// Parsed [`Segment`]s, in order.
    segments: Vec<Segment>,

    /// Anchored matcher built from the [`segments`](StepPattern::segments).
    regex: Regex,
}

/// Compiles the given `template` into a [`StepPattern`].
///
/// # Errors
///
/// If the `template` contains an unsupported placeholder or an unescaped
/// placeholder delimiter. See [`PatternErrorKind`] for details.
pub fn compile(template: &str) -> Result<StepPattern, PatternError> {
    StepPattern::compile(template)
}

impl StepPattern {
    /// Compiles the given `template`.
    ///
    /// # Errors
    ///
    /// See [`compile()`].
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let segments = parse(template)?;

        let source = regex_source(&segments);
        let regex = Regex::new(&source).map_err(|e| {
            PatternError::new(
                template,
                0,
                PatternErrorKind::InvalidRegex(e.to_string()),
            )
        })?;

        Ok(Self {
            template: template.to_owned(),
            canonical: canonicalize(&segments),
            segments,
            regex,
        })
    }

    /// Template this [`StepPattern`] was compiled from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parsed [`Segment`]s of this [`StepPattern`].
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Iterates over the placeholder types, in order.
    pub fn parameters(&self) -> impl Iterator<Item = ParameterType> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Parameter(ty) => Some(*ty),
            Segment::Literal(_) => None,
        })
    }

    /// Number of placeholders.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters().count()
    }

    /// Matches the whole `text`, extracting a [`TypedValue`] per placeholder.
    ///
    /// Returns [`None`] if literal segments don't align, or if a captured
    /// number cannot be parsed (an `{int}` overflowing [`i64`], for example).
    #[must_use]
    pub fn matches(&self, text: &str) -> Option<Vec<TypedValue>> {
        let caps = self.regex.captures(text)?;

        let mut group = 1;
        let mut values = Vec::with_capacity(self.arity());
        for ty in self.parameters() {
            let value = match ty {
                ParameterType::String => {
                    let m = caps.get(group).or_else(|| caps.get(group + 1))?;
                    TypedValue::String(m.as_str().to_owned())
                }
                ParameterType::Int => {
                    TypedValue::Int(caps.get(group)?.as_str().parse().ok()?)
                }
                ParameterType::Float => {
                    TypedValue::Float(caps.get(group)?.as_str().parse().ok()?)
                }
                ParameterType::Word => {
                    TypedValue::Word(caps.get(group)?.as_str().to_owned())
                }
            };
            group += ty.groups();
            values.push(value);
        }
        Some(values)
    }

    /// Checks whether the whole `text` matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.matches(text).is_some()
    }

    /// Whitespace separated tokens of the literal segments.
    pub(crate) fn literal_tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Literal(l) => Some(l.split_whitespace()),
                Segment::Parameter(_) => None,
            })
            .flatten()
    }

    /// Synthesizes texts this [`StepPattern`] matches, filling placeholders
    /// with representative values and with the given `tokens`.
    ///
    /// Used to probe whether another pattern accepts any of them. The output
    /// is capped by [`MAX_SAMPLES`].
    pub(crate) fn samples(&self, tokens: &[&str]) -> Vec<String> {
        let candidates = self
            .parameters()
            .map(|ty| {
                let mut out = ty
                    .probes()
                    .iter()
                    .map(|p| (*p).to_owned())
                    .collect::<Vec<_>>();
                for t in tokens {
                    match ty {
                        ParameterType::String => out.push(format!("\"{t}\"")),
                        ParameterType::Word => out.push((*t).to_owned()),
                        ParameterType::Int | ParameterType::Float => {
                            if t.parse::<f64>().is_ok() {
                                out.push((*t).to_owned());
                            }
                        }
                    }
                }
                out.into_iter().unique().collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        if candidates.is_empty() {
            return vec![self.render(&[])];
        }

        candidates
            .into_iter()
            .multi_cartesian_product()
            .take(MAX_SAMPLES)
            .map(|values| self.render(&values))
            .collect()
    }

    /// Renders this [`StepPattern`] with `values` substituted into the
    /// placeholders, in order.
    fn render(&self, values: &[String]) -> String {
        let mut values = values.iter();
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => l.as_str(),
                Segment::Parameter(_) => {
                    values.next().map_or("", String::as_str)
                }
            })
            .collect()
    }

    /// Checks whether some step text could be matched by both this and the
    /// `other` [`StepPattern`].
    ///
    /// Identical normalized templates always overlap. Otherwise texts
    /// synthesized from each pattern are probed against the other one.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.canonical == other.canonical {
            return true;
        }

        let tokens = self
            .literal_tokens()
            .chain(other.literal_tokens())
            .unique()
            .collect::<Vec<_>>();

        self.samples(&tokens).iter().any(|s| other.is_match(s))
            || other.samples(&tokens).iter().any(|s| self.is_match(s))
    }
}

impl PartialEq for StepPattern {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for StepPattern {}

impl hash::Hash for StepPattern {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for StepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl FromStr for StepPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

/// Splits the `template` into [`Segment`]s.
fn parse(template: &str) -> Result<Vec<Segment>, PatternError> {
    let err = |pos, kind| PatternError::new(template, pos, kind);

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices();

    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, esc @ ('{' | '}' | '\\'))) => literal.push(esc),
                Some((at, other)) => {
                    return Err(err(
                        at,
                        PatternErrorKind::EscapedNonReservedCharacter(other),
                    ));
                }
                None => {
                    return Err(err(pos, PatternErrorKind::DanglingEscape));
                }
            },
            '}' => {
                return Err(err(pos, PatternErrorKind::UnescapedClosingBrace));
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((at, '{')) => {
                            return Err(err(
                                at,
                                PatternErrorKind::NestedParameter,
                            ));
                        }
                        Some((_, ch)) => name.push(ch),
                        None => {
                            return Err(err(
                                pos,
                                PatternErrorKind::UnfinishedParameter,
                            ));
                        }
                    }
                }

                if name.is_empty() {
                    return Err(err(pos, PatternErrorKind::EmptyParameter));
                }
                let ty = name.parse::<ParameterType>().map_err(|_| {
                    err(pos, PatternErrorKind::UnknownParameter(name))
                })?;

                if !literal.is_empty() {
                    segments.push(Segment::Literal(mem::take(&mut literal)));
                } else if matches!(segments.last(), Some(Segment::Parameter(_))) {
                    return Err(err(pos, PatternErrorKind::AdjacentParameters));
                }
                segments.push(Segment::Parameter(ty));
            }
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

/// Builds the anchored regex source for the given `segments`.
fn regex_source(segments: &[Segment]) -> String {
    let body = segments
        .iter()
        .map(|s| match s {
            Segment::Literal(l) => regex::escape(l),
            Segment::Parameter(ty) => ty.regex().to_owned(),
        })
        .join("");
    format!("^{body}$")
}

/// Renders the `segments` back into a template with normalized escapes.
fn canonicalize(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| match s {
            Segment::Literal(l) => l
                .replace('\\', r"\\")
                .replace('{', r"\{")
                .replace('}', r"\}"),
            Segment::Parameter(ty) => format!("{{{ty}}}"),
        })
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(template: &str) -> PatternErrorKind {
        compile(template).unwrap_err().kind
    }

    #[test]
    fn compiles_literal_and_parameters() {
        let p = compile("I add {int} items to {word}").unwrap();
        assert_eq!(
            p.segments(),
            &[
                Segment::Literal("I add ".into()),
                Segment::Parameter(ParameterType::Int),
                Segment::Literal(" items to ".into()),
                Segment::Parameter(ParameterType::Word),
            ],
        );
        assert_eq!(p.arity(), 2);
    }

    #[test]
    fn rejects_malformed_templates() {
        assert_eq!(
            kind("I have {number} apples"),
            PatternErrorKind::UnknownParameter("number".into()),
        );
        assert_eq!(kind("I have {} apples"), PatternErrorKind::EmptyParameter);
        assert_eq!(kind("I have {int apples"), PatternErrorKind::UnfinishedParameter);
        assert_eq!(kind("I have {in{t}}"), PatternErrorKind::NestedParameter);
        assert_eq!(kind("I have } apples"), PatternErrorKind::UnescapedClosingBrace);
        assert_eq!(
            kind(r"I have \d apples"),
            PatternErrorKind::EscapedNonReservedCharacter('d'),
        );
        assert_eq!(kind("trailing \\"), PatternErrorKind::DanglingEscape);
    }

    #[test]
    fn error_points_to_offending_position() {
        let err = compile("ab {nope}").unwrap_err();
        assert_eq!(err.position, 3);
        assert_eq!(err.template, "ab {nope}");
    }

    #[test]
    fn escaped_delimiters_are_literals() {
        let p = compile(r"render \{{word}\} with \\").unwrap();
        assert_eq!(
            p.matches(r"render {name} with \"),
            Some(vec![TypedValue::Word("name".into())]),
        );
        assert_eq!(p.arity(), 1);
    }

    #[test]
    fn regex_metacharacters_in_literals_are_escaped() {
        let p = compile("price is $5.00 (approx)?").unwrap();
        assert!(p.is_match("price is $5.00 (approx)?"));
        assert!(!p.is_match("price is $5x00 (approx)"));
    }

    #[test]
    fn matching_is_anchored() {
        let p = compile("I click {word}").unwrap();
        assert!(p.is_match("I click submit"));
        assert!(!p.is_match("Then I click submit"));
        assert!(!p.is_match("I click submit now"));
    }

    #[test]
    fn int_accepts_signs_and_rejects_fractions() {
        let p = compile("I have {int} apples").unwrap();
        assert_eq!(p.matches("I have 42 apples"), Some(vec![TypedValue::Int(42)]));
        assert_eq!(p.matches("I have -3 apples"), Some(vec![TypedValue::Int(-3)]));
        assert_eq!(p.matches("I have +7 apples"), Some(vec![TypedValue::Int(7)]));
        assert_eq!(p.matches("I have 4.5 apples"), None);
        assert_eq!(p.matches("I have many apples"), None);
    }

    #[test]
    fn int_overflow_fails_the_whole_match() {
        let p = compile("I have {int} apples").unwrap();
        assert_eq!(p.matches("I have 99999999999999999999999 apples"), None);
    }

    #[test]
    fn float_accepts_optional_decimal_point() {
        let p = compile("it costs {float}").unwrap();
        assert_eq!(p.matches("it costs 2.5"), Some(vec![TypedValue::Float(2.5)]));
        assert_eq!(p.matches("it costs 3"), Some(vec![TypedValue::Float(3.0)]));
        assert_eq!(p.matches("it costs .5"), Some(vec![TypedValue::Float(0.5)]));
        assert_eq!(p.matches("it costs -1.25"), Some(vec![TypedValue::Float(-1.25)]));
        assert_eq!(p.matches("it costs 1.2.3"), None);
    }

    #[test]
    fn string_yields_unquoted_content() {
        let p = compile("I type {string} into {word}").unwrap();
        assert_eq!(
            p.matches(r#"I type "hello world" into search"#),
            Some(vec![
                TypedValue::String("hello world".into()),
                TypedValue::Word("search".into()),
            ]),
        );
        assert_eq!(
            p.matches("I type 'single' into search"),
            Some(vec![
                TypedValue::String("single".into()),
                TypedValue::Word("search".into()),
            ]),
        );
        assert_eq!(p.matches("I type unquoted into search"), None);
    }

    #[test]
    fn empty_string_is_allowed() {
        let p = compile("I type {string}").unwrap();
        assert_eq!(p.matches(r#"I type """#), Some(vec![TypedValue::String(String::new())]));
    }

    #[test]
    fn word_rejects_whitespace() {
        let p = compile("I open {word}").unwrap();
        assert!(p.is_match("I open settings"));
        assert!(!p.is_match("I open the settings"));
    }

    #[test]
    fn substituted_values_round_trip() {
        let cases: Vec<(&str, Vec<TypedValue>)> = vec![
            (
                "user {word} has {int} points and {float} ratio",
                vec![
                    TypedValue::Word("alice".into()),
                    TypedValue::Int(-12),
                    TypedValue::Float(0.75),
                ],
            ),
            (
                "{string} equals {string}",
                vec![
                    TypedValue::String("a b".into()),
                    TypedValue::String("say \"hi\"".into()),
                ],
            ),
            (
                "{int}-{word}",
                vec![TypedValue::Int(5), TypedValue::Word("x-y".into())],
            ),
        ];

        for (template, values) in cases {
            let p = compile(template).unwrap();
            let text = p.render(&values.iter().map(ToString::to_string).collect::<Vec<_>>());
            assert_eq!(p.matches(&text), Some(values), "template: {template}");
        }
    }

    #[test]
    fn adjacent_parameters_are_rejected() {
        assert_eq!(kind("total {int}{int}"), PatternErrorKind::AdjacentParameters);
        assert_eq!(kind("{word}{word}"), PatternErrorKind::AdjacentParameters);
        assert_eq!(compile("{string}{float} left").unwrap_err().position, 8);

        let p = compile("total {int} {int}").unwrap();
        assert_eq!(
            p.matches("total 1 23"),
            Some(vec![TypedValue::Int(1), TypedValue::Int(23)]),
        );
    }

    #[test]
    fn equality_ignores_escape_spelling() {
        let a = compile("I press {word}").unwrap();
        let b = compile("I press {word}").unwrap();
        let c = compile("I press {string}").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn overlap_detects_identical_templates() {
        let a = compile("I log in as {word}").unwrap();
        let b = compile("I log in as {word}").unwrap();
        assert!(a.overlaps(&b));
    }

    #[test]
    fn overlap_detects_parameter_swallowing_literal() {
        let a = compile("I click {word}").unwrap();
        let b = compile("I click submit").unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn overlap_detects_crossed_parameters() {
        let a = compile("I {word} the button").unwrap();
        let b = compile("I click the {word}").unwrap();
        assert!(a.overlaps(&b));
    }

    #[test]
    fn overlap_detects_int_inside_float() {
        let a = compile("wait {int} seconds").unwrap();
        let b = compile("wait {float} seconds").unwrap();
        assert!(a.overlaps(&b));
    }

    #[test]
    fn disjoint_patterns_do_not_overlap() {
        let a = compile("I have {int} apples").unwrap();
        let b = compile("I have {int} pears").unwrap();
        let c = compile("I type {string}").unwrap();
        let d = compile("I type slowly").unwrap();
        assert!(!a.overlaps(&b));
        assert!(!c.overlaps(&d));
    }
}
