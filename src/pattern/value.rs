// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Placeholder types and the typed values they extract.

use std::{fmt, str::FromStr};

use derive_more::with_trait::{Display, Error};

/// Closed set of placeholder types a step template may contain.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ParameterType {
    /// `{string}`: a span in double or single quotes, yielded unquoted.
    #[display("string")]
    String,

    /// `{int}`: optionally signed digits, parsed as [`i64`].
    #[display("int")]
    Int,

    /// `{float}`: optionally signed digits with an optional decimal point.
    #[display("float")]
    Float,

    /// `{word}`: a single token without whitespace.
    #[display("word")]
    Word,
}

/// Error of parsing an unsupported [`ParameterType`] name.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("unsupported parameter type `{_0}`")]
pub struct UnknownParameterType(#[error(not(source))] pub String);

impl FromStr for ParameterType {
    type Err = UnknownParameterType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "word" => Ok(Self::Word),
            other => Err(UnknownParameterType(other.to_owned())),
        }
    }
}

impl ParameterType {
    /// Regex fragment matching this placeholder.
    ///
    /// `{string}` uses two capturing groups (double and single quoted forms),
    /// every other type uses exactly one.
    pub(crate) const fn regex(self) -> &'static str {
        match self {
            Self::String => r#"(?:"([^"]*)"|'([^']*)')"#,
            Self::Int => r"([-+]?\d+)",
            Self::Float => r"([-+]?(?:\d+(?:\.\d+)?|\.\d+))",
            Self::Word => r"([^\s]+)",
        }
    }

    /// Number of capturing groups [`ParameterType::regex()`] introduces.
    pub(crate) const fn groups(self) -> usize {
        match self {
            Self::String => 2,
            Self::Int | Self::Float | Self::Word => 1,
        }
    }

    /// Representative texts this placeholder accepts, used when probing two
    /// patterns for overlap.
    pub(crate) fn probes(self) -> &'static [&'static str] {
        match self {
            Self::String => &[r#""s""#, r#""s t""#, "''"],
            Self::Int => &["1", "-1"],
            Self::Float => &["1.5", "1", ".5"],
            Self::Word => &["w", "1", r#""s""#],
        }
    }
}

/// Value extracted from a step text by a placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    /// Unquoted content of a `{string}`.
    String(String),

    /// Value of an `{int}`.
    Int(i64),

    /// Value of a `{float}`.
    Float(f64),

    /// Value of a `{word}`.
    Word(String),
}

impl TypedValue {
    /// [`ParameterType`] this value was extracted by.
    #[must_use]
    pub const fn ty(&self) -> ParameterType {
        match self {
            Self::String(_) => ParameterType::String,
            Self::Int(_) => ParameterType::Int,
            Self::Float(_) => ParameterType::Float,
            Self::Word(_) => ParameterType::Word,
        }
    }

    /// Returns the integer, if this is an `{int}` value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        if let Self::Int(v) = self {
            Some(*v)
        } else {
            None
        }
    }

    /// Returns the number, if this is a `{float}` or an `{int}` value.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::String(_) | Self::Word(_) => None,
        }
    }

    /// Returns the text, if this is a `{string}` or a `{word}` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Word(s) => Some(s),
            Self::Int(_) | Self::Float(_) => None,
        }
    }
}

/// Renders the value the way it would appear in a step text, so substituting
/// it into its template yields a text the template matches again.
impl Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) if s.contains('"') => write!(f, "'{s}'"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Word(w) => write!(f, "{w}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_supported_names() {
        assert_eq!("int".parse(), Ok(ParameterType::Int));
        assert_eq!("word".parse(), Ok(ParameterType::Word));
        assert_eq!(
            "Int".parse::<ParameterType>(),
            Err(UnknownParameterType("Int".into())),
        );
        assert!("".parse::<ParameterType>().is_err());
    }

    #[test]
    fn string_display_picks_free_quote() {
        assert_eq!(TypedValue::String("a b".into()).to_string(), "\"a b\"");
        assert_eq!(
            TypedValue::String("say \"hi\"".into()).to_string(),
            "'say \"hi\"'",
        );
    }

    #[test]
    fn accessors_respect_types() {
        assert_eq!(TypedValue::Int(3).as_int(), Some(3));
        assert_eq!(TypedValue::Int(3).as_float(), Some(3.0));
        assert_eq!(TypedValue::Float(2.5).as_int(), None);
        assert_eq!(TypedValue::Word("ok".into()).as_str(), Some("ok"));
        assert_eq!(TypedValue::Float(2.5).as_str(), None);
        assert_eq!(TypedValue::Word("ok".into()).ty(), ParameterType::Word);
    }
}
