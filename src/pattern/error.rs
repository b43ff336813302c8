// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors of compiling a step template into a [`StepPattern`].
//!
//! [`StepPattern`]: super::StepPattern

use derive_more::with_trait::{Display, Error};

/// Error of compiling a malformed step template.
///
/// Always fatal at registration time: a run must not start with a step
/// definition that cannot be compiled.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("invalid step template `{template}` at byte {position}: {kind}")]
pub struct PatternError {
    /// Template that failed to compile.
    pub template: String,

    /// Byte offset inside the [`template`](PatternError::template) where the
    /// problem was detected.
    pub position: usize,

    /// What exactly went wrong.
    #[error(not(source))]
    pub kind: PatternErrorKind,
}

impl PatternError {
    /// Creates a new [`PatternError`].
    #[must_use]
    pub fn new(
        template: impl Into<String>,
        position: usize,
        kind: PatternErrorKind,
    ) -> Self {
        Self {
            template: template.into(),
            position,
            kind,
        }
    }
}

/// Kind of a [`PatternError`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum PatternErrorKind {
    /// Placeholder names a type outside of the supported set.
    #[display(
        "unknown parameter type `{{{_0}}}`, expected one of \
         `{{string}}`, `{{int}}`, `{{float}}` or `{{word}}`"
    )]
    UnknownParameter(String),

    /// Placeholder without a name: `{}`.
    #[display("empty parameter `{{}}`")]
    EmptyParameter,

    /// Placeholder opened inside another placeholder.
    #[display("nested parameter")]
    NestedParameter,

    /// Placeholder opened with `{` but never closed.
    #[display("unfinished parameter, missing `}}`")]
    UnfinishedParameter,

    /// Literal `}` without a matching `{`, which has to be escaped.
    #[display("unescaped `}}` in literal text, escape it as `\\}}`")]
    UnescapedClosingBrace,

    /// Backslash followed by a character that doesn't need escaping.
    #[display("only `{{`, `}}` and `\\` can be escaped, found `\\{_0}`")]
    EscapedNonReservedCharacter(char),

    /// Placeholder directly following another one: `{int}{int}`.
    #[display("parameters must be separated by literal text")]
    AdjacentParameters,

    /// Template ends with a lone backslash.
    #[display("template ends with a dangling `\\`")]
    DanglingEscape,

    /// Compiled matcher was rejected by the regex engine.
    #[display("cannot build matcher: {_0}")]
    InvalidRegex(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_template_position_and_kind() {
        let err = PatternError::new(
            "I have {bogus} apples",
            7,
            PatternErrorKind::UnknownParameter("bogus".into()),
        );

        let out = err.to_string();
        assert!(out.contains("`I have {bogus} apples`"), "{out}");
        assert!(out.contains("byte 7"), "{out}");
        assert!(out.contains("unknown parameter type `{bogus}`"), "{out}");
    }

    #[test]
    fn escape_hint_is_rendered() {
        let err =
            PatternError::new("a } b", 2, PatternErrorKind::UnescapedClosingBrace);
        assert!(err.to_string().contains("escape it as `\\}`"));
    }

    #[test]
    fn is_std_error() {
        let err = PatternError::new("{", 0, PatternErrorKind::UnfinishedParameter);
        let _: &dyn std::error::Error = &err;
    }
}
