// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Declaration sites of step definitions.

use std::panic;

use derive_more::with_trait::Display;

/// Location of a step declaration, captured with `#[track_caller]` at
/// registration so ambiguity errors can point at both sides.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
#[display("{path}:{line}:{column}")]
pub struct Location {
    /// Path to the file where the step is declared.
    pub path: &'static str,

    /// Line of the declaration.
    pub line: u32,

    /// Column of the declaration.
    pub column: u32,
}

impl Location {
    /// Creates a new [`Location`].
    #[must_use]
    pub const fn new(path: &'static str, line: u32, column: u32) -> Self {
        Self { path, line, column }
    }

    /// Returns the [`Location`] of the caller of the surrounding
    /// `#[track_caller]` function.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        panic::Location::caller().into()
    }

    /// Returns the file name part of the [`Location::path`].
    #[must_use]
    pub fn filename(&self) -> &'static str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path)
    }
}

impl From<&'static panic::Location<'static>> for Location {
    fn from(loc: &'static panic::Location<'static>) -> Self {
        Self::new(loc.file(), loc.line(), loc.column())
    }
}
