// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Input of a step handler invocation.

use crate::{heal::Locator, pattern::TypedValue};

use super::Keyword;

/// Single step of a scenario, as written in a `.feature` file.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Keyword the step was written with.
    pub keyword: Keyword,

    /// Step text, without the keyword.
    pub text: String,

    /// Attached doc string, if any.
    pub docstring: Option<String>,

    /// Attached data table rows, if any.
    pub table: Option<Vec<Vec<String>>>,

    /// Line in the `.feature` file, if known.
    pub line: Option<usize>,
}

impl Step {
    /// Creates a new [`Step`] without attachments.
    #[must_use]
    pub fn new(keyword: Keyword, text: impl Into<String>) -> Self {
        Self {
            keyword,
            text: text.into(),
            docstring: None,
            table: None,
            line: None,
        }
    }
}

impl From<&gherkin::Step> for Step {
    fn from(step: &gherkin::Step) -> Self {
        Self {
            keyword: Keyword::of(step),
            text: step.value.clone(),
            docstring: step.docstring.clone(),
            table: step.table.as_ref().map(|t| t.rows.clone()),
            line: Some(step.position.line),
        }
    }
}

/// Context a step handler is invoked with.
#[derive(Clone, Debug)]
pub struct Context {
    /// [`Step`] being executed.
    pub step: Step,

    /// Values extracted by the placeholders of the matched definition.
    pub args: Vec<TypedValue>,

    /// Target substituted by the healing engine, set only when the handler is
    /// re-invoked after a successful healing.
    pub healed: Option<Locator>,
}

impl Context {
    /// Creates a new [`Context`].
    #[must_use]
    pub fn new(step: Step, args: Vec<TypedValue>) -> Self {
        Self {
            step,
            args,
            healed: None,
        }
    }

    /// Returns the [`TypedValue`] at the given position.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&TypedValue> {
        self.args.get(index)
    }

    /// Returns the integer argument at the given position.
    #[must_use]
    pub fn int(&self, index: usize) -> Option<i64> {
        self.arg(index).and_then(TypedValue::as_int)
    }

    /// Returns the numeric argument at the given position.
    #[must_use]
    pub fn float(&self, index: usize) -> Option<f64> {
        self.arg(index).and_then(TypedValue::as_float)
    }

    /// Returns the textual argument at the given position.
    #[must_use]
    pub fn str(&self, index: usize) -> Option<&str> {
        self.arg(index).and_then(TypedValue::as_str)
    }

    /// Returns the healed target if this is a retry, otherwise the `default`
    /// one the handler would normally use.
    #[must_use]
    pub fn target(&self, default: Locator) -> Locator {
        self.healed.clone().unwrap_or(default)
    }

    /// Indicates whether this invocation is the retry after healing.
    #[must_use]
    pub const fn is_retry(&self) -> bool {
        self.healed.is_some()
    }

    /// Indicates whether healing directed this retry to interact with the
    /// target bypassing actionability checks.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.healed.as_ref().is_some_and(|l| l.force)
    }

    /// Returns a copy of this [`Context`] with the `healed` target set.
    #[must_use]
    pub(crate) fn healed_with(&self, target: Locator) -> Self {
        Self {
            healed: Some(target),
            ..self.clone()
        }
    }
}
