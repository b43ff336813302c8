// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step keywords.
//!
//! Keywords are documentation only: a phrase registered with [`Keyword::Given`]
//! matches a `When` step just as well.

use std::str::FromStr;

use derive_more::with_trait::{Display, Error};

/// Keyword a step was declared or written with.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
pub enum Keyword {
    /// [Given](https://cucumber.io/docs/gherkin/reference#given).
    Given,

    /// [When](https://cucumber.io/docs/gherkin/reference#when).
    When,

    /// [Then](https://cucumber.io/docs/gherkin/reference#then).
    Then,

    /// [And](https://cucumber.io/docs/gherkin/reference#and-but).
    And,

    /// [But](https://cucumber.io/docs/gherkin/reference#and-but).
    But,

    /// Keyword-agnostic declaration (`Step`, `*`).
    #[display("*")]
    Generic,
}

/// Error of parsing an unknown [`Keyword`].
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("unknown step keyword `{_0}`")]
pub struct UnknownKeyword(#[error(not(source))] pub String);

impl FromStr for Keyword {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "given" => Ok(Self::Given),
            "when" => Ok(Self::When),
            "then" => Ok(Self::Then),
            "and" => Ok(Self::And),
            "but" => Ok(Self::But),
            "step" | "*" => Ok(Self::Generic),
            _ => Err(UnknownKeyword(s.to_owned())),
        }
    }
}

impl From<gherkin::StepType> for Keyword {
    fn from(ty: gherkin::StepType) -> Self {
        match ty {
            gherkin::StepType::Given => Self::Given,
            gherkin::StepType::When => Self::When,
            gherkin::StepType::Then => Self::Then,
        }
    }
}

impl Keyword {
    /// Resolves the [`Keyword`] of a parsed [`gherkin::Step`].
    ///
    /// `And`/`But`/`*` are kept as written; keywords of other languages fall
    /// back to the [`gherkin::StepType`] the parser assigned.
    #[must_use]
    pub fn of(step: &gherkin::Step) -> Self {
        step.keyword.parse().unwrap_or_else(|_| step.ty.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("Given".parse(), Ok(Keyword::Given));
        assert_eq!("  when ".parse(), Ok(Keyword::When));
        assert_eq!("AND".parse(), Ok(Keyword::And));
        assert_eq!("Step".parse(), Ok(Keyword::Generic));
        assert_eq!("*".parse(), Ok(Keyword::Generic));
        assert!("Angenommen".parse::<Keyword>().is_err());
    }

    #[test]
    fn displays_as_written() {
        assert_eq!(Keyword::Then.to_string(), "Then");
        assert_eq!(Keyword::Generic.to_string(), "*");
    }

    #[test]
    fn maps_step_types() {
        assert_eq!(Keyword::from(gherkin::StepType::When), Keyword::When);
    }
}
