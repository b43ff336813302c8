// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Curated step vocabulary hinting at the [`Module`]s a step exercises.
//!
//! [`Module`]: super::Module

use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;

use super::ModuleRequirement;

/// Navigation, interaction and visibility vocabulary.
static UI: Lazy<Regex> = lazy_regex!(
    r"(?i)\b(?:navigate[sd]?\s+to|go(?:es)?\s+to\s+the\s+.*page|opens?\s+the\s+.*page|visit(?:s|ed)?|(?:double[- ]|right[- ])?click(?:s|ed)?|tap(?:s|ped)?|type[sd]?\s+.*\s+into|enter(?:s|ed)?\s+.*\s+into|fill(?:s|ed)?\s+in|select(?:s|ed)?\s+.*\s+from\s+the\s+.*(?:dropdown|list|menu)|hover(?:s|ed)?|scroll(?:s|ed)?|press(?:es|ed)?|drag(?:s|ged)?|upload(?:s|ed)?|visible|displayed|hidden|page|browser|button|link|checkbox|dropdown|element|screenshot)\b"
);

/// HTTP vocabulary.
static API: Lazy<Regex> = lazy_regex!(
    r"(?i)\b(?:api|endpoint|requests?|responses?|status\s+code|headers?|payload|json|rest|https?|bearer|graphql)\b"
);

/// HTTP verbs, case-sensitive so that "get" in prose doesn't count.
static HTTP_VERB: Lazy<Regex> =
    lazy_regex!(r"\b(?:GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)\b");

/// Query and SQL vocabulary.
static DATABASE: Lazy<Regex> = lazy_regex!(
    r"(?i)\b(?:database|db|quer(?:y|ies)|sql|records?|insert(?:s|ed)?\s+into|delete[sd]?\s+from|update[sd]?\s+.*\s+set|select\s+.*\s+from|stored\s+procedure|transaction|commit|rollback|schema)\b"
);

/// SOAP vocabulary.
static SOAP: Lazy<Regex> = lazy_regex!(
    r"(?i)\b(?:soap|wsdl|envelope|soap\s*action|xml\s+(?:request|response)|web\s*service)\b"
);

/// Returns the [`ModuleRequirement`] signaled by a single step text.
///
/// A step may signal several modules at once.
#[must_use]
pub fn signals(text: &str) -> ModuleRequirement {
    ModuleRequirement {
        ui: is_ui(text),
        api: API.is_match(text) || HTTP_VERB.is_match(text),
        database: DATABASE.is_match(text),
        soap: SOAP.is_match(text),
    }
}

/// Indicates whether the step text uses UI vocabulary.
#[must_use]
pub fn is_ui(text: &str) -> bool {
    UI.is_match(text)
}
