// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! JSON serialization of [`ScenarioResult`]s.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::{
    error::{ErrorKind, StepError},
    runner::ScenarioResult,
};

/// Serializes the given [`ScenarioResult`]s as a pretty-printed JSON array.
///
/// # Errors
///
/// If serialization fails.
pub fn to_string(results: &[ScenarioResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}

/// Serializes the given [`ScenarioResult`]s as a JSON value.
///
/// # Errors
///
/// If serialization fails.
pub fn to_value(results: &[ScenarioResult]) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(results)
}

fn as_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Serializes a [`Duration`] as whole milliseconds.
pub(crate) fn millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(as_millis(*d))
}

/// Serializes an optional [`Duration`] as whole milliseconds.
#[allow(clippy::ref_option)] // signature imposed by `serialize_with`
pub(crate) fn millis_opt<S: Serializer>(
    d: &Option<Duration>,
    s: S,
) -> Result<S::Ok, S::Error> {
    d.map(as_millis).serialize(s)
}

/// Serializes a [`StepError`] as its kind and message.
#[allow(clippy::ref_option)] // signature imposed by `serialize_with`
pub(crate) fn step_error<S: Serializer>(
    e: &Option<StepError>,
    s: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Repr {
        kind: ErrorKind,
        message: String,
    }

    e.as_ref()
        .map(|e| Repr {
            kind: e.kind(),
            message: e.to_string(),
        })
        .serialize(s)
}
