// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Turning a [`gherkin::Scenario`] into the concrete runs it stands for.
//!
//! A plain scenario is a single run. A [Scenario Outline][1] is one run per
//! row of its [Examples][2], with `<column>` placeholders filled in.
//!
//! [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
//! [2]: https://cucumber.io/docs/gherkin/reference#examples

use std::path::{Path, PathBuf};

use derive_more::with_trait::{Display, Error};
use lazy_regex::regex;

use crate::step::Step;

/// Single concrete run of a [`gherkin::Scenario`].
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    /// Name, placeholders filled in.
    pub name: String,

    /// Tags of the scenario followed by the ones of the examples block.
    pub tags: Vec<String>,

    /// Steps of the scenario only, backgrounds aren't included.
    pub steps: Vec<Step>,

    /// Line of the scenario, or of the examples row it was filled from.
    pub line: usize,
}

/// Error of a placeholder naming no column of its examples table.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display(
    "Examples have no `{placeholder}` column, referenced at {}:{line}",
    path.as_deref().map_or_else(|| "<text>".into(), Path::to_string_lossy),
)]
pub struct ExpandExamplesError {
    /// Placeholder name, without the angle brackets.
    pub placeholder: String,

    /// Line of the step or scenario referencing it.
    pub line: usize,

    /// `.feature` file, if any.
    pub path: Option<PathBuf>,
}

/// Row of an examples table, bound to its header.
struct Row<'t> {
    header: &'t [String],
    values: &'t [String],
}

impl Row<'_> {
    /// Fills every `<column>` placeholder in the `text`.
    fn fill(
        &self,
        text: &str,
        line: usize,
        path: Option<&Path>,
    ) -> Result<String, ExpandExamplesError> {
        let mut unknown = None;
        let filled = regex!(r"<([^>\s]+)>").replace_all(text, |cap: &regex::Captures<'_>| {
            let name = &cap[1];
            match self.header.iter().position(|h| h == name) {
                Some(i) => self.values.get(i).map_or("", String::as_str),
                None => {
                    _ = unknown.get_or_insert_with(|| name.to_owned());
                    ""
                }
            }
        });
        match unknown {
            Some(placeholder) => Err(ExpandExamplesError {
                placeholder,
                line,
                path: path.map(Path::to_path_buf),
            }),
            None => Ok(filled.into_owned()),
        }
    }

    /// Fills the [`Step`] text and its attachments.
    fn fill_step(
        &self,
        mut step: Step,
        path: Option<&Path>,
    ) -> Result<Step, ExpandExamplesError> {
        let line = step.line.unwrap_or_default();
        step.text = self.fill(&step.text, line, path)?;
        if let Some(doc) = &mut step.docstring {
            *doc = self.fill(doc, line, path)?;
        }
        for cell in step.table.iter_mut().flatten().flatten() {
            *cell = self.fill(cell, line, path)?;
        }
        Ok(step)
    }
}

/// Lists the concrete [`Run`]s of the given `scenario`.
///
/// An examples block without a table, or with a header only, yields nothing.
///
/// # Errors
///
/// If a placeholder names no column of its examples table.
pub fn expand(
    scenario: &gherkin::Scenario,
    path: Option<&Path>,
) -> Result<Vec<Run>, ExpandExamplesError> {
    let steps = || scenario.steps.iter().map(Step::from);

    if scenario.examples.is_empty() {
        return Ok(vec![Run {
            name: scenario.name.clone(),
            tags: scenario.tags.clone(),
            steps: steps().collect(),
            line: scenario.position.line,
        }]);
    }

    let mut runs = Vec::new();
    for examples in &scenario.examples {
        let Some(table) = &examples.table else {
            continue;
        };
        let Some((header, rows)) = table.rows.split_first() else {
            continue;
        };

        for (i, values) in rows.iter().enumerate() {
            let row = Row { header, values };
            let line = table.position.line + i + 1;
            runs.push(Run {
                name: row.fill(&scenario.name, scenario.position.line, path)?,
                tags: scenario.tags.iter().chain(&examples.tags).cloned().collect(),
                steps: steps()
                    .map(|s| row.fill_step(s, path))
                    .collect::<Result<_, _>>()?,
                line,
            });
        }
    }
    Ok(runs)
}
