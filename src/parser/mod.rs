// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Loading of [`Scenario`]s from `.feature` files.
//!
//! As there is no async runtime-agnostic way to interact with io, parsing is
//! blocking.

mod outline;

use std::{
    io,
    path::{Path, PathBuf},
};

use derive_more::with_trait::{Display, Error, From};
use tracing::debug;

use crate::{detect::ScenarioDescriptor, step::Step};

pub use self::outline::{expand, ExpandExamplesError, Run};

/// Scenario ready to run: outlines expanded, background steps prepended and
/// tags of every enclosing level merged.
#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    /// Name of the enclosing feature.
    pub feature: String,

    /// Name of the enclosing rule, if any.
    pub rule: Option<String>,

    /// Name of the scenario.
    pub name: String,

    /// Tags of the feature, rule, scenario and examples, in that order,
    /// without duplicates.
    pub tags: Vec<String>,

    /// Steps in execution order.
    pub steps: Vec<Step>,

    /// `.feature` file the scenario comes from, if any.
    pub path: Option<PathBuf>,

    /// Line of the scenario in the `.feature` file.
    pub line: usize,
}

impl Scenario {
    /// Creates a new [`Scenario`] outside of any feature, mostly useful for
    /// tests.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            feature: String::new(),
            rule: None,
            name: name.into(),
            tags: Vec::new(),
            steps,
            path: None,
            line: 0,
        }
    }

    /// Adds the given tag.
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// What module detection looks at.
    #[must_use]
    pub fn descriptor(&self) -> ScenarioDescriptor {
        ScenarioDescriptor::new(&self.tags, self.steps.iter().map(|s| s.text.clone()))
    }
}

/// Error of loading [`Scenario`]s.
#[derive(Debug, Display, Error, From)]
pub enum ParseError {
    /// Feature text is malformed.
    #[display("Failed to parse feature: {_0}")]
    #[from(ignore)]
    Syntax(#[error(not(source))] String),

    /// `.feature` file cannot be read or parsed.
    #[display("{_0}")]
    File(gherkin::ParseFileError),

    /// Directory cannot be walked.
    #[display("Failed to walk features: {_0}")]
    Walk(globwalk::GlobError),

    /// Path cannot be resolved.
    #[display("Failed to resolve features path: {_0}")]
    Io(io::Error),

    /// Outline cannot be expanded.
    #[display("{_0}")]
    ExpandExamples(ExpandExamplesError),
}

/// Parses the [`Scenario`]s of the given feature text.
///
/// # Errors
///
/// If the text is malformed or an outline cannot be expanded.
pub fn parse_str(text: &str) -> Result<Vec<Scenario>, ParseError> {
    let feature = gherkin::Feature::parse(text, gherkin::GherkinEnv::default())
        .map_err(|e| ParseError::Syntax(e.to_string()))?;
    Ok(scenarios(&feature)?)
}

/// Parses the [`Scenario`]s of the `.feature` file at the given `path`, or of
/// every `.feature` file below it, if it's a directory.
///
/// Files are visited in path order.
///
/// # Errors
///
/// If a file cannot be read or parsed, or an outline cannot be expanded.
pub fn parse_path(path: impl AsRef<Path>) -> Result<Vec<Scenario>, ParseError> {
    let path = path.as_ref().canonicalize()?;

    let files = if path.is_file() {
        vec![path]
    } else {
        let mut files = globwalk::GlobWalkerBuilder::new(&path, "*.feature")
            .case_insensitive(true)
            .build()?
            .filter_map(Result::ok)
            .map(|entry| entry.path().to_owned())
            .collect::<Vec<_>>();
        files.sort();
        files
    };

    let mut out = Vec::new();
    for file in files {
        let feature =
            gherkin::Feature::parse_path(&file, gherkin::GherkinEnv::default())?;
        let parsed = scenarios(&feature)?;
        debug!(path = %file.display(), scenarios = parsed.len(), "feature parsed");
        out.extend(parsed);
    }
    Ok(out)
}

/// Flattens the given [`gherkin::Feature`] into runnable [`Scenario`]s, one
/// per [`Run`] of every scenario, rules included.
///
/// # Errors
///
/// If an outline cannot be expanded.
pub fn scenarios(
    feature: &gherkin::Feature,
) -> Result<Vec<Scenario>, ExpandExamplesError> {
    let background = |bg: Option<&gherkin::Background>| {
        bg.map(|b| b.steps.iter().map(Step::from).collect::<Vec<_>>())
            .unwrap_or_default()
    };
    let feature_bg = background(feature.background.as_ref());
    let path = feature.path.as_deref();

    let mut out = Vec::new();
    let mut flatten = |rule: Option<&gherkin::Rule>, s: &gherkin::Scenario| {
        let rule_bg = background(rule.and_then(|r| r.background.as_ref()));
        for run in expand(s, path)? {
            let mut tags = Vec::<String>::new();
            for t in feature
                .tags
                .iter()
                .chain(rule.into_iter().flat_map(|r| &r.tags))
                .chain(&run.tags)
            {
                if !tags.contains(t) {
                    tags.push(t.clone());
                }
            }
            out.push(Scenario {
                feature: feature.name.clone(),
                rule: rule.map(|r| r.name.clone()),
                name: run.name,
                tags,
                steps: feature_bg
                    .iter()
                    .chain(&rule_bg)
                    .cloned()
                    .chain(run.steps)
                    .collect(),
                path: feature.path.clone(),
                line: run.line,
            });
        }
        Ok::<_, ExpandExamplesError>(())
    };

    for s in &feature.scenarios {
        flatten(None, s)?;
    }
    for r in &feature.rules {
        for s in &r.scenarios {
            flatten(Some(r), s)?;
        }
    }
    Ok(out)
}
