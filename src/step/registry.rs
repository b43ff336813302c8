// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Registry of step definitions.

use std::{fmt, sync::Arc};

use itertools::Itertools as _;
use tracing::debug;

use crate::{
    detect::ModuleRequirement,
    error::{
        AmbiguousStepError, RegistrationError, StepError, UndefinedStepError,
    },
    ide::{MetadataSink, NoopSink},
    pattern::TypedValue,
};

use super::{Definition, Handler, Keyword};

/// [`Definition`] resolved for a concrete step text, along with the values
/// its placeholders extracted.
#[derive(Debug)]
pub struct Resolved<'r, World> {
    /// Matched [`Definition`].
    pub definition: &'r Definition<World>,

    /// Extracted placeholder values.
    pub args: Vec<TypedValue>,
}

/// Collection of step [`Definition`]s.
///
/// Built once at startup by calling [`Registry::register()`] for every step
/// source, read-only afterwards. Keywords never take part in matching, so
/// registering the same phrase under `Given` and `When` is a conflict.
pub struct Registry<World> {
    /// Registered definitions, in registration order.
    definitions: Vec<Definition<World>>,

    /// Receiver of registration metadata.
    sink: Arc<dyn MetadataSink>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<World> Clone for Registry<World> {
    fn clone(&self) -> Self {
        Self {
            definitions: self.definitions.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

// Implemented manually to omit redundant `World: Default` trait bound, imposed
// by `#[derive(Default)]`.
impl<World> Default for Registry<World> {
    fn default() -> Self {
        Self {
            definitions: Vec::new(),
            sink: Arc::new(NoopSink),
        }
    }
}

impl<World> fmt::Debug for Registry<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("definitions", &self.definitions)
            .finish_non_exhaustive()
    }
}

impl<World> Registry<World> {
    /// Creates a new empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty [`Registry`] reporting registrations to the given
    /// [`MetadataSink`].
    #[must_use]
    pub fn with_sink(sink: impl MetadataSink + 'static) -> Self {
        Self {
            definitions: Vec::new(),
            sink: Arc::new(sink),
        }
    }

    /// Registers the given [`Definition`].
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::Ambiguous`] if the new pattern may match a text
    ///   some already registered pattern matches, naming both definitions.
    /// - [`RegistrationError::ZeroTimeout`] if the timeout override is zero.
    pub fn register(
        &mut self,
        definition: Definition<World>,
    ) -> Result<(), RegistrationError> {
        if definition.timeout().is_some_and(|t| t.is_zero()) {
            return Err(RegistrationError::ZeroTimeout {
                template: definition.pattern().template().to_owned(),
            });
        }

        let conflicts = self
            .definitions
            .iter()
            .filter(|d| d.pattern().overlaps(definition.pattern()))
            .map(Definition::metadata)
            .collect::<Vec<_>>();
        if !conflicts.is_empty() {
            return Err(AmbiguousStepError {
                text: None,
                definitions: std::iter::once(definition.metadata())
                    .chain(conflicts)
                    .collect(),
            }
            .into());
        }

        let metadata = definition.metadata();
        debug!(
            template = %metadata.template,
            keyword = %metadata.keyword,
            location = ?metadata.location,
            "step registered",
        );
        self.sink.step_registered(&metadata);
        self.definitions.push(definition);
        Ok(())
    }

    /// Compiles and registers a step with the given [`Keyword`].
    ///
    /// # Errors
    ///
    /// See [`Registry::register()`]. Additionally errors if the `template`
    /// cannot be compiled.
    #[track_caller]
    pub fn keyword(
        &mut self,
        keyword: Keyword,
        template: &str,
        handler: Handler<World>,
    ) -> Result<&mut Self, RegistrationError> {
        self.register(Definition::new(keyword, template, handler)?)?;
        Ok(self)
    }

    /// Registers a [Given] step.
    ///
    /// # Errors
    ///
    /// See [`Registry::keyword()`].
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[track_caller]
    pub fn given(
        &mut self,
        template: &str,
        handler: Handler<World>,
    ) -> Result<&mut Self, RegistrationError> {
        self.keyword(Keyword::Given, template, handler)
    }

    /// Registers a [When] step.
    ///
    /// # Errors
    ///
    /// See [`Registry::keyword()`].
    ///
    /// [When]: https://cucumber.io/docs/gherkin/reference#when
    #[track_caller]
    pub fn when(
        &mut self,
        template: &str,
        handler: Handler<World>,
    ) -> Result<&mut Self, RegistrationError> {
        self.keyword(Keyword::When, template, handler)
    }

    /// Registers a [Then] step.
    ///
    /// # Errors
    ///
    /// See [`Registry::keyword()`].
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    #[track_caller]
    pub fn then(
        &mut self,
        template: &str,
        handler: Handler<World>,
    ) -> Result<&mut Self, RegistrationError> {
        self.keyword(Keyword::Then, template, handler)
    }

    /// Registers an `And` step.
    ///
    /// # Errors
    ///
    /// See [`Registry::keyword()`].
    #[track_caller]
    pub fn and(
        &mut self,
        template: &str,
        handler: Handler<World>,
    ) -> Result<&mut Self, RegistrationError> {
        self.keyword(Keyword::And, template, handler)
    }

    /// Registers a `But` step.
    ///
    /// # Errors
    ///
    /// See [`Registry::keyword()`].
    #[track_caller]
    pub fn but(
        &mut self,
        template: &str,
        handler: Handler<World>,
    ) -> Result<&mut Self, RegistrationError> {
        self.keyword(Keyword::But, template, handler)
    }

    /// Registers a keyword-agnostic step.
    ///
    /// # Errors
    ///
    /// See [`Registry::keyword()`].
    #[track_caller]
    pub fn step(
        &mut self,
        template: &str,
        handler: Handler<World>,
    ) -> Result<&mut Self, RegistrationError> {
        self.keyword(Keyword::Generic, template, handler)
    }

    /// Resolves the given step `text` to its [`Definition`].
    ///
    /// # Errors
    ///
    /// - [`StepError::Undefined`] if nothing matches.
    /// - [`StepError::Ambiguous`] if several definitions match, which means
    ///   registration-time checking let an overlap through.
    pub fn resolve(
        &self,
        text: &str,
    ) -> Result<Resolved<'_, World>, StepError> {
        let mut matched = self
            .definitions
            .iter()
            .filter_map(|d| d.pattern().matches(text).map(|args| (d, args)))
            .collect::<Vec<_>>();

        match matched.len() {
            0 => Err(UndefinedStepError {
                text: text.to_owned(),
            }
            .into()),
            1 => {
                let (definition, args) =
                    matched.pop().unwrap_or_else(|| unreachable!());
                Ok(Resolved { definition, args })
            }
            _ => Err(AmbiguousStepError {
                text: Some(text.to_owned()),
                definitions: matched
                    .into_iter()
                    .map(|(d, _)| d.metadata())
                    .sorted_by(|a, b| a.template.cmp(&b.template))
                    .collect(),
            }
            .into()),
        }
    }

    /// Returns a snapshot containing only the unscoped definitions and the
    /// ones scoped to a module the given [`ModuleRequirement`] includes.
    #[must_use]
    pub fn select(&self, requirement: &ModuleRequirement) -> Self {
        Self {
            definitions: self
                .definitions
                .iter()
                .filter(|d| d.module().map_or(true, |m| requirement.requires(m)))
                .cloned()
                .collect(),
            sink: Arc::clone(&self.sink),
        }
    }

    /// Iterates over the registered [`Definition`]s.
    pub fn iter(&self) -> impl Iterator<Item = &Definition<World>> + '_ {
        self.definitions.iter()
    }

    /// Number of registered [`Definition`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Indicates whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
