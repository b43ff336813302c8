// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step definitions.

use std::{fmt, time::Duration};

use futures::future::LocalBoxFuture;

use crate::{
    detect::Module,
    error::HandlerError,
    ide::StepMetadata,
    pattern::{PatternError, StepPattern},
};

use super::{Context, Keyword, Location};

/// Step handler: an async [`fn`] receiving the scenario's `World` and the
/// matched [`Context`].
pub type Handler<World> =
    for<'a> fn(&'a mut World, Context) -> LocalBoxFuture<'a, Result<(), HandlerError>>;

/// Compiled step definition, owned by a [`Registry`].
///
/// Never mutated once registered.
///
/// [`Registry`]: super::Registry
pub struct Definition<World> {
    /// Compiled template.
    pattern: StepPattern,

    /// Keyword the step was declared with. Has no effect on matching.
    keyword: Keyword,

    /// Function to invoke.
    handler: Handler<World>,

    /// Time bound overriding the global default.
    timeout: Option<Duration>,

    /// Declaration site.
    location: Option<Location>,

    /// Module this step belongs to, for selective loading.
    module: Option<Module>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<World> Clone for Definition<World> {
    fn clone(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            keyword: self.keyword,
            handler: self.handler,
            timeout: self.timeout,
            location: self.location,
            module: self.module,
        }
    }
}

impl<World> fmt::Debug for Definition<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("pattern", &self.pattern.template())
            .field("keyword", &self.keyword)
            .field("handler", &format_args!("{:p}", self.handler as *const ()))
            .field("timeout", &self.timeout)
            .field("location", &self.location)
            .field("module", &self.module)
            .finish()
    }
}

impl<World> Definition<World> {
    /// Compiles the `template` into a new [`Definition`], recording the
    /// caller as its [`Location`].
    ///
    /// # Errors
    ///
    /// If the `template` cannot be compiled.
    #[track_caller]
    pub fn new(
        keyword: Keyword,
        template: &str,
        handler: Handler<World>,
    ) -> Result<Self, PatternError> {
        let location = Location::caller();
        Ok(Self {
            pattern: StepPattern::compile(template)?,
            keyword,
            handler,
            timeout: None,
            location: Some(location),
            module: None,
        })
    }

    /// Sets the time bound of this step, overriding the global default.
    ///
    /// Must be positive, which is checked on registration.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Scopes this step to the given [`Module`].
    #[must_use]
    pub const fn with_module(mut self, module: Module) -> Self {
        self.module = Some(module);
        self
    }

    /// Overrides the recorded [`Location`].
    #[must_use]
    pub const fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Compiled [`StepPattern`].
    #[must_use]
    pub const fn pattern(&self) -> &StepPattern {
        &self.pattern
    }

    /// [`Keyword`] this step was declared with.
    #[must_use]
    pub const fn keyword(&self) -> Keyword {
        self.keyword
    }

    /// [`Handler`] of this step.
    #[must_use]
    pub const fn handler(&self) -> Handler<World> {
        self.handler
    }

    /// Time bound override, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Declaration site, if known.
    #[must_use]
    pub const fn location(&self) -> Option<Location> {
        self.location
    }

    /// [`Module`] scope, if any.
    #[must_use]
    pub const fn module(&self) -> Option<Module> {
        self.module
    }

    /// Describes this [`Definition`] for diagnostics and IDE integration.
    #[must_use]
    pub fn metadata(&self) -> StepMetadata {
        StepMetadata {
            template: self.pattern.template().to_owned(),
            keyword: self.keyword,
            location: self.location,
            module: self.module,
            timeout: self.timeout,
        }
    }
}
