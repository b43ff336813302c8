// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`World`] trait definition.

use std::{fmt::Display, future::Future};

use crate::{detect::ModuleRequirement, heal::Browser};

/// Represents a shared user-defined state of a single scenario run.
///
/// A fresh instance is created for every scenario, bootstrapping only the
/// runtime modules the scenario was detected to need. Nothing is shared
/// between scenarios through a [`World`].
pub trait World: Sized + 'static {
    /// Error of creating a new [`World`] instance.
    type Error: Display;

    /// Creates a new [`World`] instance with the given `modules` initialized.
    fn new(
        modules: &ModuleRequirement,
    ) -> impl Future<Output = Result<Self, Self::Error>>;

    /// Returns the [`Browser`] healing acts through, if this [`World`] drives
    /// one.
    ///
    /// Without it failing UI steps are reported as is.
    fn browser(&mut self) -> Option<&mut dyn Browser> {
        None
    }
}
