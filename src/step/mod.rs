// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step [`Definition`]s and the [`Registry`] resolving step texts to them.
//!
//! - [`context`]: what a handler receives
//! - [`definition`]: compiled step definitions and the [`Handler`] type
//! - [`keyword`]: cosmetic step keywords
//! - [`location`]: declaration sites
//! - [`registry`]: registration with overlap checking, and resolution

pub mod context;
pub mod definition;
pub mod keyword;
pub mod location;
pub mod registry;

pub use self::{
    context::{Context, Step},
    definition::{Definition, Handler},
    keyword::{Keyword, UnknownKeyword},
    location::Location,
    registry::{Registry, Resolved},
};
