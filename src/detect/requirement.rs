// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runtime modules and sets of them.

use std::{fmt, str::FromStr};

use derive_more::with_trait::{Display, Error};

/// Runtime subsystem a scenario may need initialized.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
#[cfg_attr(feature = "output-json", serde(rename_all = "snake_case"))]
pub enum Module {
    /// Browser automation.
    #[display("ui")]
    Ui,

    /// HTTP/REST clients.
    #[display("api")]
    Api,

    /// Database connections.
    #[display("database")]
    Database,

    /// SOAP clients.
    #[display("soap")]
    Soap,
}

impl Module {
    /// All [`Module`]s.
    pub const ALL: [Self; 4] = [Self::Ui, Self::Api, Self::Database, Self::Soap];

    /// Resolves a scenario tag (case-insensitive, with or without the leading
    /// `@`) to the [`Module`] it requests, if any.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().trim_start_matches('@').to_ascii_lowercase().as_str() {
            "api" | "rest" | "http" => Some(Self::Api),
            "database" | "db" | "sql" => Some(Self::Database),
            "ui" | "browser" | "web" => Some(Self::Ui),
            "soap" => Some(Self::Soap),
            _ => None,
        }
    }
}

/// Error of parsing an unknown [`Module`] name.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("unknown module `{_0}`, expected one of `ui`, `api`, `database`, `soap`")]
pub struct UnknownModule(#[error(not(source))] pub String);

impl FromStr for Module {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownModule(s.to_owned()))
    }
}

/// Set of [`Module`]s a scenario requires.
///
/// Derived per scenario, never mutated by anyone but the detector computing
/// it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "output-json", derive(serde::Serialize))]
pub struct ModuleRequirement {
    /// Browser automation is required.
    pub ui: bool,

    /// HTTP/REST clients are required.
    pub api: bool,

    /// Database connections are required.
    pub database: bool,

    /// SOAP clients are required.
    pub soap: bool,
}

impl ModuleRequirement {
    /// Requires nothing.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            ui: false,
            api: false,
            database: false,
            soap: false,
        }
    }

    /// Requires every [`Module`].
    #[must_use]
    pub const fn all() -> Self {
        Self {
            ui: true,
            api: true,
            database: true,
            soap: true,
        }
    }

    /// Requires only the given [`Module`].
    #[must_use]
    pub const fn only(module: Module) -> Self {
        Self::none().with(module)
    }

    /// Returns a copy with the given [`Module`] required as well.
    #[must_use]
    pub const fn with(mut self, module: Module) -> Self {
        match module {
            Module::Ui => self.ui = true,
            Module::Api => self.api = true,
            Module::Database => self.database = true,
            Module::Soap => self.soap = true,
        }
        self
    }

    /// Union of both sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            ui: self.ui || other.ui,
            api: self.api || other.api,
            database: self.database || other.database,
            soap: self.soap || other.soap,
        }
    }

    /// Indicates whether the given [`Module`] is required.
    #[must_use]
    pub const fn requires(&self, module: Module) -> bool {
        match module {
            Module::Ui => self.ui,
            Module::Api => self.api,
            Module::Database => self.database,
            Module::Soap => self.soap,
        }
    }

    /// Indicates whether nothing is required.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.ui || self.api || self.database || self.soap)
    }

    /// Iterates over the required [`Module`]s.
    pub fn modules(&self) -> impl Iterator<Item = Module> + '_ {
        Module::ALL.into_iter().filter(|m| self.requires(*m))
    }
}

impl FromIterator<Module> for ModuleRequirement {
    fn from_iter<I: IntoIterator<Item = Module>>(iter: I) -> Self {
        iter.into_iter().fold(Self::none(), Self::with)
    }
}

impl Display for ModuleRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, m) in self.modules().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{m}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_map_case_insensitively() {
        assert_eq!(Module::from_tag("@API"), Some(Module::Api));
        assert_eq!(Module::from_tag("rest"), Some(Module::Api));
        assert_eq!(Module::from_tag("@Http"), Some(Module::Api));
        assert_eq!(Module::from_tag("@db"), Some(Module::Database));
        assert_eq!(Module::from_tag("SQL"), Some(Module::Database));
        assert_eq!(Module::from_tag("@web"), Some(Module::Ui));
        assert_eq!(Module::from_tag("browser"), Some(Module::Ui));
        assert_eq!(Module::from_tag("@soap"), Some(Module::Soap));
        assert_eq!(Module::from_tag("@smoke"), None);
    }

    #[test]
    fn set_operations() {
        let req = ModuleRequirement::only(Module::Api).with(Module::Soap);
        assert!(req.requires(Module::Api));
        assert!(req.requires(Module::Soap));
        assert!(!req.requires(Module::Ui));
        assert_eq!(req.modules().collect::<Vec<_>>(), [Module::Api, Module::Soap]);

        let union = req.union(ModuleRequirement::only(Module::Ui));
        assert_eq!(union.modules().count(), 3);
        assert!(ModuleRequirement::none().is_empty());
        assert!(!ModuleRequirement::all().is_empty());
        assert_eq!(ModuleRequirement::default(), ModuleRequirement::none());
    }

    #[test]
    fn collects_from_modules() {
        let req = [Module::Database, Module::Database, Module::Ui]
            .into_iter()
            .collect::<ModuleRequirement>();
        assert_eq!(
            req,
            ModuleRequirement {
                ui: true,
                database: true,
                ..ModuleRequirement::none()
            },
        );
    }

    #[test]
    fn displays_required_modules() {
        assert_eq!(ModuleRequirement::none().to_string(), "none");
        assert_eq!(ModuleRequirement::all().to_string(), "ui, api, database, soap");
    }
}
