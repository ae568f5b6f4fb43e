//! Trigger templates per behavior.
//!
//! Static behaviors map to a fixed list of bodies held in a
//! [`TemplateStore`]. Generated behaviors have their body builders here
//! too, one module per dialect, and are called by the resolver once the
//! entity has been inspected.

pub(crate) mod mysql;
pub(crate) mod sqlite;

use std::collections::HashMap;

use crate::behavior::BehaviorKind;
use crate::dialect::Dialect;
use crate::state_machine::triggers;

/// Immutable registry of static trigger templates for one dialect.
///
/// Build one at startup and pass it by reference to the compiler.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dialect: Dialect,
    templates: HashMap<BehaviorKind, &'static [&'static str]>,
}

impl TemplateStore {
    /// Creates the registry for a dialect.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        let mut templates: HashMap<BehaviorKind, &'static [&'static str]> = HashMap::new();
        match dialect {
            Dialect::Sqlite => {
                templates.insert(BehaviorKind::Uid10, &sqlite::UID10);
                templates.insert(BehaviorKind::Uid8, &sqlite::UID8);
                templates.insert(BehaviorKind::SoftDelete, &sqlite::SOFT_DELETE);
                templates.insert(BehaviorKind::Stateful, &triggers::SQLITE);
            }
            Dialect::MySql => {
                templates.insert(BehaviorKind::Uid10, &mysql::UID10);
                templates.insert(BehaviorKind::Uid8, &mysql::UID8);
                templates.insert(BehaviorKind::SoftDelete, &mysql::SOFT_DELETE);
                templates.insert(BehaviorKind::Stateful, &triggers::MYSQL);
            }
        }
        Self { dialect, templates }
    }

    /// Returns the dialect the templates are written in.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the templates registered for a behavior.
    ///
    /// Behaviors without a registered template (including generated ones)
    /// yield an empty slice.
    #[must_use]
    pub fn lookup(&self, kind: BehaviorKind) -> &'static [&'static str] {
        self.templates.get(&kind).copied().unwrap_or(&[])
    }
}

/// Quotes a string for use inside a single-quoted SQL literal.
pub(crate) fn sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}
