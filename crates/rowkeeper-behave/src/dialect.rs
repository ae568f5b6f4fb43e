//! SQL dialects the trigger compiler can target.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Database flavor a set of trigger bodies is written for.
///
/// MySQL bodies assign `NEW` columns from `BEFORE` triggers and loop with
/// `WHILE`. SQLite cannot do either, so its bodies validate in `BEFORE`
/// triggers with `RAISE(ABORT, ...)` and perform assignments as follow-up
/// `UPDATE`s from `AFTER` triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// SQLite 3.38+ (JSON functions built in).
    #[default]
    Sqlite,
    /// MySQL 5.7+ / MariaDB with JSON support.
    MySql,
}

impl Dialect {
    /// Returns the dialect name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
