//! Behavior markers and the entity descriptor they attach to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder every trigger template carries in place of the table name.
pub const TABLE_PLACEHOLDER: &str = "<<Table>>";

/// A named, reusable data-integrity rule attachable to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    /// Random 10-character `uid` on insert.
    Uid10,
    /// Random 8-character `uid` on insert.
    Uid8,
    /// Rows are flagged with `deleted` instead of being removed.
    SoftDelete,
    /// `machine_state` follows the entity's state machine definition.
    Stateful,
    /// `updated_at` refreshes itself on every update.
    Timed,
    /// Unique, history-keeping `url` derived from a source column.
    Seo,
}

/// How a behavior obtains its trigger bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolver {
    /// A fixed template list from the registry.
    Static,
    /// Bodies generated from the entity's current schema.
    Generated,
}

impl BehaviorKind {
    /// Every behavior kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Uid10,
        Self::Uid8,
        Self::SoftDelete,
        Self::Stateful,
        Self::Timed,
        Self::Seo,
    ];

    /// Returns the behavior name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uid10 => "uid10",
            Self::Uid8 => "uid8",
            Self::SoftDelete => "soft_delete",
            Self::Stateful => "stateful",
            Self::Timed => "timed",
            Self::Seo => "seo",
        }
    }

    /// Returns which resolver produces this behavior's trigger bodies.
    #[must_use]
    pub const fn resolver(self) -> Resolver {
        match self {
            Self::Uid10 | Self::Uid8 | Self::SoftDelete | Self::Stateful => Resolver::Static,
            Self::Timed | Self::Seo => Resolver::Generated,
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an SEO entity derives its URL from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoSettings {
    /// Column whose value is slugified into the URL.
    #[serde(default = "SeoSettings::default_url_column")]
    pub url_column: String,
    /// Path prefix placed before the slug (e.g. `/blog`).
    #[serde(default)]
    pub url_prefix: String,
}

impl SeoSettings {
    fn default_url_column() -> String {
        "name".to_string()
    }
}

impl Default for SeoSettings {
    fn default() -> Self {
        Self {
            url_column: Self::default_url_column(),
            url_prefix: String::new(),
        }
    }
}

/// An entity (table) that behaviors are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Table name substituted for [`TABLE_PLACEHOLDER`].
    pub table: String,
    /// SEO settings, used only when [`BehaviorKind::Seo`] is attached.
    #[serde(default)]
    pub seo: SeoSettings,
}

impl Entity {
    /// Creates an entity descriptor with default SEO settings.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            seo: SeoSettings::default(),
        }
    }

    /// Sets the column the SEO URL is derived from.
    #[must_use]
    pub fn url_column(mut self, column: impl Into<String>) -> Self {
        self.seo.url_column = column.into();
        self
    }

    /// Sets the path prefix of derived SEO URLs.
    #[must_use]
    pub fn url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.seo.url_prefix = prefix.into();
        self
    }
}
