//! Behavior manifests for the `triggers` command.
//!
//! A manifest lists entities with their behaviors and, for stateful ones,
//! their state machine:
//!
//! ```json
//! {
//!   "entities": [
//!     {
//!       "table": "article",
//!       "behaviors": ["uid10", "stateful", "seo"],
//!       "seo": { "url_column": "title", "url_prefix": "/blog" },
//!       "state_machine": {
//!         "states": ["draft", "live"],
//!         "entry_states": ["draft"],
//!         "default_state": "draft",
//!         "transitions": [{ "from": "draft", "to": "live" }]
//!       }
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use rowkeeper_behave::prelude::*;
use serde::Deserialize;

use crate::error::Result;

/// A set of entities to compile triggers for.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Entities, compiled in order.
    #[serde(default)]
    pub entities: Vec<EntityManifest>,
}

/// One entity of a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityManifest {
    /// Table and SEO settings.
    #[serde(flatten)]
    pub entity: Entity,
    /// Attached behaviors, in declaration order.
    #[serde(default)]
    pub behaviors: Vec<BehaviorKind>,
    /// State machine of a stateful entity.
    #[serde(default)]
    pub state_machine: Option<StateMachineDefinition>,
}

impl EntityManifest {
    /// Returns the state machine bound to this entity's table.
    #[must_use]
    pub fn definition(&self) -> Option<StateMachineDefinition> {
        self.state_machine.clone().map(|mut def| {
            if def.entity.is_empty() {
                def.entity.clone_from(&self.entity.table);
            }
            def
        })
    }
}

impl Manifest {
    /// Parses a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Introspector for compiling without a live database of the target
/// dialect. Every column is reported missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedIntrospector;

impl ModelIntrospector for DetachedIntrospector {
    async fn column(
        &self,
        _table: &str,
        _column: &str,
    ) -> std::result::Result<Option<ColumnInfo>, SchemaIntrospectionError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "entities": [
            {
                "table": "article",
                "behaviors": ["uid10", "stateful", "seo"],
                "seo": { "url_column": "title", "url_prefix": "/blog" },
                "state_machine": {
                    "states": ["draft", "live"],
                    "entry_states": ["draft"],
                    "default_state": "draft",
                    "transitions": [{ "from": "draft", "to": "live" }]
                }
            },
            { "table": "tag", "behaviors": ["soft_delete"] }
        ]
    }"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        assert_eq!(manifest.entities.len(), 2);

        let article = &manifest.entities[0];
        assert_eq!(article.entity.table, "article");
        assert_eq!(article.entity.seo.url_column, "title");
        assert_eq!(
            article.behaviors,
            vec![BehaviorKind::Uid10, BehaviorKind::Stateful, BehaviorKind::Seo]
        );

        let def = article.definition().unwrap();
        assert_eq!(def.entity, "article");
        assert!(def.accepts_transition("draft", "live"));
        def.validate().unwrap();

        let tag = &manifest.entities[1];
        assert_eq!(tag.entity.seo.url_column, "name");
        assert!(tag.definition().is_none());
    }

    #[test]
    fn test_unknown_behavior_is_rejected() {
        let result = Manifest::from_json(r#"{"entities": [{"table": "a", "behaviors": ["audit"]}]}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_detached_introspector_keeps_timed() {
        let store = TemplateStore::new(Dialect::MySql);
        let statements = TriggerCompiler::new(&store)
            .compile(&Entity::new("post"), &[BehaviorKind::Timed], &DetachedIntrospector)
            .await
            .unwrap();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("ALTER TABLE post MODIFY COLUMN updated_at"));
    }
}
