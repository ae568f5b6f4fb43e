//! Declarative entity behaviors compiled into database triggers.
//!
//! `rowkeeper-behave` turns per-table behaviors into trigger bodies so the
//! database itself enforces them on every write, whatever client performs
//! it:
//!
//! - **Uid10 / Uid8** - random unique `uid` on insert
//! - **SoftDelete** - `DELETE` is refused, `deleted_at` follows `deleted`
//! - **Stateful** - `machine_state` obeys a finite state machine and every
//!   change is queued in `state_machine_queue`
//! - **Timed** - `updated_at` refreshes itself on update
//! - **Seo** - unique `url` derived from a source column, with history
//!
//! # Architecture
//!
//! - **Templates** - immutable registry of static trigger bodies per dialect
//! - **Resolver** - generates bodies for behaviors that depend on the
//!   current schema, through a [`ModelIntrospector`](introspect::ModelIntrospector)
//! - **Compiler** - resolves an entity's behaviors in order and substitutes
//!   the table name
//! - **State machine** - definitions, violation classification, queue
//!
//! # Example
//!
//! ```rust,ignore
//! use rowkeeper_behave::prelude::*;
//!
//! let store = TemplateStore::new(Dialect::Sqlite);
//! let compiler = TriggerCompiler::new(&store);
//! let introspector = SqliteIntrospector::new(pool.clone());
//!
//! let entity = Entity::new("article").url_column("title").url_prefix("/blog");
//! let statements = compiler
//!     .compile(&entity, &[BehaviorKind::Stateful, BehaviorKind::Seo], &introspector)
//!     .await?;
//! apply(&pool, &entity.table, &statements).await?;
//! ```

pub mod behavior;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod introspect;
pub mod resolver;
pub mod state_machine;
pub mod templates;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::behavior::{BehaviorKind, Entity, Resolver, SeoSettings, TABLE_PLACEHOLDER};
    pub use crate::compiler::{TriggerCompiler, apply};
    pub use crate::dialect::Dialect;
    pub use crate::error::{BehaveError, Result, SchemaIntrospectionError};
    pub use crate::introspect::{ColumnInfo, ModelIntrospector, SqliteIntrospector};
    pub use crate::state_machine::{
        StateMachineDefinition, StateMachineViolation, StateTransition, Transition,
        ViolationReason, load_definition, save_definition, schema_sql, transitions_for,
    };
    pub use crate::templates::TemplateStore;
}
