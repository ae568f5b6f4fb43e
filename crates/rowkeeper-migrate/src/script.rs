//! Migration script splitting.
//!
//! A migration file can hold several statements separated by a line of six
//! dashes. Each chunk is executed and recorded on its own.

/// Separator between statements of one migration file.
pub const STATEMENT_SEPARATOR: &str = "------";

/// Keyword that requires operator confirmation before execution.
pub const RESTRICTED_KEYWORD: &str = "delete";

/// One executable chunk of a migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Position of the chunk in the file, counting blank chunks.
    pub index: usize,
    /// SQL text, as written in the file.
    pub sql: String,
}

impl Statement {
    /// Returns whether the statement mentions the restricted keyword, in
    /// any case.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        self.sql.to_lowercase().contains(RESTRICTED_KEYWORD)
    }
}

/// Splits file content into statements, dropping whitespace-only chunks.
#[must_use]
pub fn split(content: &str) -> Vec<Statement> {
    content
        .split(STATEMENT_SEPARATOR)
        .enumerate()
        .filter(|(_, chunk)| !chunk.trim().is_empty())
        .map(|(index, chunk)| Statement {
            index,
            sql: chunk.to_string(),
        })
        .collect()
}
