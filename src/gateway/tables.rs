//! Identifier allow-lists for the dynamic gateway.
//!
//! Table and procedure names arrive from the request body, and SQL
//! parameter binding covers values only, so these identifiers end up in
//! statement text. Admission is therefore double-gated: the name must be a
//! well-formed identifier AND a member of the configured allow-list. Both
//! checks run before any SQL text is formatted and before any connection
//! is acquired.

use std::collections::HashSet;

use super::error::GatewayError;

/// Closed sets of table and procedure identifiers the gateway may touch.
pub struct TableRegistry {
    tables: HashSet<String>,
    procedures: HashSet<String>,
}

impl TableRegistry {
    pub fn from_config(config: &crate::config::GatewayConfig) -> Self {
        Self {
            tables: config.allowed_tables.iter().cloned().collect(),
            procedures: config.allowed_procedures.iter().cloned().collect(),
        }
    }

    #[cfg(test)]
    pub fn with_lists(tables: &[&str], procedures: &[&str]) -> Self {
        Self {
            tables: tables.iter().map(|s| s.to_string()).collect(),
            procedures: procedures.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Admit a caller-supplied table name, returning the canonical
    /// identifier safe to interpolate.
    pub fn resolve_table(&self, name: &str) -> Result<&str, GatewayError> {
        if !is_valid_identifier(name) {
            return Err(GatewayError::InvalidTable(name.to_string()));
        }
        self.tables
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| GatewayError::InvalidTable(name.to_string()))
    }

    /// Admit a stored procedure name.
    pub fn resolve_procedure(&self, name: &str) -> Result<&str, GatewayError> {
        if !is_valid_identifier(name) {
            return Err(GatewayError::InvalidProcedure(name.to_string()));
        }
        self.procedures
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| GatewayError::InvalidProcedure(name.to_string()))
    }
}

/// Column names are not allow-listed (they vary per table) but must still
/// be well-formed identifiers before they reach statement text.
pub fn validate_column(name: &str) -> Result<(), GatewayError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(GatewayError::InvalidColumn(name.to_string()))
    }
}

/// `[A-Za-z0-9_]+`, not starting with a digit.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
