//! The in-memory unit the gateway consumes: one logical operation against
//! one table (or stored procedure), built per request from the JSON body
//! and discarded after execution.

use serde_json::{Map, Value};

/// One gateway call. Values are always bound as parameters; the table /
/// procedure identifiers are validated against the registry before any SQL
/// text is built.
#[derive(Debug, Clone)]
pub enum OperationDescriptor {
    /// Plain INSERT returning the driver-assigned id
    Insert {
        table: String,
        columns: Vec<(String, Value)>,
    },
    /// Check-then-act dedup: SELECT by predicate, INSERT only on miss
    ConditionalInsert {
        table: String,
        columns: Vec<(String, Value)>,
        predicate: Vec<(String, Value)>,
    },
    /// Read with zero or more equality predicates
    Select {
        table: String,
        predicate: Vec<(String, Value)>,
    },
    /// Delete by a single predicate column; zero rows affected is not-found
    Delete {
        table: String,
        column: String,
        value: Value,
    },
    /// Stored procedure with positional arguments; all result sets drained
    ProcedureCall {
        procedure: String,
        args: Vec<Value>,
    },
}

impl OperationDescriptor {
    pub fn insert(table: impl Into<String>, columns: Vec<(String, Value)>) -> Self {
        Self::Insert {
            table: table.into(),
            columns,
        }
    }

    /// Dedup variant where the existence predicate is the inserted columns
    /// themselves (the common case for the feeder endpoints).
    pub fn insert_if_absent(table: impl Into<String>, columns: Vec<(String, Value)>) -> Self {
        let predicate = columns.clone();
        Self::ConditionalInsert {
            table: table.into(),
            columns,
            predicate,
        }
    }

    pub fn select(table: impl Into<String>, predicate: Vec<(String, Value)>) -> Self {
        Self::Select {
            table: table.into(),
            predicate,
        }
    }

    pub fn delete(table: impl Into<String>, column: impl Into<String>, value: Value) -> Self {
        Self::Delete {
            table: table.into(),
            column: column.into(),
            value,
        }
    }

    pub fn procedure_call(procedure: impl Into<String>, args: Vec<Value>) -> Self {
        Self::ProcedureCall {
            procedure: procedure.into(),
            args,
        }
    }
}

/// What an executed descriptor produced.
#[derive(Debug)]
pub enum GatewayOutcome {
    /// Ordered rows as column-name -> value maps
    Rows(Vec<Map<String, Value>>),
    /// New row, driver-assigned identifier
    Inserted { id: u64 },
    /// ConditionalInsert found a matching row; nothing was mutated
    Exists { id: u64 },
    /// Delete matched and removed this many rows
    Deleted { affected: u64 },
}
