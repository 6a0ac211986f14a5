//! Node attribute lookup for set membership.
//!
//! The membership flag lives in a named node column. Only a column declared as
//! [`AttributeType::Boolean`] is consulted; anything else means "nobody is in the set".

use std::collections::HashMap;

/// Column name the reach metric reads membership from unless configured otherwise.
pub const DEFAULT_MEMBERSHIP_COLUMN: &str = "dset";

/// Declared type of a node column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeType {
    Boolean,
    Integer,
    Float,
    String,
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Boolean reading of a value: `true`, or a string spelling `"true"` in any case.
    pub fn as_flag(&self) -> bool {
        match self {
            AttributeValue::Boolean(b) => *b,
            AttributeValue::String(s) => s.eq_ignore_ascii_case("true"),
            AttributeValue::Integer(_) | AttributeValue::Float(_) => false,
        }
    }
}

/// Read-only node attribute provider.
pub trait AttributeTable {
    /// Declared type of `column`, or `None` if there is no such column.
    fn column_type(&self, column: &str) -> Option<AttributeType>;

    /// Value of `column` for `node`, if set.
    fn value(&self, node: usize, column: &str) -> Option<AttributeValue>;

    fn has_column(&self, column: &str) -> bool {
        self.column_type(column).is_some()
    }
}

/// In-memory attribute table keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    columns: HashMap<String, Column>,
}

#[derive(Debug, Clone)]
struct Column {
    ty: AttributeType,
    values: HashMap<usize, AttributeValue>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a column. Re-declaring keeps existing values but changes the declared type.
    pub fn add_column(&mut self, column: impl Into<String>, ty: AttributeType) {
        self.columns
            .entry(column.into())
            .and_modify(|c| c.ty = ty)
            .or_insert_with(|| Column {
                ty,
                values: HashMap::new(),
            });
    }

    /// Set a value; returns `false` if the column was never declared.
    pub fn set(&mut self, node: usize, column: &str, value: AttributeValue) -> bool {
        match self.columns.get_mut(column) {
            Some(c) => {
                c.values.insert(node, value);
                true
            }
            None => false,
        }
    }

    /// Boolean column `column` with `true` for every node in `members`.
    pub fn with_members(column: &str, members: &[usize]) -> Self {
        let mut table = Self::new();
        table.add_column(column, AttributeType::Boolean);
        for &m in members {
            table.set(m, column, AttributeValue::Boolean(true));
        }
        table
    }
}

impl AttributeTable for NodeTable {
    fn column_type(&self, column: &str) -> Option<AttributeType> {
        self.columns.get(column).map(|c| c.ty)
    }

    fn value(&self, node: usize, column: &str) -> Option<AttributeValue> {
        self.columns
            .get(column)
            .and_then(|c| c.values.get(&node).cloned())
    }
}
