//! Query predicates for paging through a datastore
//!
//! Filters are a conjunctive list of field predicates; the record store
//! applies them together with the caller's owner keys.

use serde::{Deserialize, Serialize};

use crate::identifiers::{AppId, DatastoreId, TenantDb};
use crate::record::DataType;

/// Comparison operator understood by the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "in")]
    In,
}

/// One filter predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field_id: String,
    pub field_type: DataType,
    pub operator: Operator,
    pub value: String,
    /// Dynamic predicates are evaluated against the record's own fields
    #[serde(rename = "isDynamic")]
    pub dynamic: bool,
}

impl Condition {
    pub fn new(
        field_id: impl Into<String>,
        field_type: DataType,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field_id: field_id.into(),
            field_type,
            operator,
            value: value.into(),
            dynamic: true,
        }
    }

    pub fn eq(field_id: impl Into<String>, field_type: DataType, value: impl Into<String>) -> Self {
        Self::new(field_id, field_type, Operator::Eq, value)
    }

    pub fn not_eq(
        field_id: impl Into<String>,
        field_type: DataType,
        value: impl Into<String>,
    ) -> Self {
        Self::new(field_id, field_type, Operator::NotEq, value)
    }

    /// Marks this predicate as static (compared literally)
    pub fn fixed(mut self) -> Self {
        self.dynamic = false;
        self
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascend,
    Descend,
}

/// One sort key, applied in the order given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    pub field_id: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn ascend(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            order: SortOrder::Ascend,
        }
    }

    pub fn descend(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            order: SortOrder::Descend,
        }
    }
}

/// A complete datastore query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    pub tenant: TenantDb,
    pub app_id: AppId,
    pub datastore_id: DatastoreId,
    pub conditions: Vec<Condition>,
    pub owners: Vec<String>,
    pub sorts: Vec<SortKey>,
}

impl RecordQuery {
    pub fn new(tenant: TenantDb, app_id: AppId, datastore_id: DatastoreId) -> Self {
        Self {
            tenant,
            app_id,
            datastore_id,
            conditions: Vec::new(),
            owners: Vec::new(),
            sorts: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn with_owners(mut self, owners: Vec<String>) -> Self {
        self.owners = owners;
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sorts.push(sort);
        self
    }
}
