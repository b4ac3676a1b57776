use serde::Serialize;
use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection, SqlResult};

/// Store-level query: conditions joined with AND, sort keys, and a page window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<FilterWhereInfo>,
    order: Vec<FilterOrderInfo>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, field: impl Into<String>, operator: FilterOp, data: Value) -> Self {
        self.conditions.push(FilterWhereInfo {
            field: field.into(),
            operator,
            data,
        });
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Serialize) -> Self {
        self.condition(field, FilterOp::Eq, to_value(value))
    }

    pub fn ne(self, field: impl Into<String>, value: impl Serialize) -> Self {
        self.condition(field, FilterOp::Ne, to_value(value))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Serialize) -> Self {
        self.condition(field, FilterOp::Gt, to_value(value))
    }

    pub fn gte(self, field: impl Into<String>, value: impl Serialize) -> Self {
        self.condition(field, FilterOp::Gte, to_value(value))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Serialize) -> Self {
        self.condition(field, FilterOp::Lt, to_value(value))
    }

    pub fn lte(self, field: impl Into<String>, value: impl Serialize) -> Self {
        self.condition(field, FilterOp::Lte, to_value(value))
    }

    pub fn is_in<T: Serialize>(self, field: impl Into<String>, values: &[T]) -> Self {
        self.condition(field, FilterOp::In, to_value(values))
    }

    pub fn contains(self, field: impl Into<String>, needle: &str) -> Self {
        self.condition(field, FilterOp::Contains, Value::String(needle.to_string()))
    }

    pub fn is_null(self, field: impl Into<String>, null: bool) -> Self {
        self.condition(field, FilterOp::Null, Value::Bool(null))
    }

    pub fn order_by(mut self, field: impl Into<String>, sort: SortDirection) -> Self {
        self.order.push(FilterOrderInfo {
            field: field.into(),
            sort,
        });
        self
    }

    pub fn with_order(mut self, order: Vec<FilterOrderInfo>) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: u32, offset: Option<u32>) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// Same conditions, no ordering or window. Used for counting a paged query.
    pub fn without_window(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            order: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn conditions(&self) -> &[FilterWhereInfo] {
        &self.conditions
    }

    pub fn order(&self) -> &[FilterOrderInfo] {
        &self.order
    }

    pub fn limit_value(&self) -> Option<u32> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u32> {
        self.offset
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        for condition in &self.conditions {
            FilterWhere::validate(condition)?;
        }
        for order in &self.order {
            FilterWhere::json_path(&order.field)?;
        }
        if self.limit == Some(0) {
            return Err(FilterError::InvalidLimit("Limit must be positive".to_string()));
        }
        Ok(())
    }

    /// `SELECT body FROM <table> WHERE collection = $1 AND ...`
    pub fn to_sql(&self, table: &str) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 2)?;
        let order_clause = FilterOrder::generate(&self.order)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT body FROM \"{}\"", table),
            format!("WHERE collection = $1{}", where_clause),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self, table: &str) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 2)?;
        let query = format!(
            "SELECT COUNT(*) AS count FROM \"{}\" WHERE collection = $1{}",
            table, where_clause
        );
        Ok(SqlResult { query, params })
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

fn to_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
