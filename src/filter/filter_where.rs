use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo, SqlParam};

pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render conditions as ` AND <cond>` fragments over the JSONB `body` column.
    /// Placeholders start at `starting_param_index`.
    pub fn generate(
        conditions: &[FilterWhereInfo],
        starting_param_index: usize,
    ) -> Result<(String, Vec<SqlParam>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut sql = String::new();
        for condition in conditions {
            Self::validate(condition)?;
            sql.push_str(" AND ");
            sql.push_str(&filter_where.build_sql_condition(condition)?);
        }
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(condition: &FilterWhereInfo) -> Result<(), FilterError> {
        Self::json_path(&condition.field)?;
        match condition.operator {
            FilterOp::In if !condition.data.is_array() => Err(FilterError::InvalidOperatorData(format!(
                "{} requires an array",
                condition.field
            ))),
            FilterOp::Contains if !condition.data.is_string() => Err(FilterError::InvalidOperatorData(
                format!("{} requires a string", condition.field),
            )),
            FilterOp::Null if !condition.data.is_boolean() => Err(FilterError::InvalidOperatorData(format!(
                "{} requires a boolean",
                condition.field
            ))),
            _ => Ok(()),
        }
    }

    /// Convert a dotted field path into a Postgres text-array literal: `a.b` -> `'{a,b}'`.
    pub fn json_path(field: &str) -> Result<String, FilterError> {
        if field.is_empty() {
            return Err(FilterError::InvalidField("Field name cannot be empty".to_string()));
        }
        let mut segments = Vec::new();
        for segment in field.split('.') {
            let mut chars = segment.chars();
            let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
            if !valid_start || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(FilterError::InvalidField(format!("Invalid field name format: {}", field)));
            }
            segments.push(segment);
        }
        Ok(format!("'{{{}}}'", segments.join(",")))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let path = Self::json_path(&condition.field)?;
        let sql = match condition.operator {
            FilterOp::Eq => format!("body #> {} = {}", path, self.push_json(&condition.data)),
            FilterOp::Ne => format!("body #> {} IS DISTINCT FROM {}", path, self.push_json(&condition.data)),
            FilterOp::Gt => format!("body #> {} > {}", path, self.push_json(&condition.data)),
            FilterOp::Gte => format!("body #> {} >= {}", path, self.push_json(&condition.data)),
            FilterOp::Lt => format!("body #> {} < {}", path, self.push_json(&condition.data)),
            FilterOp::Lte => format!("body #> {} <= {}", path, self.push_json(&condition.data)),
            FilterOp::In => format!("{} @> jsonb_build_array(body #> {})", self.push_json(&condition.data), path),
            FilterOp::Contains => {
                let needle = condition.data.as_str().unwrap_or_default();
                let placeholder = self.push_text(format!("%{}%", escape_like(needle)));
                format!("body #>> {} ILIKE {}", path, placeholder)
            }
            FilterOp::Null => {
                if condition.data.as_bool().unwrap_or(true) {
                    format!("(body #> {p} IS NULL OR body #> {p} = 'null'::jsonb)", p = path)
                } else {
                    format!("(body #> {p} IS NOT NULL AND body #> {p} <> 'null'::jsonb)", p = path)
                }
            }
        };
        Ok(sql)
    }

    fn push_json(&mut self, value: &Value) -> String {
        self.param_values.push(SqlParam::Json(value.clone()));
        self.next_placeholder()
    }

    fn push_text(&mut self, value: String) -> String {
        self.param_values.push(SqlParam::Text(value));
        self.next_placeholder()
    }

    fn next_placeholder(&mut self) -> String {
        let placeholder = format!("${}", self.param_index);
        self.param_index += 1;
        placeholder
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(field: &str, operator: FilterOp, data: Value) -> FilterWhereInfo {
        FilterWhereInfo {
            field: field.to_string(),
            operator,
            data,
        }
    }

    #[test]
    fn nested_paths_become_text_arrays() {
        assert_eq!(FilterWhere::json_path("address.city").unwrap(), "'{address,city}'");
        assert!(FilterWhere::json_path("address..city").is_err());
        assert!(FilterWhere::json_path("1abc").is_err());
    }

    #[test]
    fn in_and_contains_render_expected_sql() {
        let conditions = vec![
            info("status", FilterOp::In, json!(["active", "pending"])),
            info("title", FilterOp::Contains, json!("50%_off")),
        ];
        let (sql, params) = FilterWhere::generate(&conditions, 2).unwrap();
        assert_eq!(
            sql,
            " AND $2 @> jsonb_build_array(body #> '{status}') AND body #>> '{title}' ILIKE $3"
        );
        assert_eq!(params[1], SqlParam::Text("%50\\%\\_off%".to_string()));
    }

    #[test]
    fn null_checks_take_no_params() {
        let (sql, params) = FilterWhere::generate(&[info("agentId", FilterOp::Null, json!(false))], 2).unwrap();
        assert!(sql.contains("IS NOT NULL"));
        assert!(params.is_empty());
    }

    #[test]
    fn operator_data_is_checked() {
        assert!(FilterWhere::validate(&info("status", FilterOp::In, json!("active"))).is_err());
        assert!(FilterWhere::validate(&info("title", FilterOp::Contains, json!(3))).is_err());
    }
}
