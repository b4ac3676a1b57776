use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, SortDirection};

/// One entry of a per-entity sort allow-list: a public key (`price_asc`)
/// and the store-level sort it expands to.
#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    pub key: &'static str,
    pub fields: &'static [(&'static str, SortDirection)],
}

pub struct FilterOrder;

impl FilterOrder {
    /// Translate a requested sort key through an allow-list. `None` picks the
    /// first entry; unknown keys are rejected.
    pub fn resolve(requested: Option<&str>, allowed: &[SortSpec]) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let spec = match requested.map(str::trim).filter(|s| !s.is_empty()) {
            None => allowed.first(),
            Some(key) => allowed.iter().find(|spec| spec.key.eq_ignore_ascii_case(key)),
        };
        let spec = spec.ok_or_else(|| {
            let keys: Vec<&str> = allowed.iter().map(|s| s.key).collect();
            FilterError::UnsupportedSort(format!(
                "'{}' (expected one of: {})",
                requested.unwrap_or_default(),
                keys.join(", ")
            ))
        })?;

        Ok(spec
            .fields
            .iter()
            .map(|(field, sort)| FilterOrderInfo {
                field: field.to_string(),
                sort: *sort,
            })
            .collect())
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(infos.len());
        for info in infos {
            let path = FilterWhere::json_path(&info.field)?;
            parts.push(format!("body #> {} {} NULLS LAST", path, info.sort.to_sql()));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}
