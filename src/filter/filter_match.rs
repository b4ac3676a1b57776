use std::cmp::Ordering;

use serde_json::Value;

use super::filter::Filter;
use super::types::{FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection};

/// Evaluates a `Filter` against documents held in process memory.
pub struct FilterMatch;

impl FilterMatch {
    pub fn matches(filter: &Filter, doc: &Value) -> bool {
        filter.conditions().iter().all(|c| Self::matches_condition(c, doc))
    }

    pub fn compare_docs(order: &[FilterOrderInfo], a: &Value, b: &Value) -> Ordering {
        for info in order {
            let left = lookup(a, &info.field).filter(|v| !v.is_null());
            let right = lookup(b, &info.field).filter(|v| !v.is_null());
            // Missing values sort last in both directions
            let ordering = match (left, right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(l), Some(r)) => {
                    let ord = compare_values(l, r).unwrap_or(Ordering::Equal);
                    match info.sort {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn matches_condition(condition: &FilterWhereInfo, doc: &Value) -> bool {
        let actual = lookup(doc, &condition.field).filter(|v| !v.is_null());
        let expected = &condition.data;
        match condition.operator {
            FilterOp::Eq => actual.map_or(expected.is_null(), |v| values_equal(v, expected)),
            FilterOp::Ne => actual.map_or(!expected.is_null(), |v| !values_equal(v, expected)),
            FilterOp::Gt => ordered(actual, expected, |o| o == Ordering::Greater),
            FilterOp::Gte => ordered(actual, expected, |o| o != Ordering::Less),
            FilterOp::Lt => ordered(actual, expected, |o| o == Ordering::Less),
            FilterOp::Lte => ordered(actual, expected, |o| o != Ordering::Greater),
            FilterOp::In => match (actual, expected.as_array()) {
                (Some(v), Some(options)) => options.iter().any(|o| values_equal(v, o)),
                _ => false,
            },
            FilterOp::Contains => match (actual.and_then(Value::as_str), expected.as_str()) {
                (Some(haystack), Some(needle)) => haystack.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
            FilterOp::Null => actual.is_none() == expected.as_bool().unwrap_or(true),
        }
    }
}

/// Resolve a dotted path inside a JSON document.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| current.get(segment))
}

fn ordered(actual: Option<&Value>, expected: &Value, check: impl Fn(Ordering) -> bool) -> bool {
    actual
        .and_then(|v| compare_values(v, expected))
        .map_or(false, check)
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match compare_values(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

/// Ordering between two JSON scalars of the same kind. Numbers compare
/// numerically, strings lexicographically; mixed kinds are unordered.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(title: &str, price: f64, city: &str) -> Value {
        json!({ "title": title, "price": price, "address": { "city": city }, "status": "active" })
    }

    #[test]
    fn matches_nested_and_numeric_conditions() {
        let doc = listing("Sea view flat", 4500000.0, "Mumbai");
        let filter = Filter::new()
            .eq("address.city", "Mumbai")
            .gte("price", 4_500_000)
            .lt("price", 5_000_000)
            .contains("title", "SEA VIEW");
        assert!(FilterMatch::matches(&filter, &doc));
        assert!(!FilterMatch::matches(&Filter::new().gt("price", 4_500_000), &doc));
    }

    #[test]
    fn in_ne_and_null_semantics() {
        let doc = listing("Plot", 100.0, "Pune");
        assert!(FilterMatch::matches(&Filter::new().is_in("status", &["active", "pending"]), &doc));
        assert!(FilterMatch::matches(&Filter::new().ne("status", "sold"), &doc));
        assert!(FilterMatch::matches(&Filter::new().is_null("agentId", true), &doc));
        assert!(!FilterMatch::matches(&Filter::new().is_null("title", true), &doc));
        // A missing field never equals a concrete value
        assert!(!FilterMatch::matches(&Filter::new().eq("agentId", "x"), &doc));
    }

    #[test]
    fn sorts_with_missing_values_last() {
        let mut docs = vec![json!({ "views": 3 }), json!({}), json!({ "views": 10 })];
        let order = vec![FilterOrderInfo { field: "views".into(), sort: SortDirection::Desc }];
        docs.sort_by(|a, b| FilterMatch::compare_docs(&order, a, b));
        assert_eq!(docs, vec![json!({ "views": 10 }), json!({ "views": 3 }), json!({})]);
    }
}
