//! Runs applied filters against JSON records.
//!
//! This is the other side of the builder: whatever receives the applied list has to decide which
//! rows match. Records are JSON objects, filters are ANDed, and only well formed filters take part.
use crate::engine::condition::{FilterCondition, FilterValue, ScalarValue};
use crate::engine::operators::FilterOperator;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

pub struct CompiledFilter {
    column: String,
    operator: FilterOperator,
    value: FilterValue,
    /// Only set for REGEX filters.
    regex: Option<Regex>,
}

impl CompiledFilter {
    pub fn compile(condition: &FilterCondition) -> Result<CompiledFilter, crate::Error> {
        let regex = match (&condition.operator, &condition.value) {
            (FilterOperator::Regex, FilterValue::Scalar(Some(pattern))) => {
                Some(Regex::new(&pattern.to_string())?)
            }
            _ => None,
        };

        Ok(CompiledFilter {
            column: condition.column.clone(),
            operator: condition.operator,
            value: condition.value.clone(),
            regex,
        })
    }

    pub fn matches(&self, record: &Value) -> bool {
        let field = lookup(record, &self.column);

        match self.operator {
            FilterOperator::Exists => field.is_some(),
            FilterOperator::NotExists => field.is_none(),
            FilterOperator::IsEmpty => field.map_or(true, is_empty),
            FilterOperator::IsNotEmpty => field.map_or(false, |field| !is_empty(field)),
            _ => match field {
                // a missing field never matches a comparison, negated ones included
                None => false,
                Some(field) => self.compare(field),
            },
        }
    }

    fn compare(&self, field: &Value) -> bool {
        match (&self.operator, &self.value) {
            (FilterOperator::In, FilterValue::MultiValue(Some(items))) => any_in(field, items),
            (FilterOperator::NotIn, FilterValue::MultiValue(Some(items))) => !any_in(field, items),
            (operator, FilterValue::Scalar(Some(expected))) => {
                self.compare_scalar(*operator, field, expected)
            }
            _ => false,
        }
    }

    fn compare_scalar(&self, operator: FilterOperator, field: &Value, expected: &ScalarValue) -> bool {
        let text = as_text(field);
        let expected_text = expected.to_string();

        match operator {
            FilterOperator::Equals => equals(field, expected),
            FilterOperator::NotEquals => !equals(field, expected),
            FilterOperator::GreaterThan => order(field, expected) == Some(Ordering::Greater),
            FilterOperator::LesserThan => order(field, expected) == Some(Ordering::Less),
            FilterOperator::GreaterOrEqual => matches!(
                order(field, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::LesserOrEqual => matches!(
                order(field, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Contains => text.contains(&expected_text),
            FilterOperator::NotContains => !text.contains(&expected_text),
            FilterOperator::StartsWith => text.starts_with(&expected_text),
            FilterOperator::EndsWith => text.ends_with(&expected_text),
            FilterOperator::Regex => self
                .regex
                .as_ref()
                .map_or(false, |regex| regex.is_match(&text)),
            FilterOperator::Similar => text
                .to_lowercase()
                .contains(&expected_text.to_lowercase()),
            _ => false,
        }
    }
}

/// Keeps the records every well formed filter matches.
pub fn filter_records<'a>(
    filters: &[FilterCondition],
    records: &'a [Value],
) -> Result<Vec<&'a Value>, crate::Error> {
    let compiled = filters
        .iter()
        .filter(|filter| filter.is_well_formed())
        .map(CompiledFilter::compile)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records
        .iter()
        .filter(|record| compiled.iter().all(|filter| filter.matches(record)))
        .collect())
}

/// `"metadata.user"` is first looked up as a key, then as a path. Null counts as missing.
fn lookup<'a>(record: &'a Value, column: &str) -> Option<&'a Value> {
    let found = match record.get(column) {
        Some(value) => Some(value),
        None => column
            .split('.')
            .try_fold(record, |value, segment| value.get(segment)),
    };

    found.filter(|value| !value.is_null())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn expected_number(expected: &ScalarValue) -> Option<f64> {
    match expected {
        ScalarValue::Number(number) => Some(*number),
        ScalarValue::Text(text) => text.trim().parse().ok(),
    }
}

fn equals(field: &Value, expected: &ScalarValue) -> bool {
    match (field, expected) {
        (Value::Number(_), _) | (_, ScalarValue::Number(_)) => {
            match (as_number(field), expected_number(expected)) {
                (Some(left), Some(right)) => left == right,
                _ => as_text(field) == expected.to_string(),
            }
        }
        _ => as_text(field) == expected.to_string(),
    }
}

/// Numbers when both sides are numbers, text otherwise. ISO dates sort correctly as text.
fn order(field: &Value, expected: &ScalarValue) -> Option<Ordering> {
    match (as_number(field), expected_number(expected)) {
        (Some(left), Some(right)) => left.partial_cmp(&right),
        _ => Some(as_text(field).as_str().cmp(expected.to_string().as_str())),
    }
}

fn any_in(field: &Value, items: &[String]) -> bool {
    match field {
        Value::Array(values) => values
            .iter()
            .any(|value| items.contains(&as_text(value))),
        other => items.contains(&as_text(other)),
    }
}
