//! A single filter row and its value.
//!
//! On the wire a value is `string | number | string[] | null`. Here we keep it as an enum with one
//! variant per operator class, and conform the value every time the operator changes, so an
//! `IN` row can never end up holding a bare string and an `=` row can never hold a list.
use crate::engine::operators::{FilterOperator, OperatorClass};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque row identity. Two rows are the same row if their ids match, nothing else matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(String);

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// EXISTS and friends. Goes over the wire as null.
    ValueFree,
    Scalar(Option<ScalarValue>),
    MultiValue(Option<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFilterCondition")]
pub struct FilterCondition {
    pub id: FilterId,
    /// Empty means the user has not picked a column yet.
    pub column: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

/// A partial update to a row, the builder merges these in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub column: Option<String>,
    pub operator: Option<FilterOperator>,
    pub value: Option<FilterValue>,
}

impl FilterId {
    pub fn generate() -> Self {
        FilterId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FilterValue {
    /// The "nothing entered yet" value for an operator.
    pub fn empty_for(operator: FilterOperator) -> FilterValue {
        match operator.class() {
            OperatorClass::ValueFree => FilterValue::ValueFree,
            OperatorClass::SingleValue => FilterValue::Scalar(None),
            OperatorClass::MultiValue => FilterValue::MultiValue(None),
        }
    }

    pub fn text(text: impl Into<String>) -> FilterValue {
        FilterValue::Scalar(Some(ScalarValue::Text(text.into())))
    }

    pub fn number(number: f64) -> FilterValue {
        FilterValue::Scalar(Some(ScalarValue::Number(number)))
    }

    pub fn list<I, S>(items: I) -> FilterValue
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::MultiValue(Some(items.into_iter().map(Into::into).collect()))
    }

    pub fn class(&self) -> OperatorClass {
        match self {
            FilterValue::ValueFree => OperatorClass::ValueFree,
            FilterValue::Scalar(_) => OperatorClass::SingleValue,
            FilterValue::MultiValue(_) => OperatorClass::MultiValue,
        }
    }

    /// Null, or an empty string. An empty list does not count, it still has a shape.
    pub fn is_blank(&self) -> bool {
        match self {
            FilterValue::ValueFree | FilterValue::Scalar(None) | FilterValue::MultiValue(None) => {
                true
            }
            FilterValue::Scalar(Some(ScalarValue::Text(text))) => text.is_empty(),
            FilterValue::Scalar(Some(ScalarValue::Number(_))) => false,
            FilterValue::MultiValue(Some(_)) => false,
        }
    }

    /// Something a backend can actually compare against.
    pub fn is_present(&self) -> bool {
        match self {
            FilterValue::MultiValue(Some(items)) => !items.is_empty(),
            other => !other.is_blank(),
        }
    }

    /// What happens to the value when the user switches the row to `target`.
    ///
    /// ```text
    /// anything      -> EXISTS        null
    /// null or ""    -> =, IN, ...    null
    /// "a, b"        -> IN            ["a, b"]     wrapped, never re-split
    /// ["a", "b"]    -> =             "a"          first element, "" for []
    /// ```
    pub fn for_operator(self, target: FilterOperator) -> FilterValue {
        match target.class() {
            OperatorClass::ValueFree => FilterValue::ValueFree,
            _ if self.is_blank() => FilterValue::empty_for(target),
            OperatorClass::MultiValue => match self {
                FilterValue::Scalar(Some(scalar)) => {
                    FilterValue::MultiValue(Some(vec![scalar.to_string()]))
                }
                FilterValue::MultiValue(items) => FilterValue::MultiValue(items),
                FilterValue::Scalar(None) | FilterValue::ValueFree => FilterValue::MultiValue(None),
            },
            OperatorClass::SingleValue => match self {
                FilterValue::MultiValue(Some(items)) => {
                    FilterValue::text(items.into_iter().next().unwrap_or_default())
                }
                FilterValue::Scalar(scalar) => FilterValue::Scalar(scalar),
                FilterValue::MultiValue(None) | FilterValue::ValueFree => FilterValue::Scalar(None),
            },
        }
    }

    /// Like [FilterValue::for_operator], but values that already fit the operator are kept as
    /// they are.
    pub fn conform_to(self, operator: FilterOperator) -> FilterValue {
        if self.class() == operator.class() {
            self
        } else {
            self.for_operator(operator)
        }
    }

    /// How the value shows up in a text box. Lists are joined with ", " so that typing the same
    /// text back in gives the same list.
    pub fn display_text(&self) -> String {
        match self {
            FilterValue::ValueFree | FilterValue::Scalar(None) | FilterValue::MultiValue(None) => {
                String::new()
            }
            FilterValue::Scalar(Some(scalar)) => scalar.to_string(),
            FilterValue::MultiValue(Some(items)) => items.join(", "),
        }
    }
}

impl FilterCondition {
    /// A freshly added row: no column, `=`, no value.
    pub fn empty() -> Self {
        FilterCondition {
            id: FilterId::generate(),
            column: String::new(),
            operator: FilterOperator::Equals,
            value: FilterValue::Scalar(None),
        }
    }

    pub fn new(column: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        FilterCondition {
            id: FilterId::generate(),
            column: column.into(),
            operator,
            value: value.conform_to(operator),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.column.is_empty()
    }

    /// Can this row be handed to whoever applies the filters?
    pub fn is_well_formed(&self) -> bool {
        if !self.is_configured() {
            return false;
        }

        !self.operator.requires_value() || self.value.is_present()
    }

    pub fn merge(&mut self, patch: FilterPatch) {
        let FilterPatch {
            column,
            operator,
            value,
        } = patch;

        if let Some(column) = column {
            self.column = column;
        }

        if let Some(operator) = operator {
            self.operator = operator;
        }

        let value = value.unwrap_or_else(|| self.value.clone());
        self.value = value.conform_to(self.operator);
    }
}

impl FilterPatch {
    pub fn value(value: FilterValue) -> Self {
        FilterPatch {
            value: Some(value),
            ..Default::default()
        }
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Text(text) => write!(f, "{text}"),
            ScalarValue::Number(number) => write!(f, "{number}"),
        }
    }
}

impl Display for FilterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FilterId {
    fn from(value: &str) -> Self {
        FilterId(value.to_string())
    }
}

impl From<String> for FilterId {
    fn from(value: String) -> Self {
        FilterId(value)
    }
}

impl Serialize for ScalarValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ScalarValue::Text(text) => serializer.serialize_str(text),
            // 3.0 goes out as 3, that's what browsers send us too
            ScalarValue::Number(number)
                if number.fract() == 0.0 && number.abs() < i64::MAX as f64 =>
            {
                serializer.serialize_i64(*number as i64)
            }
            ScalarValue::Number(number) => serializer.serialize_f64(*number),
        }
    }
}

impl Serialize for FilterValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FilterValue::ValueFree | FilterValue::Scalar(None) | FilterValue::MultiValue(None) => {
                serializer.serialize_none()
            }
            FilterValue::Scalar(Some(scalar)) => scalar.serialize(serializer),
            FilterValue::MultiValue(Some(items)) => items.serialize(serializer),
        }
    }
}

/// What we accept from the outside. The value can be anything JSON allows, it gets conformed to
/// the operator before it ends up in a [FilterCondition].
#[derive(Deserialize)]
struct RawFilterCondition {
    id: Option<FilterId>,
    #[serde(default)]
    column: String,
    operator: FilterOperator,
    #[serde(default)]
    value: serde_json::Value,
}

impl From<RawFilterCondition> for FilterCondition {
    fn from(raw: RawFilterCondition) -> Self {
        let value = match raw.value {
            serde_json::Value::Null => FilterValue::Scalar(None),
            serde_json::Value::String(text) => FilterValue::text(text),
            serde_json::Value::Number(number) => match number.as_f64() {
                Some(number) => FilterValue::number(number),
                None => FilterValue::text(number.to_string()),
            },
            serde_json::Value::Array(items) => {
                FilterValue::list(items.into_iter().map(json_to_text))
            }
            other => FilterValue::text(json_to_text(other)),
        };

        FilterCondition {
            id: raw.id.unwrap_or_else(FilterId::generate),
            column: raw.column,
            operator: raw.operator,
            value: value.conform_to(raw.operator),
        }
    }
}

fn json_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::operators::FilterOperator::*;

    #[test]
    fn test_switch_to_value_free_drops_value() {
        assert_eq!(FilterValue::text("a").for_operator(Exists), FilterValue::ValueFree);
        assert_eq!(
            FilterValue::list(["a"]).for_operator(IsNotEmpty),
            FilterValue::ValueFree
        );
    }

    #[test]
    fn test_blank_stays_null() {
        assert_eq!(FilterValue::text("").for_operator(In), FilterValue::MultiValue(None));
        assert_eq!(FilterValue::text("").for_operator(NotEquals), FilterValue::Scalar(None));
        assert_eq!(FilterValue::ValueFree.for_operator(Equals), FilterValue::Scalar(None));
        assert_eq!(
            FilterValue::MultiValue(None).for_operator(Equals),
            FilterValue::Scalar(None)
        );
    }

    #[test]
    fn test_scalar_is_wrapped_not_split() {
        assert_eq!(
            FilterValue::text("a, b").for_operator(In),
            FilterValue::list(["a, b"])
        );
        assert_eq!(FilterValue::number(3.5).for_operator(NotIn), FilterValue::list(["3.5"]));
        // zero is a value, not a blank
        assert_eq!(FilterValue::number(0.0).for_operator(In), FilterValue::list(["0"]));
    }

    #[test]
    fn test_list_unwraps_to_first() {
        assert_eq!(FilterValue::list(["a", "b"]).for_operator(Equals), FilterValue::text("a"));
        assert_eq!(
            FilterValue::MultiValue(Some(vec![])).for_operator(Contains),
            FilterValue::text("")
        );
        assert_eq!(
            FilterValue::list(["a", "b"]).for_operator(NotIn),
            FilterValue::list(["a", "b"])
        );
    }

    #[test]
    fn test_well_formed() {
        let mut condition = FilterCondition::new("status", Equals, FilterValue::Scalar(None));
        assert!(!condition.is_well_formed());

        condition.merge(FilterPatch {
            operator: Some(Exists),
            ..Default::default()
        });
        assert!(condition.is_well_formed());

        let empty_list = FilterCondition::new("tags", In, FilterValue::MultiValue(Some(vec![])));
        assert!(!empty_list.is_well_formed());

        let empty_text = FilterCondition::new("name", Contains, FilterValue::text(""));
        assert!(!empty_text.is_well_formed());

        let unconfigured = FilterCondition::empty();
        assert!(!unconfigured.is_well_formed());
        assert!(!unconfigured.is_configured());
    }

    #[test]
    fn test_merge_conforms_mismatched_value() {
        let mut condition = FilterCondition::new("tags", In, FilterValue::list(["a"]));

        condition.merge(FilterPatch::value(FilterValue::text("b")));

        assert_eq!(condition.value, FilterValue::list(["b"]));
    }

    #[test]
    fn test_wire_format() {
        let condition = FilterCondition {
            id: "row-1".into(),
            column: "latency".to_string(),
            operator: GreaterThan,
            value: FilterValue::number(250.0),
        };

        let json = serde_json::to_string(&condition).unwrap();
        assert_eq!(
            json,
            r#"{"id":"row-1","column":"latency","operator":">","value":250}"#
        );

        let exists = FilterCondition::new("meta", Exists, FilterValue::text("ignored"));
        let json = serde_json::to_value(&exists).unwrap();
        assert_eq!(json["value"], serde_json::Value::Null);
    }

    #[test]
    fn test_deserialize_conforms_to_operator() {
        let condition: FilterCondition = serde_json::from_str(
            r#"{"id": "x", "column": "tags", "operator": "IN", "value": "solo"}"#,
        )
        .unwrap();
        assert_eq!(condition.value, FilterValue::list(["solo"]));

        let condition: FilterCondition = serde_json::from_str(
            r#"{"column": "tags", "operator": "=", "value": ["first", 2]}"#,
        )
        .unwrap();
        assert_eq!(condition.value, FilterValue::text("first"));
        assert!(!condition.id.as_str().is_empty());

        let condition: FilterCondition =
            serde_json::from_str(r#"{"id": "y", "column": "", "operator": "NOT EXISTS"}"#)
                .unwrap();
        assert_eq!(condition.value, FilterValue::ValueFree);
    }

    #[test]
    fn test_display_text() {
        assert_eq!(FilterValue::list(["a", "b"]).display_text(), "a, b");
        assert_eq!(FilterValue::number(12.0).display_text(), "12");
        assert_eq!(FilterValue::Scalar(None).display_text(), "");
    }
}
