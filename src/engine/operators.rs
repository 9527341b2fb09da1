//! Which operators go with which column types.
//!
//! Everything here is a plain lookup. Operators fall into three classes, and both the row editor
//! and the apply gate decide what to do with a value based on that class alone:
//! ```text
//! ValueFree    EXISTS, NOT EXISTS, IS EMPTY, IS NOT EMPTY      no value at all
//! MultiValue   IN, NOT IN                                      always a list of strings
//! SingleValue  everything else                                 a string or a number
//! ```
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Duration,
    Cost,
    Datetime,
    Category,
    Boolean,
    Json,
    /// Anything we don't recognize gets treated like a string column.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LesserThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LesserOrEqual,
    #[serde(rename = "CONTAINS")]
    Contains,
    #[serde(rename = "NOT CONTAINS")]
    NotContains,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "EXISTS")]
    Exists,
    #[serde(rename = "NOT EXISTS")]
    NotExists,
    #[serde(rename = "STARTS WITH")]
    StartsWith,
    #[serde(rename = "ENDS WITH")]
    EndsWith,
    #[serde(rename = "REGEX")]
    Regex,
    #[serde(rename = "IS EMPTY")]
    IsEmpty,
    #[serde(rename = "IS NOT EMPTY")]
    IsNotEmpty,
    #[serde(rename = "~")]
    Similar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorClass {
    ValueFree,
    SingleValue,
    MultiValue,
}

use FilterOperator::*;

const STRING_OPERATORS: &[FilterOperator] = &[
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    IsEmpty,
    IsNotEmpty,
    In,
    NotIn,
];

const NUMERIC_OPERATORS: &[FilterOperator] = &[
    Equals,
    NotEquals,
    GreaterThan,
    LesserThan,
    GreaterOrEqual,
    LesserOrEqual,
    IsEmpty,
    IsNotEmpty,
];

const DATETIME_OPERATORS: &[FilterOperator] =
    &[GreaterThan, LesserThan, GreaterOrEqual, LesserOrEqual];

const CATEGORY_OPERATORS: &[FilterOperator] = &[Equals, NotEquals, In, NotIn];

const BOOLEAN_OPERATORS: &[FilterOperator] = &[Equals, NotEquals];

const JSON_OPERATORS: &[FilterOperator] = &[Exists, NotExists];

/// Every operator, in the order they are declared.
pub const ALL_OPERATORS: &[FilterOperator] = &[
    Equals,
    NotEquals,
    GreaterThan,
    LesserThan,
    GreaterOrEqual,
    LesserOrEqual,
    Contains,
    NotContains,
    In,
    NotIn,
    Exists,
    NotExists,
    StartsWith,
    EndsWith,
    Regex,
    IsEmpty,
    IsNotEmpty,
    Similar,
];

/// The default operators for a column type. Columns can override this entirely.
pub fn operators_for_type(column_type: ColumnType) -> &'static [FilterOperator] {
    match column_type {
        ColumnType::String | ColumnType::Unknown => STRING_OPERATORS,
        ColumnType::Number | ColumnType::Duration | ColumnType::Cost => NUMERIC_OPERATORS,
        ColumnType::Datetime => DATETIME_OPERATORS,
        ColumnType::Category => CATEGORY_OPERATORS,
        ColumnType::Boolean => BOOLEAN_OPERATORS,
        ColumnType::Json => JSON_OPERATORS,
    }
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnType::Number | ColumnType::Duration | ColumnType::Cost
        )
    }
}

impl FilterOperator {
    pub fn class(self) -> OperatorClass {
        match self {
            Exists | NotExists | IsEmpty | IsNotEmpty => OperatorClass::ValueFree,
            In | NotIn => OperatorClass::MultiValue,
            _ => OperatorClass::SingleValue,
        }
    }

    pub fn requires_value(self) -> bool {
        self.class() != OperatorClass::ValueFree
    }

    pub fn accepts_multiple(self) -> bool {
        self.class() == OperatorClass::MultiValue
    }

    /// What the user sees in operator pickers.
    pub fn label(self) -> &'static str {
        match self {
            Equals => "equals",
            NotEquals => "not equals",
            GreaterThan => "greater than",
            LesserThan => "less than",
            GreaterOrEqual => "greater or equal",
            LesserOrEqual => "less or equal",
            Contains => "contains",
            NotContains => "does not contain",
            In => "is any of",
            NotIn => "is none of",
            Exists => "exists",
            NotExists => "does not exist",
            StartsWith => "starts with",
            EndsWith => "ends with",
            Regex => "matches regex",
            IsEmpty => "is empty",
            IsNotEmpty => "is not empty",
            Similar => "is similar to",
        }
    }

    /// The wire spelling, same as the serde representation.
    pub fn symbol(self) -> &'static str {
        match self {
            Equals => "=",
            NotEquals => "!=",
            GreaterThan => ">",
            LesserThan => "<",
            GreaterOrEqual => ">=",
            LesserOrEqual => "<=",
            Contains => "CONTAINS",
            NotContains => "NOT CONTAINS",
            In => "IN",
            NotIn => "NOT IN",
            Exists => "EXISTS",
            NotExists => "NOT EXISTS",
            StartsWith => "STARTS WITH",
            EndsWith => "ENDS WITH",
            Regex => "REGEX",
            IsEmpty => "IS EMPTY",
            IsNotEmpty => "IS NOT EMPTY",
            Similar => "~",
        }
    }

    /// Looks up an operator by its spelling. Keywords are matched case-insensitively and any run
    /// of whitespace between words counts as a single space.
    pub fn from_symbol(symbol: &str) -> Option<FilterOperator> {
        let normalized = symbol
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        ALL_OPERATORS
            .iter()
            .copied()
            .find(|operator| operator.symbol() == normalized)
    }
}

impl Display for FilterOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Duration => "duration",
            ColumnType::Cost => "cost",
            ColumnType::Datetime => "datetime",
            ColumnType::Category => "category",
            ColumnType::Boolean => "boolean",
            ColumnType::Json => "json",
            ColumnType::Unknown => "unknown",
        };

        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: &[ColumnType] = &[
        ColumnType::String,
        ColumnType::Number,
        ColumnType::Duration,
        ColumnType::Cost,
        ColumnType::Datetime,
        ColumnType::Category,
        ColumnType::Boolean,
        ColumnType::Json,
        ColumnType::Unknown,
    ];

    #[test]
    fn test_every_type_has_operators() {
        for column_type in ALL_TYPES {
            assert!(
                !operators_for_type(*column_type).is_empty(),
                "{column_type} has no operators"
            );
        }
    }

    #[test]
    fn test_classes_agree_with_helpers() {
        for operator in ALL_OPERATORS {
            let class = operator.class();

            assert_eq!(operator.requires_value(), class != OperatorClass::ValueFree);
            assert_eq!(
                operator.accepts_multiple(),
                class == OperatorClass::MultiValue
            );
        }

        let value_free: Vec<_> = ALL_OPERATORS
            .iter()
            .filter(|operator| !operator.requires_value())
            .collect();
        assert_eq!(value_free, [&Exists, &NotExists, &IsEmpty, &IsNotEmpty]);

        let multi: Vec<_> = ALL_OPERATORS
            .iter()
            .filter(|operator| operator.accepts_multiple())
            .collect();
        assert_eq!(multi, [&In, &NotIn]);
    }

    #[test]
    fn test_type_tables() {
        assert_eq!(operators_for_type(ColumnType::Category), [Equals, NotEquals, In, NotIn]);
        assert_eq!(operators_for_type(ColumnType::Json), [Exists, NotExists]);
        assert_eq!(
            operators_for_type(ColumnType::Duration),
            operators_for_type(ColumnType::Cost)
        );
        assert_eq!(
            operators_for_type(ColumnType::Unknown),
            operators_for_type(ColumnType::String)
        );
        assert_eq!(operators_for_type(ColumnType::String).len(), 11);
    }

    #[test]
    fn test_serde_spelling() {
        let json = serde_json::to_string(&[NotContains, IsNotEmpty, Similar]).unwrap();
        assert_eq!(json, r#"["NOT CONTAINS","IS NOT EMPTY","~"]"#);

        let parsed: FilterOperator = serde_json::from_str(r#"">=""#).unwrap();
        assert_eq!(parsed, GreaterOrEqual);

        let column_type: ColumnType = serde_json::from_str(r#""vector""#).unwrap();
        assert_eq!(column_type, ColumnType::Unknown);
    }

    #[test]
    fn test_from_symbol() {
        assert_eq!(FilterOperator::from_symbol("not   in"), Some(NotIn));
        assert_eq!(FilterOperator::from_symbol("starts with"), Some(StartsWith));
        assert_eq!(FilterOperator::from_symbol("<="), Some(LesserOrEqual));
        assert_eq!(FilterOperator::from_symbol("LIKE"), None);

        for operator in ALL_OPERATORS {
            assert_eq!(FilterOperator::from_symbol(operator.symbol()), Some(*operator));
        }
    }
}
