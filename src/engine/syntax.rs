//! Filter lists written as text.
//!
//! ```text
//!     status = active; tags IN (a, "b c"); latency >= 120.5; metadata EXISTS
//! ```
//! This is what `filters set` takes, what `filters show` prints, and what the server's parse
//! endpoint accepts.
//!
//! Parsing happens in two steps. Pest checks the syntax, then every condition is checked against
//! the column registry: the column has to exist and be filterable, and the operator has to be one
//! the column allows. Only the second step knows about columns, so only it can say whether `12`
//! is a number or a piece of text.
use crate::engine::columns::{ColumnDefinition, ColumnRegistry};
use crate::engine::condition::{FilterCondition, FilterValue};
use crate::engine::operators::{FilterOperator, OperatorClass};
use crate::error::InternalError;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::fmt::{Display, Formatter};
use std::ops::Range;
use thiserror::Error;

/// Pest parser
///
/// Pest generates the `Rule` enum from the rule names in filters.pest.
#[derive(Parser)]
#[grammar = "engine/syntax/filters.pest"]
struct FilterParser;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterSyntaxError {
    UnknownColumn {
        column: String,
        position: Position,
    },
    ColumnNotFilterable {
        column: String,
        position: Position,
    },
    OperatorNotAllowed {
        column: String,
        operator: FilterOperator,
        position: Position,
    },
    ListNotAllowed {
        operator: FilterOperator,
        position: Position,
    },
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

/// Values are kept as written, whether they're numbers depends on the column.
enum Operand {
    Single(String),
    List(Vec<String>),
}

pub fn parse_filters(
    input: &str,
    columns: &ColumnRegistry,
) -> Result<Vec<FilterCondition>, crate::Error> {
    let root = FilterParser::parse(
        // the grammar always starts with a Rule::root node
        Rule::root,
        input,
    )?
    .next()
    .ok_or_else(|| InternalError("filter grammar produced no root".to_string()))?;

    root.into_inner()
        .filter(|pair| pair.as_rule() == Rule::condition)
        .map(|pair| translate_condition(pair, columns))
        .collect()
}

fn translate_condition(
    pair: Pair<'_, Rule>,
    columns: &ColumnRegistry,
) -> Result<FilterCondition, crate::Error> {
    let mut inner = pair.into_inner();

    let column_pair = inner
        .next()
        .ok_or_else(|| InternalError("condition without a column".to_string()))?;
    let operator_pair = inner
        .next()
        .ok_or_else(|| InternalError("condition without an operator".to_string()))?;
    let operand_pair = inner.next();

    let column = lookup_column(&column_pair, columns)?;

    let operator = FilterOperator::from_symbol(operator_pair.as_str()).ok_or_else(|| {
        InternalError(format!("unknown operator '{}'", operator_pair.as_str()))
    })?;

    if !column.allows(operator) {
        Err(FilterSyntaxError::OperatorNotAllowed {
            column: column.id.clone(),
            operator,
            position: operator_pair.as_span().into(),
        })?;
    }

    let value = match operand_pair {
        None => FilterValue::empty_for(operator),
        Some(operand_pair) => {
            let position: Position = operand_pair.as_span().into();
            let operand = translate_operand(operand_pair);

            operand_value(column, operator, operand, position)?
        }
    };

    Ok(FilterCondition::new(column.id.clone(), operator, value))
}

fn lookup_column<'a>(
    pair: &Pair<'_, Rule>,
    columns: &'a ColumnRegistry,
) -> Result<&'a ColumnDefinition, FilterSyntaxError> {
    let name = pair.as_str();
    let position: Position = pair.as_span().into();

    match columns.get(name) {
        None => Err(FilterSyntaxError::UnknownColumn {
            column: name.to_string(),
            position,
        }),
        Some(column) if !column.filterable => Err(FilterSyntaxError::ColumnNotFilterable {
            column: name.to_string(),
            position,
        }),
        Some(column) => Ok(column),
    }
}

fn translate_operand(pair: Pair<'_, Rule>) -> Operand {
    match pair.as_rule() {
        Rule::list => Operand::List(pair.into_inner().map(translate_literal).collect()),
        _ => Operand::Single(translate_literal(pair)),
    }
}

fn translate_literal(pair: Pair<'_, Rule>) -> String {
    match pair.as_rule() {
        Rule::string => {
            let inner = pair
                .into_inner()
                .next()
                .map(|inner| inner.as_str())
                .unwrap_or_default();

            unescape(inner)
        }
        _ => pair.as_str().to_string(),
    }
}

fn operand_value(
    column: &ColumnDefinition,
    operator: FilterOperator,
    operand: Operand,
    position: Position,
) -> Result<FilterValue, FilterSyntaxError> {
    let value = match (operator.class(), operand) {
        (OperatorClass::ValueFree, _) => FilterValue::ValueFree,
        (OperatorClass::MultiValue, Operand::Single(literal)) => FilterValue::list([literal]),
        (OperatorClass::MultiValue, Operand::List(literals)) => FilterValue::list(literals),
        (OperatorClass::SingleValue, Operand::List(_)) => {
            return Err(FilterSyntaxError::ListNotAllowed { operator, position })
        }
        // anything f64 reads counts, `1e3` and `.5` included, same as the numeric input
        (OperatorClass::SingleValue, Operand::Single(literal))
            if column.column_type.is_numeric() =>
        {
            match literal.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => FilterValue::number(number),
                _ => FilterValue::text(literal),
            }
        }
        (OperatorClass::SingleValue, Operand::Single(literal)) => FilterValue::text(literal),
    };

    Ok(value)
}

/// `\"` becomes `"`, `\\` becomes `\`, any other escaped character is kept as is.
fn unescape(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(char) = chars.next() {
        if char == '\\' {
            if let Some(escaped) = chars.next() {
                output.push(escaped);
            }
        } else {
            output.push(char);
        }
    }

    output
}

impl From<pest::Span<'_>> for Position {
    fn from(span: pest::Span<'_>) -> Self {
        Position {
            start: span.start(),
            end: span.end(),
        }
    }
}

impl From<Range<usize>> for Position {
    fn from(range: Range<usize>) -> Self {
        Position {
            start: range.start,
            end: range.end,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl Display for FilterSyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterSyntaxError::UnknownColumn { column, position } => {
                write!(f, "Unknown column '{column}' at {position}")
            }
            FilterSyntaxError::ColumnNotFilterable { column, position } => {
                write!(f, "Column '{column}' cannot be filtered on, at {position}")
            }
            FilterSyntaxError::OperatorNotAllowed {
                column,
                operator,
                position,
            } => {
                write!(
                    f,
                    "Operator '{operator}' is not available for column '{column}', at {position}"
                )
            }
            FilterSyntaxError::ListNotAllowed { operator, position } => {
                write!(
                    f,
                    "Operator '{operator}' takes a single value, not a list, at {position}"
                )
            }
        }
    }
}
