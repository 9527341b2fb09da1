//! Editing a single filter row.
//!
//! The editor never changes the row itself. Every user action turns into a [FilterPatch] which the
//! builder merges in, just like an `onUpdate(partial)` callback would.
use crate::engine::columns::{ColumnDefinition, ColumnOption, ColumnRegistry, DynamicOptions};
use crate::engine::condition::{FilterCondition, FilterPatch, FilterValue};
use crate::engine::operators::{ColumnType, FilterOperator, OperatorClass};
use log::debug;

/// The kind of input a row shows for its value.
#[derive(Debug, Clone, PartialEq)]
pub enum InputShape {
    /// Value-free operators don't get an input at all.
    None,
    MultiSelect(Vec<ColumnOption>),
    SingleSelect(Vec<ColumnOption>),
    Numeric { unit: Option<String> },
    DateTime,
    /// Free text. With `multiple` the text is read as a comma separated list.
    Text { multiple: bool },
}

pub struct RowEditor<'a> {
    condition: &'a FilterCondition,
    columns: &'a ColumnRegistry,
    options: &'a DynamicOptions,
}

impl<'a> RowEditor<'a> {
    pub fn new(
        condition: &'a FilterCondition,
        columns: &'a ColumnRegistry,
        options: &'a DynamicOptions,
    ) -> Self {
        RowEditor {
            condition,
            columns,
            options,
        }
    }

    pub fn condition(&self) -> &FilterCondition {
        self.condition
    }

    /// The selected column, if there is one and it is still filterable.
    pub fn column(&self) -> Option<&'a ColumnDefinition> {
        self.columns.get_filterable(&self.condition.column)
    }

    pub fn selectable_columns(&self) -> Vec<&'a ColumnDefinition> {
        self.columns.filterable().collect()
    }

    /// Operators offered for the selected column. Nothing until a column is picked.
    pub fn operators(&self) -> &'a [FilterOperator] {
        match self.column() {
            Some(column) => column.operators(),
            None => &[],
        }
    }

    /// Picking a column resets the operator to the column's first one and the value to "".
    ///
    /// Operators and value shapes depend on the column type, so nothing from the previous column
    /// is carried over. Unknown and non-filterable columns are refused.
    pub fn select_column(&self, column_id: &str) -> Option<FilterPatch> {
        let Some(column) = self.columns.get_filterable(column_id) else {
            debug!("refusing to select unknown or non-filterable column '{column_id}'");
            return None;
        };

        let Some(operator) = column.default_operator() else {
            debug!("column '{column_id}' has no operators");
            return None;
        };

        Some(FilterPatch {
            column: Some(column.id.clone()),
            operator: Some(operator),
            value: Some(FilterValue::text("")),
        })
    }

    pub fn select_operator(&self, operator: FilterOperator) -> FilterPatch {
        FilterPatch {
            column: None,
            operator: Some(operator),
            value: Some(self.condition.value.clone().for_operator(operator)),
        }
    }

    pub fn input_shape(&self) -> InputShape {
        let operator = self.condition.operator;

        if !operator.requires_value() {
            return InputShape::None;
        }

        let Some(column) = self.column() else {
            return InputShape::Text {
                multiple: operator.accepts_multiple(),
            };
        };

        let options = column.resolve_options(self.options);

        if !options.is_empty() {
            return if operator.accepts_multiple() {
                InputShape::MultiSelect(options)
            } else {
                InputShape::SingleSelect(options)
            };
        }

        match column.column_type {
            column_type if column_type.is_numeric() => InputShape::Numeric {
                unit: column.unit.clone(),
            },
            ColumnType::Datetime => InputShape::DateTime,
            _ => InputShape::Text {
                multiple: operator.accepts_multiple(),
            },
        }
    }

    /// Text typed into whatever input the row currently shows.
    pub fn enter_text(&self, input: &str) -> FilterPatch {
        let value = match self.input_shape() {
            InputShape::None => FilterValue::ValueFree,
            InputShape::Numeric { .. } => parse_number(input),
            InputShape::DateTime => FilterValue::text(input),
            InputShape::MultiSelect(_) | InputShape::Text { multiple: true } => {
                parse_list(input)
            }
            InputShape::SingleSelect(_) | InputShape::Text { multiple: false } => {
                if input.is_empty() {
                    FilterValue::Scalar(None)
                } else {
                    FilterValue::text(input)
                }
            }
        };

        FilterPatch::value(value)
    }

    /// A single-select pick.
    pub fn choose(&self, option: &str) -> FilterPatch {
        FilterPatch::value(FilterValue::text(option))
    }

    /// A multi-select pick. Deselecting everything stores null rather than an empty list.
    pub fn choose_many(&self, options: Vec<String>) -> FilterPatch {
        if options.is_empty() {
            return FilterPatch::value(FilterValue::MultiValue(None));
        }

        let picked = FilterValue::MultiValue(Some(options));

        match self.condition.operator.class() {
            OperatorClass::MultiValue => FilterPatch::value(picked),
            // single-value rows only keep the first pick
            _ => FilterPatch::value(picked.for_operator(self.condition.operator)),
        }
    }

    pub fn display_text(&self) -> String {
        self.condition.value.display_text()
    }
}

fn parse_number(input: &str) -> FilterValue {
    let input = input.trim();

    if input.is_empty() {
        return FilterValue::Scalar(None);
    }

    match input.parse::<f64>() {
        Ok(number) if number.is_finite() => FilterValue::number(number),
        _ => {
            debug!("ignoring non-numeric input '{input}'");
            FilterValue::Scalar(None)
        }
    }
}

/// `" a, ,b "` -> `["a", "b"]`, and null when nothing is left.
fn parse_list(input: &str) -> FilterValue {
    let items: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        FilterValue::MultiValue(None)
    } else {
        FilterValue::MultiValue(Some(items))
    }
}
