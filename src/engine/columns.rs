//! The columns a user can filter on.
//!
//! Columns are supplied by whoever embeds the builder, usually straight from a JSON file. A column
//! can carry a fixed list of categorical choices, or get them from a [DynamicOptions] map that the
//! caller fills in (for example with the span names seen in the last hour).
use crate::engine::operators::{operators_for_type, ColumnType, FilterOperator};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default = "filterable_by_default")]
    pub filterable: bool,
    /// Replaces the operators derived from the column type, it is never merged with them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<FilterOperator>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ColumnOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub dynamic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOption {
    pub value: String,
    pub label: String,
}

/// Categorical choices that are only known at runtime.
///
/// ```text
/// columns:  span_name (category)        model_name (category)
///              |                           |  explicit key
///              v  derived key              v
/// values:   "spans": [..]               "llm_models": [..]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicOptions {
    #[serde(default)]
    pub values: HashMap<String, Vec<String>>,
    /// Column id to options key. Columns missing from here use [default_options_key].
    #[serde(default)]
    pub keys: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDefinition>,
}

fn filterable_by_default() -> bool {
    true
}

impl ColumnDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnDefinition {
            id: id.into(),
            label: label.into(),
            column_type,
            filterable: true,
            operators: None,
            description: None,
            options: None,
            unit: None,
            dynamic: false,
        }
    }

    pub fn with_options(mut self, options: Vec<ColumnOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_operators(mut self, operators: Vec<FilterOperator>) -> Self {
        self.operators = Some(operators);
        self
    }

    pub fn not_filterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    pub fn operators(&self) -> &[FilterOperator] {
        match &self.operators {
            Some(operators) => operators.as_slice(),
            None => operators_for_type(self.column_type),
        }
    }

    pub fn default_operator(&self) -> Option<FilterOperator> {
        self.operators().first().copied()
    }

    pub fn allows(&self, operator: FilterOperator) -> bool {
        self.operators().contains(&operator)
    }

    /// Fixed options win. Otherwise category (or explicitly dynamic) columns look into the dynamic
    /// options. An empty result means the column has no choices and gets a text input instead.
    pub fn resolve_options(&self, dynamic: &DynamicOptions) -> Vec<ColumnOption> {
        if let Some(options) = &self.options {
            return options.clone();
        }

        if self.column_type != ColumnType::Category && !self.dynamic {
            return Vec::new();
        }

        let key = dynamic.key_for(&self.id);

        match dynamic.values.get(&key) {
            Some(values) => values
                .iter()
                .map(|value| ColumnOption::from(value.as_str()))
                .collect(),
            None => {
                debug!("no dynamic options under key '{key}' for column '{}'", self.id);
                Vec::new()
            }
        }
    }
}

impl DynamicOptions {
    pub fn new(values: HashMap<String, Vec<String>>) -> Self {
        DynamicOptions {
            values,
            keys: HashMap::new(),
        }
    }

    pub fn with_key(mut self, column_id: impl Into<String>, key: impl Into<String>) -> Self {
        self.keys.insert(column_id.into(), key.into());
        self
    }

    pub fn key_for(&self, column_id: &str) -> String {
        match self.keys.get(column_id) {
            Some(key) => key.clone(),
            None => default_options_key(column_id),
        }
    }
}

/// `span_name` -> `spans`, `model` -> `models`.
///
/// This is only a naming convention. Nothing checks the key actually exists.
pub fn default_options_key(column_id: &str) -> String {
    let base = column_id.strip_suffix("_name").unwrap_or(column_id);

    format!("{base}s")
}

impl ColumnRegistry {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        ColumnRegistry { columns }
    }

    pub fn get(&self, id: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|column| column.id == id)
    }

    /// Only filterable columns can be picked by the user.
    pub fn get_filterable(&self, id: &str) -> Option<&ColumnDefinition> {
        self.get(id).filter(|column| column.filterable)
    }

    pub fn filterable(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|column| column.filterable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<Vec<ColumnDefinition>> for ColumnRegistry {
    fn from(value: Vec<ColumnDefinition>) -> Self {
        ColumnRegistry::new(value)
    }
}

impl From<&str> for ColumnOption {
    fn from(value: &str) -> Self {
        ColumnOption {
            value: value.to_string(),
            label: value.to_string(),
        }
    }
}
