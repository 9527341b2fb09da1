//! Datasets are the things we filter: a set of columns, the choices some of those columns have, and
//! how the builder should behave for them.
//!
//! One dataset is "current" at a time, the same way a shell has a current directory. Its applied
//! filters are kept next to it in the cache.
use crate::cache;
use crate::cache::SharedCacheKey;
use crate::engine::{
    BuilderSettings, ColumnDefinition, ColumnRegistry, DynamicOptions, FilterBuilder,
    FilterCondition,
};
use crate::error::InternalError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub name: DatasetName,
    #[serde(flatten)]
    pub definition: DatasetDefinition,
}

/// What a dataset file looks like on disk, before it gets a name.
///
/// ```json
/// {
///   "columns": [{"id": "span_name", "label": "Span", "type": "category"}],
///   "filter_options": {"values": {"spans": ["llm.call"]}},
///   "settings": {"max_filters": 10}
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetDefinition {
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub filter_options: DynamicOptions,
    #[serde(default)]
    pub settings: BuilderSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DatasetName(String);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedFilters {
    pub dataset: DatasetName,
    pub filters: Vec<FilterCondition>,
}

impl DatasetName {
    pub fn current() -> Result<DatasetName, crate::Error> {
        cache::read(&SharedCacheKey::current_dataset())
    }

    /// Names end up in file names, so they are kept to letters, digits, `_`, `-` and `.`, and
    /// can't start with a dot.
    pub fn validate(&self) -> Result<(), crate::Error> {
        static DATASET_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9_.-]*$").expect("dataset name regex is valid")
        });

        if !DATASET_NAME_REGEX.is_match(&self.0) {
            Err(InternalError(format!(
                "Invalid dataset name '{}': use letters, digits, '_', '-' and '.', \
                    and don't start with a dot",
                self.0
            )))?;
        }

        Ok(())
    }
}

impl Dataset {
    pub fn current() -> Result<Dataset, crate::Error> {
        cache::read(&DatasetName::current()?)
    }

    pub fn columns(&self) -> ColumnRegistry {
        ColumnRegistry::new(self.definition.columns.clone())
    }

    pub fn builder(&self) -> FilterBuilder {
        FilterBuilder::new(
            self.columns(),
            self.definition.filter_options.clone(),
            self.definition.settings.clone(),
        )
    }

    /// The applied filters, or none if nothing was ever applied.
    pub fn applied_filters(&self) -> Result<AppliedFilters, crate::Error> {
        let applied = cache::read_optional(&self.name)?;

        Ok(applied.unwrap_or_else(|| AppliedFilters::empty(self.name.clone())))
    }
}

impl AppliedFilters {
    pub fn empty(dataset: DatasetName) -> Self {
        AppliedFilters {
            dataset,
            filters: Vec::new(),
        }
    }
}

impl From<String> for DatasetName {
    fn from(value: String) -> Self {
        DatasetName(value)
    }
}

impl From<&str> for DatasetName {
    fn from(value: &str) -> Self {
        DatasetName(value.to_string())
    }
}

impl From<DatasetName> for String {
    fn from(value: DatasetName) -> Self {
        value.0
    }
}

impl Display for DatasetName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FilterOperator;

    #[test]
    fn test_dataset_file() {
        let definition: DatasetDefinition = serde_json::from_str(
            r#"{
                "columns": [
                    {"id": "span_name", "label": "Span", "type": "category"},
                    {"id": "latency", "label": "Latency", "type": "duration", "unit": "ms"}
                ],
                "filter_options": {"values": {"spans": ["llm.call"]}},
                "settings": {"max_filters": 3}
            }"#,
        )
        .unwrap();

        let dataset = Dataset {
            name: "spans".into(),
            definition,
        };
        let builder = dataset.builder();

        assert_eq!(builder.settings().max_filters, 3);
        assert_eq!(builder.settings().title, "Filters");
        assert_eq!(
            builder.columns().get("latency").and_then(|c| c.default_operator()),
            Some(FilterOperator::Equals)
        );
    }

    #[test]
    fn test_dataset_serializes_flat() {
        let dataset = Dataset {
            name: "spans".into(),
            definition: DatasetDefinition::default(),
        };

        let json = serde_json::to_value(&dataset).unwrap();

        assert_eq!(json["name"], "spans");
        assert!(json["columns"].is_array());
    }

    #[test]
    fn test_dataset_names() {
        for name in ["spans", "llm-calls_2024", "v1.2"] {
            assert!(DatasetName::from(name).validate().is_ok(), "{name}");
        }

        for name in ["", "a/b", "..", ".hidden", "with space", "../escape"] {
            assert!(DatasetName::from(name).validate().is_err(), "{name}");
        }
    }

    #[test]
    fn test_applied_filters_default_to_empty() {
        cache::use_test_cache();

        let dataset = Dataset {
            name: "context-never-applied".into(),
            definition: DatasetDefinition::default(),
        };

        let applied = dataset.applied_filters().unwrap();

        assert_eq!(applied.dataset, dataset.name);
        assert!(applied.filters.is_empty());

        let stored = AppliedFilters {
            dataset: dataset.name.clone(),
            filters: vec![FilterCondition::new(
                "status",
                FilterOperator::Exists,
                crate::engine::FilterValue::ValueFree,
            )],
        };
        cache::write(&stored).unwrap();

        assert_eq!(dataset.applied_filters().unwrap().filters, stored.filters);
    }

    #[test]
    fn test_current_dataset() {
        cache::use_test_cache();

        let dataset = Dataset {
            name: "context-current".into(),
            definition: DatasetDefinition::default(),
        };
        cache::write(&dataset).unwrap();
        cache::write(&dataset.name).unwrap();

        assert_eq!(DatasetName::current().unwrap(), dataset.name);
        assert_eq!(Dataset::current().unwrap().name, dataset.name);
    }
}
