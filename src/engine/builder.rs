//! The filter builder panel: a draft list of rows that is either applied or thrown away.
//!
//! ```text
//!             open(applied)                handle_apply(sink)
//!   applied ----------------> draft ---------------------------> sink(well formed rows)
//!                               |
//!                               +-- dismiss() -----------------> (draft is lost)
//! ```
//! The builder never owns the applied list. It gets a copy when the panel opens, and hands the
//! result to a [FilterSink] when the user applies. Nothing here can fail: asking for more rows than
//! allowed, or editing a row that no longer exists, simply does nothing.
use crate::engine::columns::{ColumnRegistry, DynamicOptions};
use crate::engine::condition::{FilterCondition, FilterId, FilterPatch};
use crate::engine::editor::RowEditor;
use crate::engine::operators::FilterOperator;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_FILTERS: usize = 20;

/// Receives the applied filters.
pub trait FilterSink {
    fn apply_filters(&mut self, filters: Vec<FilterCondition>);
}

impl<F> FilterSink for F
where
    F: FnMut(Vec<FilterCondition>),
{
    fn apply_filters(&mut self, filters: Vec<FilterCondition>) {
        self(filters)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
    pub disabled: bool,
    pub max_filters: usize,
    pub title: String,
    pub empty_message: String,
}

pub struct FilterBuilder {
    columns: ColumnRegistry,
    options: DynamicOptions,
    settings: BuilderSettings,
    draft: Vec<FilterCondition>,
    open: bool,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        BuilderSettings {
            disabled: false,
            max_filters: DEFAULT_MAX_FILTERS,
            title: "Filters".to_string(),
            empty_message: "No filters applied".to_string(),
        }
    }
}

impl FilterBuilder {
    pub fn new(columns: ColumnRegistry, options: DynamicOptions, settings: BuilderSettings) -> Self {
        FilterBuilder {
            columns,
            options,
            settings,
            draft: Vec::new(),
            open: false,
        }
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn draft(&self) -> &[FilterCondition] {
        &self.draft
    }

    /// Opens the panel with a fresh copy of the applied filters. Whatever was left in the draft
    /// from a dismissed session is gone.
    ///
    /// Returns false when the builder is disabled.
    pub fn open(&mut self, applied: &[FilterCondition]) -> bool {
        if self.settings.disabled {
            debug!("builder is disabled, not opening");
            return false;
        }

        self.draft = applied.to_vec();
        self.open = true;

        true
    }

    /// Closes without applying.
    pub fn dismiss(&mut self) {
        self.open = false;
        self.draft.clear();
    }

    pub fn can_add_filter(&self) -> bool {
        self.draft.len() < self.settings.max_filters
    }

    /// Appends an empty row. Returns its id, or nothing when the row limit is reached.
    pub fn add_filter(&mut self) -> Option<FilterId> {
        if !self.can_add_filter() {
            debug!(
                "not adding filter, already at the maximum of {}",
                self.settings.max_filters
            );
            return None;
        }

        let condition = FilterCondition::empty();
        let id = condition.id.clone();
        self.draft.push(condition);

        Some(id)
    }

    pub fn update_filter(&mut self, id: &FilterId, patch: FilterPatch) {
        match self.draft.iter_mut().find(|condition| &condition.id == id) {
            Some(condition) => condition.merge(patch),
            None => debug!("ignoring update for unknown filter {id}"),
        }
    }

    pub fn remove_filter(&mut self, id: &FilterId) {
        self.draft.retain(|condition| &condition.id != id);
    }

    /// Empties the draft. The applied filters stay as they are until the next apply.
    pub fn clear_local_filters(&mut self) {
        self.draft.clear();
    }

    /// Hands the well formed rows to the sink and closes. Incomplete rows are dropped.
    pub fn handle_apply<S>(&mut self, sink: &mut S)
    where
        S: FilterSink + ?Sized,
    {
        let applied = applicable_filters(&self.draft);

        info!(
            "applying {} of {} filters",
            applied.len(),
            self.draft.len()
        );

        sink.apply_filters(applied);
        self.open = false;
    }

    /// Clears both the draft and the applied filters, then closes.
    pub fn handle_clear<S>(&mut self, sink: &mut S)
    where
        S: FilterSink + ?Sized,
    {
        self.draft.clear();
        sink.apply_filters(Vec::new());
        self.open = false;
    }

    pub fn editor(&self, id: &FilterId) -> Option<RowEditor<'_>> {
        self.draft
            .iter()
            .find(|condition| &condition.id == id)
            .map(|condition| RowEditor::new(condition, &self.columns, &self.options))
    }

    pub fn select_column(&mut self, id: &FilterId, column_id: &str) {
        let patch = self
            .editor(id)
            .and_then(|editor| editor.select_column(column_id));

        if let Some(patch) = patch {
            self.update_filter(id, patch);
        }
    }

    pub fn select_operator(&mut self, id: &FilterId, operator: FilterOperator) {
        let patch = self.editor(id).map(|editor| editor.select_operator(operator));

        if let Some(patch) = patch {
            self.update_filter(id, patch);
        }
    }

    pub fn enter_text(&mut self, id: &FilterId, input: &str) {
        let patch = self.editor(id).map(|editor| editor.enter_text(input));

        if let Some(patch) = patch {
            self.update_filter(id, patch);
        }
    }

    pub fn choose(&mut self, id: &FilterId, option: &str) {
        let patch = self.editor(id).map(|editor| editor.choose(option));

        if let Some(patch) = patch {
            self.update_filter(id, patch);
        }
    }

    pub fn choose_many(&mut self, id: &FilterId, options: Vec<String>) {
        let patch = self.editor(id).map(|editor| editor.choose_many(options));

        if let Some(patch) = patch {
            self.update_filter(id, patch);
        }
    }
}

/// The apply gate: keeps rows with a column and, unless the operator needs no value, a non-empty
/// value.
pub fn applicable_filters(filters: &[FilterCondition]) -> Vec<FilterCondition> {
    filters
        .iter()
        .filter(|condition| condition.is_well_formed())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::columns::{ColumnDefinition, ColumnOption};
    use crate::engine::condition::FilterValue;
    use crate::engine::operators::ColumnType;
    use crate::engine::operators::FilterOperator::*;

    fn builder(max_filters: usize) -> FilterBuilder {
        let columns = ColumnRegistry::new(vec![
            ColumnDefinition::new("status", "Status", ColumnType::Category)
                .with_options(vec![ColumnOption::from("active")]),
            ColumnDefinition::new("tags", "Tags", ColumnType::String),
        ]);

        FilterBuilder::new(
            columns,
            DynamicOptions::default(),
            BuilderSettings {
                max_filters,
                ..Default::default()
            },
        )
    }

    fn condition(column: &str, operator: FilterOperator, value: FilterValue) -> FilterCondition {
        FilterCondition {
            id: FilterId::generate(),
            column: column.to_string(),
            operator,
            value,
        }
    }

    #[test]
    fn test_row_limit() {
        let mut builder = builder(20);
        builder.open(&[]);

        for _ in 0..21 {
            builder.add_filter();
        }

        assert_eq!(builder.draft().len(), 20);
        assert!(!builder.can_add_filter());
        assert!(builder.add_filter().is_none());
    }

    #[test]
    fn test_new_row_is_empty() {
        let mut builder = builder(5);
        let id = builder.add_filter().unwrap();

        let row = &builder.draft()[0];
        assert_eq!(row.id, id);
        assert_eq!(row.column, "");
        assert_eq!(row.operator, Equals);
        assert_eq!(row.value, FilterValue::Scalar(None));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut builder = builder(5);
        builder.add_filter();
        let before = builder.draft().to_vec();

        let missing = FilterId::from("missing");
        builder.update_filter(&missing, FilterPatch::value(FilterValue::text("x")));
        builder.remove_filter(&missing);
        builder.select_column(&missing, "status");

        assert_eq!(builder.draft(), before.as_slice());
    }

    #[test]
    fn test_apply_drops_incomplete_rows() {
        let mut builder = builder(10);
        let applied = vec![
            condition("status", Equals, FilterValue::Scalar(None)),
            condition("status", Exists, FilterValue::ValueFree),
            condition("tags", In, FilterValue::MultiValue(Some(vec![]))),
            condition("", Equals, FilterValue::text("orphan")),
            condition("tags", Contains, FilterValue::text("prod")),
        ];
        builder.open(&applied);

        let mut received = Vec::new();
        builder.handle_apply(&mut |filters: Vec<FilterCondition>| received = filters);

        assert!(!builder.is_open());
        assert_eq!(received, vec![applied[1].clone(), applied[4].clone()]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut builder = builder(10);
        builder.open(&[
            condition("tags", In, FilterValue::list(["a", "b"])),
            condition("status", Equals, FilterValue::text("")),
        ]);

        let mut first = Vec::new();
        let mut second = Vec::new();
        builder.handle_apply(&mut |filters: Vec<FilterCondition>| first = filters);
        builder.handle_apply(&mut |filters: Vec<FilterCondition>| second = filters);

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_clear_applies_nothing() {
        let mut builder = builder(10);
        builder.open(&[condition("tags", Contains, FilterValue::text("a"))]);

        let mut received = None;
        builder.handle_clear(&mut |filters: Vec<FilterCondition>| received = Some(filters));

        assert_eq!(received, Some(vec![]));
        assert!(builder.draft().is_empty());
        assert!(!builder.is_open());
    }

    #[test]
    fn test_clear_local_keeps_applied() {
        let mut builder = builder(10);
        let applied = vec![condition("tags", Contains, FilterValue::text("a"))];
        builder.open(&applied);

        builder.clear_local_filters();
        assert!(builder.draft().is_empty());

        builder.dismiss();
        builder.open(&applied);
        assert_eq!(builder.draft(), applied.as_slice());
    }

    #[test]
    fn test_reopening_discards_unsaved_edits() {
        let mut builder = builder(10);
        let applied = vec![condition("tags", Contains, FilterValue::text("a"))];
        builder.open(&applied);

        builder.add_filter();
        let id = applied[0].id.clone();
        builder.enter_text(&id, "changed");
        builder.dismiss();

        builder.open(&applied);
        assert_eq!(builder.draft(), applied.as_slice());
    }

    #[test]
    fn test_disabled_builder_does_not_open() {
        let mut builder = FilterBuilder::new(
            ColumnRegistry::default(),
            DynamicOptions::default(),
            BuilderSettings {
                disabled: true,
                ..Default::default()
            },
        );

        assert!(!builder.open(&[]));
        assert!(!builder.is_open());
    }

    #[test]
    fn test_full_row_flow() {
        let mut builder = builder(10);
        builder.open(&[]);
        let id = builder.add_filter().unwrap();

        builder.select_column(&id, "status");
        assert_eq!(builder.draft()[0].operator, Equals);
        assert_eq!(builder.draft()[0].value, FilterValue::text(""));

        builder.select_operator(&id, In);
        builder.choose_many(&id, vec!["active".to_string()]);
        builder.select_operator(&id, NotIn);

        let mut received = Vec::new();
        builder.handle_apply(&mut |filters: Vec<FilterCondition>| received = filters);

        assert_eq!(received.len(), 1);
        assert_eq!(received[0].operator, NotIn);
        assert_eq!(received[0].value, FilterValue::list(["active"]));
    }

    #[test]
    fn test_default_settings() {
        let settings: BuilderSettings = serde_json::from_str(r#"{"title": "Span filters"}"#).unwrap();

        assert_eq!(settings.max_filters, DEFAULT_MAX_FILTERS);
        assert_eq!(settings.title, "Span filters");
        assert!(!settings.disabled);
    }
}
