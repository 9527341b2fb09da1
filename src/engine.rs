//! Everything that has to do with filters lives here.
//!
//! ```text
//!   operators    which operators go with which column type
//!   columns      the columns a user can pick from
//!   condition    one filter row, and the value it holds
//!   editor       what happens to a row when the user picks a column, an operator, or types
//!   builder      the draft list of rows, and the gate that decides what gets applied
//!   syntax       filters written as text
//!   rendering    filters printed as text
//!   evaluate     filters run against JSON records
//! ```
mod builder;
mod columns;
mod condition;
mod editor;
mod evaluate;
mod operators;
mod rendering;
/// Uses Pest to parse filter lists.
mod syntax;

pub use builder::{
    applicable_filters, BuilderSettings, FilterBuilder, FilterSink, DEFAULT_MAX_FILTERS,
};
pub use columns::{
    default_options_key, ColumnDefinition, ColumnOption, ColumnRegistry, DynamicOptions,
};
pub use condition::{FilterCondition, FilterId, FilterPatch, FilterValue, ScalarValue};
pub use editor::{InputShape, RowEditor};
pub use evaluate::{filter_records, CompiledFilter};
pub use operators::{operators_for_type, ColumnType, FilterOperator, OperatorClass, ALL_OPERATORS};
pub use rendering::{describe_filters, render_filters};
pub use syntax::{parse_filters, FilterSyntaxError, Position, Rule};
