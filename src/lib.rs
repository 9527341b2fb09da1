//! Filter conditions for tabular data.
//!
//! A user builds a list of `(column, operator, value)` rows in a draft, and only the rows that make
//! sense get applied. The applied list can then be printed, sent somewhere as JSON, or run against
//! JSON records directly.
//!
//! ```
//! use rusty_filters::{
//!     BuilderSettings, ColumnDefinition, ColumnRegistry, ColumnType, DynamicOptions,
//!     FilterBuilder, FilterCondition, FilterOperator,
//! };
//!
//! let columns = ColumnRegistry::new(vec![
//!     ColumnDefinition::new("name", "Name", ColumnType::String),
//! ]);
//! let mut builder = FilterBuilder::new(columns, DynamicOptions::default(), BuilderSettings::default());
//!
//! builder.open(&[]);
//! let row = builder.add_filter().unwrap();
//! builder.select_column(&row, "name");
//! builder.select_operator(&row, FilterOperator::In);
//! builder.enter_text(&row, "a, b");
//!
//! let mut applied = Vec::new();
//! builder.handle_apply(&mut |filters: Vec<FilterCondition>| applied = filters);
//!
//! assert_eq!(rusty_filters::render_filters(&applied), "name IN (a, b)");
//! ```

pub mod cache;
pub mod context;
mod engine;
mod error;

pub use engine::*;
pub use error::{Error, ErrorKind, InternalError};
