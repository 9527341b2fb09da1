use colored::Colorize;
use rusty_filters::context::{AppliedFilters, Dataset};
use rusty_filters::{
    cache, describe_filters, filter_records, parse_filters, render_filters, FilterCondition,
    InternalError,
};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::exit;

pub mod edit;
pub mod filter_server;

pub fn exit_with(error: rusty_filters::Error) -> ! {
    eprintln!("{intro}: {error}", intro = "error".bold().red());
    exit(1);
}

pub fn show() -> Result<(), rusty_filters::Error> {
    let dataset = Dataset::current()?;
    let applied = dataset.applied_filters()?;

    println!("{}", dataset.definition.settings.title.bold());
    println!(
        "{}",
        describe_filters(
            &applied.filters,
            &dataset.columns(),
            &dataset.definition.settings.empty_message
        )
    );

    if !applied.filters.is_empty() {
        println!();
        println!("{}", render_filters(&applied.filters).dimmed());
    }

    Ok(())
}

/// Parses the input into rows and applies them, the same as typing them into the builder.
pub fn set(input: String) -> Result<(), rusty_filters::Error> {
    let dataset = Dataset::current()?;
    let applied = apply_text(&dataset, input.as_str())?;

    cache::write(&applied)?;

    println!("{}", render_filters(&applied.filters));

    Ok(())
}

fn apply_text(dataset: &Dataset, input: &str) -> Result<AppliedFilters, rusty_filters::Error> {
    let rows = parse_filters(input, &dataset.columns())?;

    let max_filters = dataset.definition.settings.max_filters;
    if rows.len() > max_filters {
        Err(InternalError(format!(
            "{} filters given, this dataset allows at most {max_filters}",
            rows.len()
        )))?;
    }

    let mut builder = dataset.builder();
    let mut applied = AppliedFilters::empty(dataset.name.clone());

    if !builder.open(&rows) {
        Err(InternalError(format!(
            "Filters are disabled for dataset {}",
            dataset.name
        )))?;
    }
    builder.handle_apply(&mut |filters: Vec<FilterCondition>| applied.filters = filters);

    Ok(applied)
}

pub fn clear() -> Result<(), rusty_filters::Error> {
    let dataset = Dataset::current()?;

    cache::write(&AppliedFilters::empty(dataset.name.clone()))?;

    println!("{}", dataset.definition.settings.empty_message);

    Ok(())
}

pub fn check(records: PathBuf) -> Result<(), rusty_filters::Error> {
    let dataset = Dataset::current()?;
    let applied = dataset.applied_filters()?;

    let records: Vec<Value> = serde_json::from_reader(fs::File::open(records)?)?;
    let matching = filter_records(&applied.filters, &records)?;

    for record in &matching {
        println!("{}", serde_json::to_string(record)?);
    }

    eprintln!(
        "{} of {} records match",
        matching.len().to_string().bold(),
        records.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_filters::context::DatasetDefinition;
    use rusty_filters::{BuilderSettings, ColumnDefinition, ColumnType, ErrorKind};

    fn dataset(settings: BuilderSettings) -> Dataset {
        Dataset {
            name: "spans".into(),
            definition: DatasetDefinition {
                columns: vec![
                    ColumnDefinition::new("status", "Status", ColumnType::String),
                    ColumnDefinition::new("latency", "Latency", ColumnType::Duration),
                ],
                settings,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_apply_text() {
        let applied = apply_text(
            &dataset(BuilderSettings::default()),
            "status = active; latency > 100",
        )
        .unwrap();

        assert_eq!(applied.dataset.to_string(), "spans");
        assert_eq!(
            render_filters(&applied.filters),
            "status = active; latency > 100"
        );
    }

    #[test]
    fn test_apply_text_respects_max_filters() {
        let settings = BuilderSettings {
            max_filters: 1,
            ..Default::default()
        };

        let error = apply_text(&dataset(settings), "status = a; status = b").unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::InternalError(_)));
        assert!(error.to_string().contains("at most 1"));
    }

    #[test]
    fn test_apply_text_on_disabled_dataset() {
        let settings = BuilderSettings {
            disabled: true,
            ..Default::default()
        };

        let error = apply_text(&dataset(settings), "status = a").unwrap_err();

        assert!(error.to_string().contains("disabled"));
    }
}
