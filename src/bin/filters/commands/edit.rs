//! The interactive filter builder.
//!
//! Works on a draft: nothing is written to the cache until the user applies or clears.
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{FuzzySelect, Input, MultiSelect, Select};
use rusty_filters::context::{AppliedFilters, Dataset};
use rusty_filters::{
    cache, ColumnOption, Error, FilterBuilder, FilterCondition, FilterId, FilterValue, InputShape,
    InternalError,
};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Add,
    Edit,
    Remove,
    ClearAll,
    Apply,
    ClearAndApply,
    Cancel,
}

pub fn edit() -> Result<(), Error> {
    let dataset = Dataset::current()?;
    let applied = dataset.applied_filters()?;
    let mut builder = dataset.builder();

    if !builder.open(&applied.filters) {
        Err(InternalError(format!(
            "Filters are disabled for dataset {}",
            dataset.name
        )))?;
    }

    println!(
        "Editing {} for dataset {}",
        builder.settings().title.bold(),
        dataset.name.to_string().bold().green()
    );

    while builder.is_open() {
        print_draft(&builder);

        let actions = available_actions(&builder);
        let picked = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What now?")
            .items(&actions)
            .default(0)
            .interact()?;

        match actions[picked] {
            Action::Add => {
                if let Some(id) = builder.add_filter() {
                    edit_row(&mut builder, &id)?;
                }
            }
            Action::Edit => {
                if let Some(id) = pick_row(&builder, "Edit which filter?")? {
                    edit_row(&mut builder, &id)?;
                }
            }
            Action::Remove => {
                if let Some(id) = pick_row(&builder, "Remove which filter?")? {
                    builder.remove_filter(&id);
                }
            }
            Action::ClearAll => builder.clear_local_filters(),
            Action::Apply => {
                let mut applied = AppliedFilters::empty(dataset.name.clone());
                builder.handle_apply(&mut |filters: Vec<FilterCondition>| {
                    applied.filters = filters
                });
                cache::write(&applied)?;

                println!("Applied {} filters", applied.filters.len());
            }
            Action::ClearAndApply => {
                let mut applied = AppliedFilters::empty(dataset.name.clone());
                builder.handle_clear(&mut |filters: Vec<FilterCondition>| {
                    applied.filters = filters
                });
                cache::write(&applied)?;

                println!("{}", builder.settings().empty_message);
            }
            Action::Cancel => builder.dismiss(),
        }
    }

    Ok(())
}

fn available_actions(builder: &FilterBuilder) -> Vec<Action> {
    let mut actions = Vec::new();

    if builder.can_add_filter() {
        actions.push(Action::Add);
    }

    if !builder.draft().is_empty() {
        actions.extend([Action::Edit, Action::Remove, Action::ClearAll]);
    }

    actions.extend([Action::Apply, Action::ClearAndApply, Action::Cancel]);

    actions
}

fn print_draft(builder: &FilterBuilder) {
    println!();

    if builder.draft().is_empty() {
        println!("  {}", builder.settings().empty_message.dimmed());
    }

    for (index, row) in builder.draft().iter().enumerate() {
        println!("  {}. {}", index + 1, row_label(row));
    }

    if !builder.can_add_filter() {
        println!(
            "  {}",
            format!(
                "At most {} filters can be used",
                builder.settings().max_filters
            )
            .yellow()
        );
    }

    println!();
}

fn row_label(row: &FilterCondition) -> String {
    if row.column.is_empty() {
        return "(no column selected)".dimmed().to_string();
    }

    if row.is_well_formed() {
        row.to_string()
    } else {
        format!("{} {}", row, "(incomplete, will not be applied)".yellow())
    }
}

fn pick_row(builder: &FilterBuilder, prompt: &str) -> Result<Option<FilterId>, Error> {
    let labels: Vec<String> = builder.draft().iter().map(row_label).collect();

    let picked = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact_opt()?;

    Ok(picked.and_then(|index| builder.draft().get(index).map(|row| row.id.clone())))
}

/// Walks the user through column, operator and value for one row.
fn edit_row(builder: &mut FilterBuilder, id: &FilterId) -> Result<(), Error> {
    pick_column(builder, id)?;
    pick_operator(builder, id)?;
    pick_value(builder, id)?;

    Ok(())
}

fn pick_column(builder: &mut FilterBuilder, id: &FilterId) -> Result<(), Error> {
    let Some(editor) = builder.editor(id) else {
        return Ok(());
    };

    let columns = editor.selectable_columns();
    if columns.is_empty() {
        Err(InternalError("This dataset has no filterable columns".to_string()))?;
    }

    let labels: Vec<String> = columns.iter().map(|column| column_label(column)).collect();
    let current = columns
        .iter()
        .position(|column| column.id == editor.condition().column);

    let picked = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Column")
        .items(&labels)
        .default(current.unwrap_or(0))
        .interact()?;

    // re-picking the same column would reset the row
    if Some(picked) != current {
        let column_id = columns[picked].id.clone();
        builder.select_column(id, &column_id);
    }

    Ok(())
}

fn column_label(column: &rusty_filters::ColumnDefinition) -> String {
    match &column.description {
        Some(description) => format!("{} - {}", column.label, description),
        None => column.label.clone(),
    }
}

fn pick_operator(builder: &mut FilterBuilder, id: &FilterId) -> Result<(), Error> {
    let Some(editor) = builder.editor(id) else {
        return Ok(());
    };

    let operators = editor.operators();
    if operators.is_empty() {
        return Ok(());
    }

    let labels: Vec<&str> = operators.iter().map(|operator| operator.label()).collect();
    let current = operators
        .iter()
        .position(|operator| *operator == editor.condition().operator);

    let picked = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Operator")
        .items(&labels)
        .default(current.unwrap_or(0))
        .interact()?;

    if Some(picked) != current {
        let operator = operators[picked];
        builder.select_operator(id, operator);
    }

    Ok(())
}

fn pick_value(builder: &mut FilterBuilder, id: &FilterId) -> Result<(), Error> {
    let Some(editor) = builder.editor(id) else {
        return Ok(());
    };

    let shape = editor.input_shape();
    let current_text = editor.display_text();
    let current_value = editor.condition().value.clone();

    match shape {
        InputShape::None => {}
        InputShape::MultiSelect(options) => {
            let selected: Vec<bool> = options
                .iter()
                .map(|option| is_selected(&current_value, option))
                .collect();

            println!(
                "Use arrow keys (⬆⬇) to navigate, {} to select, and {} to confirm.",
                "<space>".bold(),
                "<enter>".bold(),
            );

            let picked = MultiSelect::with_theme(&ColorfulTheme::default())
                .with_prompt("Values")
                .items(&option_labels(&options))
                .defaults(&selected)
                .interact()?;

            // same trick as with the columns, we can't move out of options by index
            let values = options
                .into_iter()
                .enumerate()
                .filter(|(index, _)| picked.contains(index))
                .map(|(_, option)| option.value)
                .collect();

            builder.choose_many(id, values);
        }
        InputShape::SingleSelect(options) => {
            let current = options
                .iter()
                .position(|option| is_selected(&current_value, option));

            let picked = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Value")
                .items(&option_labels(&options))
                .default(current.unwrap_or(0))
                .interact()?;

            builder.choose(id, &options[picked].value);
        }
        InputShape::Numeric { unit } => {
            let prompt = match unit {
                Some(unit) => format!("Value ({unit})"),
                None => "Value".to_string(),
            };

            let input = ask_text(prompt, current_text)?;
            builder.enter_text(id, &input);
        }
        InputShape::DateTime => {
            let input = ask_text("Value (date/time)".to_string(), current_text)?;
            builder.enter_text(id, &input);
        }
        InputShape::Text { multiple } => {
            let prompt = if multiple {
                "Values, comma separated"
            } else {
                "Value"
            };

            let input = ask_text(prompt.to_string(), current_text)?;
            builder.enter_text(id, &input);
        }
    }

    Ok(())
}

fn ask_text(prompt: String, initial_text: String) -> Result<String, Error> {
    Ok(Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .with_initial_text(initial_text)
        .allow_empty(true)
        .interact_text()?)
}

fn option_labels(options: &[ColumnOption]) -> Vec<&str> {
    options.iter().map(|option| option.label.as_str()).collect()
}

fn is_selected(value: &FilterValue, option: &ColumnOption) -> bool {
    match value {
        FilterValue::MultiValue(Some(values)) => values.contains(&option.value),
        FilterValue::Scalar(Some(scalar)) => scalar.to_string() == option.value,
        _ => false,
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::Add => "Add filter",
            Action::Edit => "Edit filter",
            Action::Remove => "Remove filter",
            Action::ClearAll => "Clear all",
            Action::Apply => "Apply",
            Action::ClearAndApply => "Clear and apply",
            Action::Cancel => "Cancel",
        };

        write!(f, "{label}")
    }
}
