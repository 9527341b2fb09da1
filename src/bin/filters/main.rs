mod args;
mod commands;

use args::{Args, Command, DatasetParams};
use clap::Parser;
use rusty_filters::context::{Dataset, DatasetDefinition, DatasetName};
use rusty_filters::{cache, InternalError};
use std::fs;

fn main() {
    env_logger::init();

    let args = Args::parse();

    let result = match args.command {
        Command::CreateDataset(params) => create_dataset(params),
        Command::UseDataset { name } => use_dataset(name),
        Command::ListDatasets => list_datasets(),
        Command::Show => commands::show(),
        Command::Set { input } => commands::set(input),
        Command::Edit => commands::edit::edit(),
        Command::Clear => commands::clear(),
        Command::Check { records } => commands::check(records),
        Command::Serve(params) => commands::filter_server::run(params),
    };

    if let Err(error) = result {
        commands::exit_with(error);
    }
}

fn create_dataset(params: DatasetParams) -> Result<(), rusty_filters::Error> {
    let definition: DatasetDefinition =
        serde_json::from_reader(fs::File::open(&params.columns)?)?;

    let name: DatasetName = params.name.into();
    name.validate()?;
    validate_definition(&definition)?;

    let dataset = Dataset { name, definition };

    cache::write(&dataset)?;

    println!("Created new dataset \x1b[1m{}\x1b[0m.", dataset.name);

    if params.use_it {
        use_dataset(dataset.name.into())?;
    } else {
        println!(
            "Switch to it by running \x1b[1mfilters use-dataset {}\x1b[0m.",
            dataset.name
        );
    }

    Ok(())
}

fn validate_definition(definition: &DatasetDefinition) -> Result<(), rusty_filters::Error> {
    if definition.columns.is_empty() {
        Err(InternalError(
            "A dataset needs at least one column. See --help for more info".to_string(),
        ))?;
    }

    if definition.settings.max_filters == 0 {
        Err(InternalError(
            "max_filters must be at least 1".to_string(),
        ))?;
    }

    Ok(())
}

fn use_dataset(name: String) -> Result<(), rusty_filters::Error> {
    let dataset_name: DatasetName = name.into();
    dataset_name.validate()?;

    // make sure it exists before switching to it
    let _: Dataset = cache::read(&dataset_name)?;

    cache::write(&dataset_name)?;

    println!("Switched to dataset \x1b[1m{}\x1b[0m.", dataset_name);

    Ok(())
}

fn list_datasets() -> Result<(), rusty_filters::Error> {
    use colored::Colorize;

    // there is no current dataset before the first use-dataset
    let current_dataset = DatasetName::current().ok();
    let known_datasets: Vec<Dataset> = cache::read_all()?;

    println!("Available datasets:");
    for dataset in &known_datasets {
        println!(
            "{}{}: {} columns",
            if current_dataset.as_ref() == Some(&dataset.name) {
                " * ".bold()
            } else {
                "   ".into()
            },
            dataset.name.to_string().bold(),
            dataset.definition.columns.len(),
        )
    }

    Ok(())
}
