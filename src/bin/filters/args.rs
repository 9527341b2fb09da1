use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Creates a dataset from a JSON file describing its columns.
    ///
    /// Datasets let the filters command switch between different kinds of data.
    CreateDataset(DatasetParams),
    /// Selects an existing dataset.
    UseDataset { name: String },
    /// List available datasets.
    ListDatasets,
    /// Shows the filters applied to the current dataset.
    Show,
    /// Replaces the applied filters, e.g. `filters set 'status = active; latency > 100'`.
    ///
    /// Incomplete filters are dropped, just like when applying them interactively.
    Set { input: String },
    /// Opens the interactive filter builder for the current dataset.
    Edit,
    /// Removes all applied filters from the current dataset.
    Clear,
    /// Prints the records from a JSON file that match the applied filters.
    Check {
        /// A JSON array of objects.
        records: PathBuf,
    },
    /// Runs a local HTTP server exposing the operator tables and the filter parser.
    Serve(ServeParams),
}

#[derive(clap::Args, Debug)]
pub struct DatasetParams {
    /// You can reuse your dataset by referencing this name
    pub name: String,
    /// JSON file with the columns, filter options and builder settings
    #[arg(short, long)]
    pub columns: PathBuf,
    /// Use the new dataset
    #[arg(long = "use")]
    pub use_it: bool,
}

#[derive(clap::Args, Debug)]
pub struct ServeParams {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:33334")]
    pub listen: String,
    /// Origin allowed to call the server from a browser
    #[arg(long, default_value = "http://localhost:3000")]
    pub allow_origin: String,
}
