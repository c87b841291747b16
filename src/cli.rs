use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "mdeval",
    version,
    about = "Metadata recommendation completeness evaluation tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Aggregate per-path occurrence statistics for each collection
    Occurrence(OccurrenceArgs),
    /// Filter an occurrence table down to one recommendation's elements
    Recommend(RecommendArgs),
    /// Merge occurrence tables into one multi-collection percent table
    Combine(CombineArgs),
    /// Roll a combined table up to concept-level completeness
    Rollup(RollupArgs),
    /// Report which interchange artifacts exist under the data root
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct OccurrenceArgs {
    /// Long-form observation table (Collection,Record,XPath,Content)
    #[arg(long)]
    pub observations: PathBuf,

    #[arg(long, default_value = "data")]
    pub out_dir: PathBuf,

    /// Restrict aggregation to these collections; repeatable
    #[arg(long = "collection")]
    pub collections: Vec<String>,

    /// Recommendation spec; when given, observations are narrowed to its
    /// elements before aggregation
    #[arg(long)]
    pub spec: Option<PathBuf>,

    /// Also write a per-record content view (repeated paths joined) here
    #[arg(long)]
    pub content_view: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RecommendArgs {
    /// Occurrence table to filter
    #[arg(long)]
    pub occurrence: PathBuf,

    /// Recommendation spec (JSON)
    #[arg(long)]
    pub spec: PathBuf,

    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CombineArgs {
    /// Occurrence or combined tables to merge; repeatable, order defines
    /// column order
    #[arg(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RollupArgs {
    /// Combined (or single-collection occurrence) table to roll up
    #[arg(long)]
    pub combined: PathBuf,

    /// Recommendation spec (JSON)
    #[arg(long)]
    pub spec: PathBuf,

    #[arg(long, default_value = "data")]
    pub out_dir: PathBuf,

    /// Label used in output filenames; defaults to the table's site when
    /// column labels carry one, otherwise "combinedCollections"
    #[arg(long)]
    pub site: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data")]
    pub data_root: PathBuf,
}
