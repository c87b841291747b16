use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RollupArgs;
use crate::engine::combine::percent_table;
use crate::engine::rollup::{pad_years, roll_up, strip_site_prefix};
use crate::model::{CombinedTable, SITE_SEPARATOR};
use crate::report::ChartSpec;
use crate::tableio::{
    InterchangeTable, read_interchange_table, read_recommendation_spec, write_completeness_table,
};
use crate::util::{ensure_directory, write_json_pretty};

pub fn run(args: RollupArgs) -> Result<()> {
    let table = match read_interchange_table(&args.combined)? {
        InterchangeTable::Occurrence(occurrence) => percent_table(&occurrence),
        InterchangeTable::Combined(combined) => combined,
    };
    let spec = read_recommendation_spec(&args.spec)?;

    let completeness = roll_up(&table, &spec).with_context(|| {
        format!(
            "failed to roll {} up to {} concepts",
            args.combined.display(),
            spec.name
        )
    })?;

    ensure_directory(&args.out_dir)?;
    let site = args.site.clone().unwrap_or_else(|| site_label(&table));

    // Two persisted variants: raw column labels for per-site reports, and
    // site-stripped, year-padded columns for cross-site comparison.
    let raw_path = args
        .out_dir
        .join(format!("{site}_{}Complete.csv", spec.name));
    write_completeness_table(&raw_path, &completeness)?;

    let comparable = pad_years(&strip_site_prefix(&completeness), &spec.years);
    let comparable_path = args
        .out_dir
        .join(format!("{site}_{}Completeness.csv", spec.name));
    write_completeness_table(&comparable_path, &comparable)?;

    // The chart emitter consumes this spec; axis order is fixed so charts
    // stay comparable across runs.
    let chart_spec = ChartSpec::from_completeness(&comparable, &format!("{site} {}", spec.name));
    let chart_spec_path = args
        .out_dir
        .join(format!("{site}_{}ChartSpec.json", spec.name));
    write_json_pretty(&chart_spec_path, &chart_spec)?;

    info!(
        recommendation = %spec.name,
        site = %site,
        concepts = completeness.rows.len() - 1,
        raw = %raw_path.display(),
        comparable = %comparable_path.display(),
        chart_spec = %chart_spec_path.display(),
        "wrote completeness tables"
    );

    Ok(())
}

/// Site prefix shared by every column label, when there is one.
fn site_label(table: &CombinedTable) -> String {
    let mut prefixes = table
        .columns
        .iter()
        .filter_map(|column| column.split_once(SITE_SEPARATOR).map(|(prefix, _)| prefix));

    match prefixes.next() {
        Some(first) if prefixes.all(|prefix| prefix == first) => first.to_string(),
        _ => "combinedCollections".to_string(),
    }
}
