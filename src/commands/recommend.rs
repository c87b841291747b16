use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RecommendArgs;
use crate::engine::filter::filter_by_recommendation;
use crate::tableio::{read_occurrence_table, read_recommendation_spec, write_occurrence_table};

pub fn run(args: RecommendArgs) -> Result<()> {
    let table = read_occurrence_table(&args.occurrence)?;
    let spec = read_recommendation_spec(&args.spec)?;

    let filtered = filter_by_recommendation(&table, &spec.elements).with_context(|| {
        format!(
            "recommendation {} is vacuous for collection {}",
            spec.name, table.collection
        )
    })?;

    write_occurrence_table(&args.out, &filtered)?;
    info!(
        recommendation = %spec.name,
        collection = %filtered.collection,
        rows = filtered.rows.len() - 1,
        path = %args.out.display(),
        "wrote recommendation occurrence table"
    );

    Ok(())
}
