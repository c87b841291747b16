use anyhow::{Context, Result};
use tracing::info;

use crate::cli::CombineArgs;
use crate::engine::combine::{combine, percent_table};
use crate::model::CombinedTable;
use crate::tableio::{InterchangeTable, read_interchange_table, write_combined_table};

pub fn run(args: CombineArgs) -> Result<()> {
    let mut tables: Vec<CombinedTable> = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let table = match read_interchange_table(input)? {
            InterchangeTable::Occurrence(occurrence) => percent_table(&occurrence),
            InterchangeTable::Combined(combined) => combined,
        };
        tables.push(table);
    }

    let combined = combine(&tables)
        .with_context(|| format!("failed to combine {} input tables", tables.len()))?;

    write_combined_table(&args.out, &combined)?;
    info!(
        inputs = args.inputs.len(),
        columns = combined.columns.len(),
        rows = combined.rows.len(),
        path = %args.out.display(),
        "wrote combined occurrence table"
    );

    Ok(())
}
