use crate::engine::ordered::OrderedSet;
use crate::error::{EngineError, EngineResult};
use crate::model::{CombinedRow, CombinedTable, OccurrenceTable, SENTINEL_PATH};

/// Views a single-collection occurrence table as a one-column percent
/// table, keyed by path with the collection id as the column label. The
/// sentinel row carries the record total, so it survives combination.
pub fn percent_table(table: &OccurrenceTable) -> CombinedTable {
    let rows = table
        .rows
        .iter()
        .map(|row| CombinedRow {
            path: row.path.clone(),
            values: vec![row.collection_occurrence_percent],
        })
        .collect();

    CombinedTable {
        columns: vec![table.collection.clone()],
        rows,
    }
}

/// Pivots the union of the input tables on path x column. A path absent
/// from one input is 0% occurrence there, not unknown. Inputs may already
/// be combined tables, so combining is associative up to ordering.
///
/// Post-condition: when any input carried the "Number of Records" sentinel,
/// the combined table has it back at row 0.
pub fn combine(tables: &[CombinedTable]) -> EngineResult<CombinedTable> {
    if tables.is_empty() {
        return Err(EngineError::NoInput);
    }

    let mut column_set = OrderedSet::new();
    for table in tables {
        for column in &table.columns {
            if !column_set.insert(column) {
                return Err(EngineError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }
    }
    let columns = column_set.into_vec();

    // Row order: first-seen across inputs, sentinel fixed up afterwards.
    let mut paths = OrderedSet::new();
    for table in tables {
        for row in &table.rows {
            paths.insert(&row.path);
        }
    }

    let mut rows = Vec::with_capacity(paths.len());
    for path in paths.iter() {
        let mut values = Vec::with_capacity(columns.len());
        for table in tables {
            match table.rows.iter().find(|row| row.path == path) {
                Some(row) => values.extend_from_slice(&row.values),
                None => values.extend(std::iter::repeat(0.0).take(table.columns.len())),
            }
        }
        rows.push(CombinedRow {
            path: path.to_string(),
            values,
        });
    }

    if let Some(position) = rows.iter().position(|row| row.path == SENTINEL_PATH) {
        if position != 0 {
            let sentinel = rows.remove(position);
            rows.insert(0, sentinel);
        }
    }

    Ok(CombinedTable { columns, rows })
}
