use std::collections::HashMap;

use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::model::{
    AVERAGE_ROW_LABEL, CombinedTable, CompletenessRow, CompletenessTable, RecommendationSpec,
    SENTINEL_PATH, SITE_SEPARATOR,
};

/// Rolls a path-keyed percent table up to recommendation concepts.
///
/// Each path resolves to the concept of the first `concept_map` entry whose
/// key it contains; a path matching no key is a hard error. Rows sharing a
/// concept take the element-wise maximum per column, i.e. the best observed
/// completeness of any path under the concept. The result is reindexed to
/// `element_order` (absent concepts become all-zero rows), given `RecConcept`
/// and `RecLevel` metadata positionally, and prefixed with an
/// "Average Completeness" row holding the column-wise mean of all others.
///
/// The "Number of Records" sentinel never participates in concept
/// resolution.
pub fn roll_up(table: &CombinedTable, spec: &RecommendationSpec) -> EngineResult<CompletenessTable> {
    if spec.concept_order.len() != spec.element_order.len() {
        return Err(EngineError::LengthMismatch {
            list: "concept order",
            expected: spec.element_order.len(),
            actual: spec.concept_order.len(),
        });
    }
    if spec.level_order.len() != spec.element_order.len() {
        return Err(EngineError::LengthMismatch {
            list: "level order",
            expected: spec.element_order.len(),
            actual: spec.level_order.len(),
        });
    }

    let width = table.columns.len();
    let mut by_concept: HashMap<&str, Vec<f64>> = HashMap::new();

    for row in &table.rows {
        if row.path == SENTINEL_PATH {
            continue;
        }

        let concept = resolve_concept(&row.path, spec).ok_or_else(|| {
            EngineError::UndefinedConcept {
                path: row.path.clone(),
            }
        })?;

        let best = by_concept.entry(concept).or_insert_with(|| vec![0.0; width]);
        for (cell, value) in best.iter_mut().zip(&row.values) {
            if *value > *cell {
                *cell = *value;
            }
        }
    }

    for concept in by_concept.keys() {
        if !spec.element_order.iter().any(|element| element == concept) {
            warn!(concept = %concept, "concept observed in data but absent from element order; dropped");
        }
    }

    let mut rows = Vec::with_capacity(spec.element_order.len() + 1);
    for (index, element) in spec.element_order.iter().enumerate() {
        let values = by_concept
            .get(element.as_str())
            .cloned()
            .unwrap_or_else(|| vec![0.0; width]);

        rows.push(CompletenessRow {
            concept: spec.concept_order[index].clone(),
            level: spec.level_order[index].clone(),
            element: element.clone(),
            values,
        });
    }

    let average = average_row(&rows, width);
    rows.insert(0, average);

    Ok(CompletenessTable {
        columns: table.columns.clone(),
        rows,
    })
}

/// First-declared matching key wins; declaration order is the documented
/// priority for overlapping keys.
fn resolve_concept<'a>(path: &str, spec: &'a RecommendationSpec) -> Option<&'a str> {
    spec.concept_map
        .iter()
        .find(|mapping| path.contains(&mapping.key))
        .map(|mapping| mapping.concept.as_str())
}

fn average_row(rows: &[CompletenessRow], width: usize) -> CompletenessRow {
    let mut values = vec![0.0; width];
    if !rows.is_empty() {
        for row in rows {
            for (sum, value) in values.iter_mut().zip(&row.values) {
                *sum += *value;
            }
        }
        for sum in &mut values {
            *sum /= rows.len() as f64;
        }
    }

    CompletenessRow {
        concept: String::new(),
        level: String::new(),
        element: AVERAGE_ROW_LABEL.to_string(),
        values,
    }
}

/// Drops the site prefix from every column label, keeping the part after
/// the last double-underscore separator: `ARC__2014` becomes `2014`.
/// Labels without a separator are kept as-is.
pub fn strip_site_prefix(table: &CompletenessTable) -> CompletenessTable {
    let columns = table
        .columns
        .iter()
        .map(|column| {
            column
                .rsplit_once(SITE_SEPARATOR)
                .map(|(_, suffix)| suffix.to_string())
                .unwrap_or_else(|| column.clone())
        })
        .collect();

    CompletenessTable {
        columns,
        rows: table.rows.clone(),
    }
}

/// Reshapes a completeness table to exactly the caller-specified year
/// columns, in caller order. Years absent from the data are inserted as
/// constant-zero columns (including in the average row); data columns not
/// named in `years` are dropped.
pub fn pad_years(table: &CompletenessTable, years: &[String]) -> CompletenessTable {
    let positions: Vec<Option<usize>> = years
        .iter()
        .map(|year| table.columns.iter().position(|column| column == year))
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| CompletenessRow {
            concept: row.concept.clone(),
            level: row.level.clone(),
            element: row.element.clone(),
            values: positions
                .iter()
                .map(|position| position.map(|i| row.values[i]).unwrap_or(0.0))
                .collect(),
        })
        .collect();

    CompletenessTable {
        columns: years.to_vec(),
        rows,
    }
}
