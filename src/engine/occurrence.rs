use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EngineError, EngineResult};
use crate::model::{Observation, OccurrenceRow, OccurrenceTable};

/// Number of distinct record identifiers in a slice of observations. The
/// usual source of the aggregator's `total_records` argument.
pub fn distinct_record_count(observations: &[Observation]) -> u64 {
    observations
        .iter()
        .map(|obs| obs.record.as_str())
        .collect::<BTreeSet<_>>()
        .len() as u64
}

/// Flattens repeated (collection, record, path) observations into one row
/// per key, content values joined by ", ": a vertical view of what each
/// record says for each path. Occurrence math keeps counting the repeats
/// separately; this view exists for per-record content export.
pub fn record_content_view(observations: &[Observation]) -> Vec<Observation> {
    let mut groups: BTreeMap<(&str, &str, &str), Vec<&str>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((
                obs.collection.as_str(),
                obs.record.as_str(),
                obs.path.as_str(),
            ))
            .or_default()
            .push(obs.content.as_str());
    }

    groups
        .into_iter()
        .map(|((collection, record, path), contents)| Observation {
            collection: collection.to_string(),
            record: record.to_string(),
            path: path.to_string(),
            content: contents.join(", "),
        })
        .collect()
}

/// Builds the occurrence table for a single collection.
///
/// `collection_id` is a label attached to the output, not a filter; the
/// caller partitions observations by collection beforehand. `total_records`
/// is the distinct record count of the collection and is taken explicitly
/// rather than re-derived from any formatted value.
///
/// Row 0 of the result is the "Number of Records" sentinel; the remaining
/// rows are the observed paths in lexicographic order.
pub fn aggregate_occurrence(
    observations: &[Observation],
    collection_id: &str,
    total_records: u64,
) -> EngineResult<OccurrenceTable> {
    if observations.is_empty() || total_records == 0 {
        return Err(EngineError::EmptyInput);
    }

    let distinct = distinct_record_count(observations);
    if distinct > total_records {
        return Err(EngineError::InvalidTotal {
            total: total_records,
            distinct,
        });
    }

    // path -> record -> within-record occurrence count
    let mut groups: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
    for obs in observations {
        *groups
            .entry(obs.path.as_str())
            .or_default()
            .entry(obs.record.as_str())
            .or_insert(0) += 1;
    }

    let total = total_records as f64;
    let mut rows = Vec::with_capacity(groups.len() + 1);
    rows.push(OccurrenceTable::sentinel_row(total_records));

    for (path, per_record) in &groups {
        let xpath_count: u64 = per_record.values().sum();
        let record_count = per_record.len() as u64;

        rows.push(OccurrenceRow {
            path: (*path).to_string(),
            xpath_count,
            record_count,
            average_occurrence_per_record: xpath_count as f64 / total,
            collection_occurrence_percent: record_count as f64 / total,
        });
    }

    Ok(OccurrenceTable {
        collection: collection_id.to_string(),
        total_records,
        rows,
    })
}
