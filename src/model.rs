use serde::{Deserialize, Serialize};

/// Synthetic first row of every occurrence table. Its numeric fields all
/// carry the collection's total record count, which downstream consumers
/// use as the denominator row.
pub const SENTINEL_PATH: &str = "Number of Records";

/// Label of the synthetic mean row prepended by the concept roll-up.
pub const AVERAGE_ROW_LABEL: &str = "Average Completeness";

/// Separator between a site prefix and the year in combined column labels,
/// e.g. `ARC__2014`.
pub const SITE_SEPARATOR: &str = "__";

/// One occurrence of an element or attribute at a given path in a given
/// record. The same (collection, record, path) may appear on multiple rows
/// when the path repeats within the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub collection: String,
    pub record: String,
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceRow {
    pub path: String,
    /// Total occurrences of the path across all records of the collection.
    pub xpath_count: u64,
    /// Distinct records containing the path at least once.
    pub record_count: u64,
    pub average_occurrence_per_record: f64,
    /// record_count / total_records, in [0, 1] for all non-sentinel rows.
    pub collection_occurrence_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceTable {
    pub collection: String,
    pub total_records: u64,
    /// Row 0 is always the sentinel row.
    pub rows: Vec<OccurrenceRow>,
}

impl OccurrenceTable {
    pub fn sentinel_row(total_records: u64) -> OccurrenceRow {
        let total = total_records as f64;
        OccurrenceRow {
            path: SENTINEL_PATH.to_string(),
            xpath_count: total_records,
            record_count: total_records,
            average_occurrence_per_record: total,
            collection_occurrence_percent: total,
        }
    }

    /// Rows other than the sentinel, in table order.
    pub fn data_rows(&self) -> impl Iterator<Item = &OccurrenceRow> {
        self.rows.iter().filter(|row| row.path != SENTINEL_PATH)
    }
}

/// Union of occurrence tables pivoted on path: one column per collection or
/// time slice, cell = that column's occurrence percent (0 when the column
/// never observed the path).
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    pub columns: Vec<String>,
    pub rows: Vec<CombinedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
    pub path: String,
    pub values: Vec<f64>,
}

/// A community recommendation: which element paths it expects, how they
/// roll up to concepts, and the canonical display ordering.
///
/// `concept_map` entries are matched against paths in declaration order and
/// the first matching key wins, so overlapping keys are allowed but their
/// priority is explicit in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSpec {
    pub name: String,
    /// Ordered path fragments defining membership and display order.
    pub elements: Vec<String>,
    pub concept_map: Vec<ConceptMapping>,
    /// Aligned positionally with `element_order`.
    pub level_order: Vec<String>,
    /// Aligned positionally with `element_order`.
    pub concept_order: Vec<String>,
    /// Canonical concept ordering; also the chart axis order.
    pub element_order: Vec<String>,
    /// Year columns every completeness table must carry, in display order.
    pub years: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptMapping {
    /// Substring matched against element paths.
    pub key: String,
    pub concept: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessRow {
    pub concept: String,
    pub level: String,
    pub element: String,
    pub values: Vec<f64>,
}

/// Concept-level completeness, one numeric column per collection or year.
/// Row 0 is always the "Average Completeness" row.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessTable {
    pub columns: Vec<String>,
    pub rows: Vec<CompletenessRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub collection: String,
    pub record_count: u64,
    pub path_count: usize,
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionFailure {
    pub collection: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub observations_path: String,
    pub observations_sha256: String,
    pub collections: Vec<CollectionSummary>,
    pub failures: Vec<CollectionFailure>,
}
