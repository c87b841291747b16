//! CSV interchange for every table kind. These files are the contract
//! between the aggregation core and the spreadsheet/chart emitters, so the
//! writers preserve the row and column ordering the engine guarantees.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::error::EngineError;
use crate::model::{
    CombinedRow, CombinedTable, CompletenessRow, CompletenessTable, Observation, OccurrenceRow,
    OccurrenceTable, RecommendationSpec, SENTINEL_PATH,
};
use crate::util::ensure_directory;

const OBSERVATION_HEADER: [&str; 4] = ["Collection", "Record", "XPath", "Content"];
const OCCURRENCE_HEADER: [&str; 6] = [
    "XPath",
    "Collection",
    "XPathCount",
    "RecordCount",
    "AverageOccurrencePerRecord",
    "CollectionOccurrence%",
];
const COMPLETENESS_HEADER: [&str; 3] = ["RecConcept", "RecLevel", "RecElement"];

pub fn read_observations(path: &Path) -> Result<Vec<Observation>> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    require_columns(&headers, &OBSERVATION_HEADER, path)?;

    let indices: Vec<usize> = OBSERVATION_HEADER
        .iter()
        .copied()
        .map(|name| column_index(&headers, name))
        .collect::<std::result::Result<_, _>>()?;

    let mut observations = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("failed to read row {} of {}", line + 2, path.display()))?;
        observations.push(Observation {
            collection: record[indices[0]].to_string(),
            record: record[indices[1]].to_string(),
            path: record[indices[2]].to_string(),
            content: record[indices[3]].to_string(),
        });
    }

    Ok(observations)
}

pub fn write_observations(path: &Path, observations: &[Observation]) -> Result<()> {
    let mut writer = open_writer(path)?;
    writer
        .write_record(OBSERVATION_HEADER)
        .with_context(|| format!("failed to write header of {}", path.display()))?;

    for obs in observations {
        writer
            .write_record([&obs.collection, &obs.record, &obs.path, &obs.content])
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))
}

pub fn write_occurrence_table(path: &Path, table: &OccurrenceTable) -> Result<()> {
    let mut writer = open_writer(path)?;
    writer
        .write_record(OCCURRENCE_HEADER)
        .with_context(|| format!("failed to write header of {}", path.display()))?;

    for row in &table.rows {
        let record = if row.path == SENTINEL_PATH {
            // The sentinel stores the record total in all four fields, as
            // integers, so downstream denominator lookups stay exact.
            vec![
                row.path.clone(),
                table.collection.clone(),
                table.total_records.to_string(),
                table.total_records.to_string(),
                table.total_records.to_string(),
                table.total_records.to_string(),
            ]
        } else {
            vec![
                row.path.clone(),
                table.collection.clone(),
                row.xpath_count.to_string(),
                row.record_count.to_string(),
                format!("{:.2}", row.average_occurrence_per_record),
                row.collection_occurrence_percent.to_string(),
            ]
        };
        writer
            .write_record(&record)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))
}

pub fn read_occurrence_table(path: &Path) -> Result<OccurrenceTable> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    require_columns(&headers, &OCCURRENCE_HEADER, path)?;

    // Fields are looked up by header name, so a column-reordered file
    // loads the same data or fails, never silently swaps counts.
    let indices: Vec<usize> = OCCURRENCE_HEADER
        .iter()
        .copied()
        .map(|name| column_index(&headers, name))
        .collect::<std::result::Result<_, _>>()?;

    let mut collection = String::new();
    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("failed to read row {} of {}", line + 2, path.display()))?;

        if collection.is_empty() {
            collection = record[indices[1]].to_string();
        }

        rows.push(OccurrenceRow {
            path: record[indices[0]].to_string(),
            xpath_count: parse_u64(&record[indices[2]], path)?,
            record_count: parse_u64(&record[indices[3]], path)?,
            average_occurrence_per_record: parse_f64(&record[indices[4]], path)?,
            collection_occurrence_percent: parse_f64(&record[indices[5]], path)?,
        });
    }

    let total_records = match rows.first() {
        Some(row) if row.path == SENTINEL_PATH => row.xpath_count,
        _ => bail!(
            "first data row of {} is not the \"{}\" sentinel",
            path.display(),
            SENTINEL_PATH
        ),
    };

    Ok(OccurrenceTable {
        collection,
        total_records,
        rows,
    })
}

pub fn write_combined_table(path: &Path, table: &CombinedTable) -> Result<()> {
    let mut writer = open_writer(path)?;

    let mut header = vec!["XPath".to_string()];
    header.extend(table.columns.iter().cloned());
    writer
        .write_record(&header)
        .with_context(|| format!("failed to write header of {}", path.display()))?;

    for row in &table.rows {
        let mut record = vec![row.path.clone()];
        record.extend(row.values.iter().map(f64::to_string));
        writer
            .write_record(&record)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))
}

pub fn read_combined_table(path: &Path) -> Result<CombinedTable> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    require_prefix(&headers, &["XPath"], path)?;

    let columns: Vec<String> = headers.iter().skip(1).map(ToOwned::to_owned).collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("failed to read row {} of {}", line + 2, path.display()))?;

        let mut values = Vec::with_capacity(columns.len());
        for field in record.iter().skip(1) {
            values.push(parse_f64(field, path)?);
        }

        rows.push(CombinedRow {
            path: record[0].to_string(),
            values,
        });
    }

    Ok(CombinedTable { columns, rows })
}

/// Detects whether a CSV is a single-collection occurrence table or an
/// already-combined percent table, and reads it accordingly. Combine-style
/// commands accept either.
pub enum InterchangeTable {
    Occurrence(OccurrenceTable),
    Combined(CombinedTable),
}

pub fn read_interchange_table(path: &Path) -> Result<InterchangeTable> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();

    let is_occurrence = headers.len() == OCCURRENCE_HEADER.len()
        && headers.iter().zip(OCCURRENCE_HEADER).all(|(a, b)| a == b);
    drop(reader);

    if is_occurrence {
        Ok(InterchangeTable::Occurrence(read_occurrence_table(path)?))
    } else {
        Ok(InterchangeTable::Combined(read_combined_table(path)?))
    }
}

pub fn write_completeness_table(path: &Path, table: &CompletenessTable) -> Result<()> {
    let mut writer = open_writer(path)?;

    let mut header: Vec<String> = COMPLETENESS_HEADER.iter().map(|s| s.to_string()).collect();
    header.extend(table.columns.iter().cloned());
    writer
        .write_record(&header)
        .with_context(|| format!("failed to write header of {}", path.display()))?;

    for row in &table.rows {
        let mut record = vec![row.concept.clone(), row.level.clone(), row.element.clone()];
        record.extend(row.values.iter().map(f64::to_string));
        writer
            .write_record(&record)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))
}

pub fn read_completeness_table(path: &Path) -> Result<CompletenessTable> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    require_prefix(&headers, &COMPLETENESS_HEADER, path)?;

    let columns: Vec<String> = headers.iter().skip(3).map(ToOwned::to_owned).collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("failed to read row {} of {}", line + 2, path.display()))?;

        let mut values = Vec::with_capacity(columns.len());
        for field in record.iter().skip(3) {
            values.push(parse_f64(field, path)?);
        }

        rows.push(CompletenessRow {
            concept: record[0].to_string(),
            level: record[1].to_string(),
            element: record[2].to_string(),
            values,
        });
    }

    Ok(CompletenessTable { columns, rows })
}

pub fn read_recommendation_spec(path: &Path) -> Result<RecommendationSpec> {
    let raw = std::fs::read(path)
        .with_context(|| format!("failed to read recommendation spec {}", path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse recommendation spec {}", path.display()))
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    ReaderBuilder::new()
        .flexible(false)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

fn open_writer(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))
}

fn require_columns(headers: &StringRecord, required: &[&str], path: &Path) -> Result<()> {
    for name in required {
        if !headers.iter().any(|header| header == *name) {
            return Err(EngineError::Schema {
                column: name.to_string(),
            })
            .with_context(|| format!("invalid table header in {}", path.display()));
        }
    }
    Ok(())
}

/// The named columns must open the header in this exact order; everything
/// after them is positional data, so presence alone is not enough.
fn require_prefix(headers: &StringRecord, required: &[&str], path: &Path) -> Result<()> {
    for (position, name) in required.iter().enumerate() {
        if headers.get(position) != Some(*name) {
            return Err(EngineError::Schema {
                column: name.to_string(),
            })
            .with_context(|| format!("invalid table header in {}", path.display()));
        }
    }
    Ok(())
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| {
            EngineError::Schema {
                column: name.to_string(),
            }
            .into()
        })
}

fn parse_u64(field: &str, path: &Path) -> Result<u64> {
    field
        .parse::<u64>()
        .with_context(|| format!("invalid integer {:?} in {}", field, path.display()))
}

fn parse_f64(field: &str, path: &Path) -> Result<f64> {
    field
        .parse::<f64>()
        .with_context(|| format!("invalid number {:?} in {}", field, path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::occurrence::aggregate_occurrence;

    fn sample_observations() -> Vec<Observation> {
        vec![
            Observation {
                collection: "arc_2014".to_string(),
                record: "r1.xml".to_string(),
                path: "/a/b".to_string(),
                content: "first".to_string(),
            },
            Observation {
                collection: "arc_2014".to_string(),
                record: "r2.xml".to_string(),
                path: "/a/b".to_string(),
                content: "second".to_string(),
            },
        ]
    }

    #[test]
    fn observations_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.csv");

        write_observations(&path, &sample_observations()).unwrap();

        let observations = read_observations(&path).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].collection, "arc_2014");
        assert_eq!(observations[1].record, "r2.xml");
        assert_eq!(observations[0].path, "/a/b");
    }

    #[test]
    fn observation_header_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "Collection,Record,Content\na,b,c\n").unwrap();

        let err = read_observations(&path).unwrap_err();
        let engine = err.downcast_ref::<EngineError>().unwrap();
        assert!(matches!(engine, EngineError::Schema { column } if column == "XPath"));
    }

    #[test]
    fn occurrence_table_round_trips_with_sentinel_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arc_2014_Occurrence.csv");

        let table = aggregate_occurrence(&sample_observations(), "arc_2014", 4).unwrap();
        write_occurrence_table(&path, &table).unwrap();

        let read_back = read_occurrence_table(&path).unwrap();
        assert_eq!(read_back.collection, "arc_2014");
        assert_eq!(read_back.total_records, 4);
        assert_eq!(read_back.rows[0].path, SENTINEL_PATH);

        let row = read_back.rows.iter().find(|r| r.path == "/a/b").unwrap();
        assert_eq!(row.xpath_count, 2);
        assert_eq!(row.record_count, 2);
        assert!((row.collection_occurrence_percent - 0.5).abs() < 1e-9);
    }

    #[test]
    fn occurrence_table_without_sentinel_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(
            &path,
            "XPath,Collection,XPathCount,RecordCount,AverageOccurrencePerRecord,CollectionOccurrence%\n\
             /a/b,arc_2014,2,2,0.50,0.5\n",
        )
        .unwrap();

        assert!(read_occurrence_table(&path).is_err());
    }

    #[test]
    fn occurrence_count_columns_are_resolved_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reordered.csv");
        std::fs::write(
            &path,
            "XPath,Collection,RecordCount,XPathCount,AverageOccurrencePerRecord,CollectionOccurrence%\n\
             Number of Records,arc_2014,5,5,5,5\n\
             /a/b,arc_2014,2,5,1.00,0.4\n",
        )
        .unwrap();

        let table = read_occurrence_table(&path).unwrap();
        assert_eq!(table.total_records, 5);

        let row = table.rows.iter().find(|r| r.path == "/a/b").unwrap();
        assert_eq!(row.xpath_count, 5);
        assert_eq!(row.record_count, 2);
        assert!(row.record_count <= row.xpath_count);
    }

    #[test]
    fn combined_table_must_lead_with_the_path_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reordered.csv");
        std::fs::write(&path, "arc_2014,XPath\n0.5,/a/b\n").unwrap();

        let err = read_combined_table(&path).unwrap_err();
        let engine = err.downcast_ref::<EngineError>().unwrap();
        assert!(matches!(engine, EngineError::Schema { column } if column == "XPath"));
    }

    #[test]
    fn completeness_metadata_columns_must_be_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reordered.csv");
        std::fs::write(
            &path,
            "RecLevel,RecConcept,RecElement,2014\nRequired,Identification,Title,0.5\n",
        )
        .unwrap();

        let err = read_completeness_table(&path).unwrap_err();
        let engine = err.downcast_ref::<EngineError>().unwrap();
        assert!(matches!(engine, EngineError::Schema { column } if column == "RecConcept"));
    }

    #[test]
    fn combined_table_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.csv");

        let table = CombinedTable {
            columns: vec!["arc_2014".to_string(), "arc_2015".to_string()],
            rows: vec![
                CombinedRow {
                    path: SENTINEL_PATH.to_string(),
                    values: vec![3.0, 5.0],
                },
                CombinedRow {
                    path: "/a/b".to_string(),
                    values: vec![0.5, 1.0],
                },
            ],
        };

        write_combined_table(&path, &table).unwrap();
        let read_back = read_combined_table(&path).unwrap();
        assert_eq!(read_back, table);
    }

    #[test]
    fn interchange_reader_detects_occurrence_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arc_2014_Occurrence.csv");

        let table = aggregate_occurrence(&sample_observations(), "arc_2014", 2).unwrap();
        write_occurrence_table(&path, &table).unwrap();

        match read_interchange_table(&path).unwrap() {
            InterchangeTable::Occurrence(read_back) => {
                assert_eq!(read_back.collection, "arc_2014");
            }
            InterchangeTable::Combined(_) => panic!("expected an occurrence table"),
        }
    }

    #[test]
    fn completeness_table_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completeness.csv");

        let table = CompletenessTable {
            columns: vec!["2014".to_string(), "2015".to_string()],
            rows: vec![
                CompletenessRow {
                    concept: String::new(),
                    level: String::new(),
                    element: "Average Completeness".to_string(),
                    values: vec![0.25, 0.75],
                },
                CompletenessRow {
                    concept: "Identification".to_string(),
                    level: "Required".to_string(),
                    element: "Title".to_string(),
                    values: vec![0.25, 0.75],
                },
            ],
        };

        write_completeness_table(&path, &table).unwrap();
        let read_back = read_completeness_table(&path).unwrap();
        assert_eq!(read_back, table);
    }
}
