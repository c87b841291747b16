//! Seams toward the external collaborators: record retrieval, spreadsheet
//! rendering, radar-chart rendering, and report publishing. The core only
//! guarantees table shapes and orderings; everything behind these traits is
//! third-party I/O. The seam types have no in-crate implementation, the
//! binary only produces their inputs, so they carry `allow(dead_code)`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::model::{AVERAGE_ROW_LABEL, CompletenessTable};

/// Conditional-formatting classification the spreadsheet emitter applies to
/// occurrence percentages.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessBand {
    Complete,
    Partial,
    Absent,
}

#[allow(dead_code)]
pub fn classify(value: f64) -> CompletenessBand {
    if value >= 1.0 {
        CompletenessBand::Complete
    } else if value == 0.0 {
        CompletenessBand::Absent
    } else {
        CompletenessBand::Partial
    }
}

/// Vertical plot-area band of one chart series, as fractions of the figure
/// height. Bands are listed top-down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartBand {
    pub y0: f64,
    pub y1: f64,
}

/// Partitions the figure height into one band per series. Series count is
/// a parameter, not a schema: adding a year never means adding a layout
/// entry somewhere.
pub fn chart_bands(series_count: usize) -> Vec<ChartBand> {
    let count = series_count.max(1) as f64;
    (0..series_count)
        .map(|index| ChartBand {
            y0: 1.0 - (index as f64 + 1.0) / count,
            y1: 1.0 - index as f64 / count,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// Everything a chart emitter needs to render comparable radar charts: one
/// series per year column, one axis per concept, axis order fixed by the
/// recommendation's element order.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub axes: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub bands: Vec<ChartBand>,
}

impl ChartSpec {
    /// The average row is a summary, not a concept, so it never becomes an
    /// axis.
    pub fn from_completeness(table: &CompletenessTable, title: &str) -> Self {
        let data_rows: Vec<_> = table
            .rows
            .iter()
            .filter(|row| row.element != AVERAGE_ROW_LABEL)
            .collect();

        let axes = data_rows.iter().map(|row| row.element.clone()).collect();

        let series = table
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| ChartSeries {
                label: column.clone(),
                values: data_rows.iter().map(|row| row.values[index]).collect(),
            })
            .collect();

        let bands = chart_bands(table.columns.len());

        Self {
            title: title.to_string(),
            axes,
            series,
            bands,
        }
    }
}

/// Spreadsheet layout parameters the emitter consumes alongside the tables.
/// Thresholds mirror [`classify`].
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize)]
pub struct SpreadsheetLayout {
    pub path_column_width: u16,
    pub value_column_width: u16,
    pub complete_threshold: f64,
    pub absent_value: f64,
}

impl Default for SpreadsheetLayout {
    fn default() -> Self {
        Self {
            path_column_width: 70,
            value_column_width: 15,
            complete_threshold: 1.0,
            absent_value: 0.0,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordSource {
    pub locator: String,
    pub store_as: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalStatus {
    Stored,
    DownloadFailed,
    NotWellFormed,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub locator: String,
    pub store_as: String,
    pub status: RetrievalStatus,
}

/// Downloads metadata records and checks well-formedness. Retry policy and
/// validation live entirely behind this seam; the core only consumes the
/// per-item outcomes.
#[allow(dead_code)]
pub trait RecordRetriever {
    fn fetch(&self, sources: &[RecordSource]) -> Result<Vec<RetrievalOutcome>>;
}

/// Renders occurrence/completeness tables into a workbook, applying the
/// supplied layout and embedding an already-rendered chart image.
#[allow(dead_code)]
pub trait SpreadsheetEmitter {
    fn emit(
        &self,
        occurrence_csv: &Path,
        completeness_csv: &Path,
        chart_image: Option<&Path>,
        layout: &SpreadsheetLayout,
        destination: &Path,
    ) -> Result<PathBuf>;
}

/// Renders a [`ChartSpec`] to a raster image.
#[allow(dead_code)]
pub trait ChartEmitter {
    fn render(&self, spec: &ChartSpec, destination: &Path) -> Result<PathBuf>;
}

/// Uploads a finished report and returns a shareable reference.
#[allow(dead_code)]
pub trait ReportPublisher {
    fn publish(&self, report: &Path) -> Result<String>;
}
