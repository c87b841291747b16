use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::OccurrenceRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_path = args.data_root.join("manifests").join("occurrence_run.json");

    info!(data_root = %args.data_root.display(), "status requested");

    if manifest_path.exists() {
        let raw = fs::read(&manifest_path)
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;
        let manifest: OccurrenceRunManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

        info!(
            run_id = %manifest.run_id,
            generated_at = %manifest.generated_at,
            collections = manifest.collections.len(),
            failures = manifest.failures.len(),
            "loaded occurrence run manifest"
        );
        for failure in &manifest.failures {
            warn!(
                collection = %failure.collection,
                reason = %failure.reason,
                "collection failed in last run"
            );
        }
    } else {
        warn!(path = %manifest_path.display(), "occurrence run manifest missing");
    }

    let occurrence_tables = count_matching(&args.data_root, "_Occurrence.csv")?;
    let completeness_tables = count_matching(&args.data_root, "Completeness.csv")?;
    let chart_specs = count_matching(&args.data_root, "ChartSpec.json")?;

    info!(
        occurrence_tables,
        completeness_tables, chart_specs, "interchange artifact counts"
    );

    Ok(())
}

fn count_matching(root: &Path, suffix: &str) -> Result<usize> {
    if !root.exists() {
        warn!(path = %root.display(), "data root missing");
        return Ok(0);
    }

    let mut count = 0;
    let entries =
        fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", root.display()))?;
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(suffix) {
            count += 1;
        }
    }

    Ok(count)
}
