use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::OccurrenceArgs;
use crate::engine::filter::filter_observations;
use crate::engine::occurrence::{aggregate_occurrence, distinct_record_count, record_content_view};
use crate::model::{CollectionFailure, CollectionSummary, Observation, OccurrenceRunManifest};
use crate::tableio::{
    read_observations, read_recommendation_spec, write_observations, write_occurrence_table,
};
use crate::util::{ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

const MANIFEST_VERSION: u32 = 1;

pub fn run(args: OccurrenceArgs) -> Result<()> {
    let observations = read_observations(&args.observations)?;
    if observations.is_empty() {
        bail!(
            "no observations found in {}",
            args.observations.display()
        );
    }

    let observations = match &args.spec {
        Some(spec_path) => {
            let spec = read_recommendation_spec(spec_path)?;
            let narrowed = filter_observations(&observations, &spec.elements)
                .with_context(|| format!("recommendation {} matched nothing", spec.name))?;
            info!(
                recommendation = %spec.name,
                kept = narrowed.len(),
                "narrowed observations to recommendation elements"
            );
            narrowed
        }
        None => observations,
    };

    let partitions = partition_by_collection(observations, &args.collections);
    if partitions.is_empty() {
        bail!("no collections left to aggregate after filtering");
    }

    ensure_directory(&args.out_dir)?;

    if let Some(view_path) = &args.content_view {
        let flattened: Vec<Observation> = partitions
            .values()
            .flat_map(|observations| record_content_view(observations))
            .collect();
        write_observations(view_path, &flattened)?;
        info!(
            rows = flattened.len(),
            path = %view_path.display(),
            "wrote per-record content view"
        );
    }

    // One failing collection must not block the others; failures are logged
    // and recorded in the run manifest.
    let mut summaries = Vec::new();
    let mut failures = Vec::new();
    for (collection, observations) in &partitions {
        let total_records = distinct_record_count(observations);
        match aggregate_occurrence(observations, collection, total_records) {
            Ok(table) => {
                let output_path = args.out_dir.join(format!("{collection}_Occurrence.csv"));
                write_occurrence_table(&output_path, &table)?;
                info!(
                    collection = %collection,
                    records = total_records,
                    paths = table.rows.len() - 1,
                    path = %output_path.display(),
                    "wrote occurrence table"
                );
                summaries.push(CollectionSummary {
                    collection: collection.clone(),
                    record_count: total_records,
                    path_count: table.rows.len() - 1,
                    output_path: output_path.display().to_string(),
                });
            }
            Err(err) => {
                warn!(collection = %collection, error = %err, "collection aggregation failed");
                failures.push(CollectionFailure {
                    collection: collection.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    if summaries.is_empty() {
        bail!("every collection failed to aggregate");
    }

    let manifest = OccurrenceRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: format!("occurrence-{}", utc_compact_string(Utc::now())),
        generated_at: now_utc_string(),
        observations_path: args.observations.display().to_string(),
        observations_sha256: sha256_file(&args.observations)?,
        collections: summaries,
        failures,
    };

    let manifest_path = args.out_dir.join("manifests").join("occurrence_run.json");
    write_json_pretty(&manifest_path, &manifest)?;
    info!(
        path = %manifest_path.display(),
        collections = manifest.collections.len(),
        failures = manifest.failures.len(),
        "occurrence run completed"
    );

    Ok(())
}

fn partition_by_collection(
    observations: Vec<Observation>,
    keep: &[String],
) -> BTreeMap<String, Vec<Observation>> {
    let mut partitions: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for obs in observations {
        if !keep.is_empty() && !keep.contains(&obs.collection) {
            continue;
        }
        partitions.entry(obs.collection.clone()).or_default().push(obs);
    }
    partitions
}
