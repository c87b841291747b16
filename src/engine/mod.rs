//! The occurrence/completeness aggregation core. Every operation takes its
//! full input table and returns a new one; nothing is mutated in place, so
//! independent collections can be processed in parallel and merged with
//! [`combine::combine`].

pub mod combine;
pub mod filter;
pub mod occurrence;
pub mod ordered;
pub mod rollup;

#[cfg(test)]
mod tests {
    use crate::engine::combine::{combine, percent_table};
    use crate::engine::occurrence::{aggregate_occurrence, distinct_record_count};
    use crate::engine::rollup::roll_up;
    use crate::model::{
        AVERAGE_ROW_LABEL, ConceptMapping, Observation, RecommendationSpec, SENTINEL_PATH,
    };

    fn obs(collection: &str, record: &str, path: &str) -> Observation {
        Observation {
            collection: collection.to_string(),
            record: record.to_string(),
            path: path.to_string(),
            content: "text".to_string(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    // Two collections of three records each; /a/b is present in two of
    // three records in the first and all three in the second.
    #[test]
    fn two_collection_pipeline_end_to_end() {
        let first = vec![
            obs("site_2014", "r1.xml", "/a/b"),
            obs("site_2014", "r2.xml", "/a/b"),
            obs("site_2014", "r3.xml", "/a/other"),
        ];
        let second = vec![
            obs("site_2015", "s1.xml", "/a/b"),
            obs("site_2015", "s2.xml", "/a/b"),
            obs("site_2015", "s3.xml", "/a/b"),
        ];

        let first_table =
            aggregate_occurrence(&first, "site_2014", distinct_record_count(&first)).unwrap();
        let second_table =
            aggregate_occurrence(&second, "site_2015", distinct_record_count(&second)).unwrap();

        let first_row = first_table.rows.iter().find(|r| r.path == "/a/b").unwrap();
        let second_row = second_table.rows.iter().find(|r| r.path == "/a/b").unwrap();
        assert!(approx(first_row.collection_occurrence_percent, 0.667));
        assert!(approx(second_row.collection_occurrence_percent, 1.0));

        let combined = combine(&[percent_table(&first_table), percent_table(&second_table)])
            .unwrap();
        assert_eq!(combined.rows[0].path, SENTINEL_PATH);
        assert_eq!(combined.rows[0].values, vec![3.0, 3.0]);

        let ab_row = combined.rows.iter().find(|r| r.path == "/a/b").unwrap();
        assert!(approx(ab_row.values[0], 0.667));
        assert!(approx(ab_row.values[1], 1.0));

        let spec = RecommendationSpec {
            name: "demo".to_string(),
            elements: vec!["/a".to_string()],
            concept_map: vec![
                ConceptMapping {
                    key: "/a/b".to_string(),
                    concept: "B-concept".to_string(),
                },
                ConceptMapping {
                    key: "/a/other".to_string(),
                    concept: "Other".to_string(),
                },
            ],
            level_order: vec!["Required".to_string()],
            concept_order: vec!["Identification".to_string()],
            element_order: vec!["B-concept".to_string()],
            years: vec!["site_2014".to_string(), "site_2015".to_string()],
        };

        let completeness = roll_up(&combined, &spec).unwrap();

        // "Other" is dropped by the element-order reindex; one data row plus
        // the average row remain, and an average over one row is itself.
        assert_eq!(completeness.rows.len(), 2);
        assert_eq!(completeness.rows[0].element, AVERAGE_ROW_LABEL);
        assert!(approx(completeness.rows[0].values[0], 0.667));
        assert!(approx(completeness.rows[0].values[1], 1.0));

        assert_eq!(completeness.rows[1].element, "B-concept");
        assert!(approx(completeness.rows[1].values[0], 0.667));
        assert!(approx(completeness.rows[1].values[1], 1.0));
    }
}
