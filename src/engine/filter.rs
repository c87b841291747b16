use regex::Regex;

use crate::engine::ordered::OrderedSet;
use crate::error::{EngineError, EngineResult};
use crate::model::{Observation, OccurrenceTable, SENTINEL_PATH};

/// Restricts an occurrence table to the rows whose path contains at least
/// one recommendation fragment, reordered to follow the fragment list.
///
/// For each fragment in caller order, all matching paths are appended in
/// their current table order; duplicates keep the position of their first
/// match. The sentinel row is always forced back to index 0.
pub fn filter_by_recommendation(
    table: &OccurrenceTable,
    fragments: &[String],
) -> EngineResult<OccurrenceTable> {
    if fragments.is_empty() {
        return Err(EngineError::EmptyInput);
    }

    let mut ordered = OrderedSet::new();
    ordered.insert(SENTINEL_PATH);

    for fragment in fragments {
        for row in table.data_rows() {
            if row.path.contains(fragment.as_str()) {
                ordered.insert(&row.path);
            }
        }
    }

    // Only the sentinel made it through: the recommendation is vacuous
    // for this collection.
    if ordered.len() == 1 {
        return Err(EngineError::NoMatch);
    }

    let mut rows = Vec::with_capacity(ordered.len());
    for path in ordered.iter() {
        if let Some(row) = table.rows.iter().find(|row| row.path == path) {
            rows.push(row.clone());
        }
    }

    Ok(OccurrenceTable {
        collection: table.collection.clone(),
        total_records: table.total_records,
        rows,
    })
}

/// Restricts raw observations to those whose path matches any fragment,
/// via one compiled alternation of escaped fragments. Used to narrow an
/// evaluated observation table to a recommendation before aggregation.
pub fn filter_observations(
    observations: &[Observation],
    fragments: &[String],
) -> EngineResult<Vec<Observation>> {
    let pattern = fragment_pattern(fragments)?;

    let matched: Vec<Observation> = observations
        .iter()
        .filter(|obs| pattern.is_match(&obs.path))
        .cloned()
        .collect();

    if matched.is_empty() {
        return Err(EngineError::NoMatch);
    }

    Ok(matched)
}

fn fragment_pattern(fragments: &[String]) -> EngineResult<Regex> {
    // An empty alternation compiles to a match-everything pattern, so it
    // must be rejected before Regex::new sees it.
    if fragments.is_empty() {
        return Err(EngineError::EmptyInput);
    }

    let escaped: Vec<String> = fragments
        .iter()
        .map(|fragment| regex::escape(fragment))
        .collect();
    Ok(Regex::new(&escaped.join("|"))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::occurrence::aggregate_occurrence;
    use crate::model::Observation;

    fn table_with_paths(paths: &[&str]) -> OccurrenceTable {
        let observations: Vec<Observation> = paths
            .iter()
            .map(|path| Observation {
                collection: "nwt_2015".to_string(),
                record: "r1.xml".to_string(),
                path: path.to_string(),
                content: "text".to_string(),
            })
            .collect();
        aggregate_occurrence(&observations, "nwt_2015", 1).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matching_is_substring_containment() {
        let table = table_with_paths(&["/md/dateCreated", "/md/updateDate", "/md/title"]);
        let filtered = filter_by_recommendation(&table, &strings(&["date"])).unwrap();

        let paths: Vec<&str> = filtered.data_rows().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/md/dateCreated", "/md/updateDate"]);
    }

    #[test]
    fn rows_follow_fragment_order_not_table_order() {
        let table = table_with_paths(&["/md/abstract", "/md/title", "/md/keyword"]);
        let filtered =
            filter_by_recommendation(&table, &strings(&["title", "keyword", "abstract"])).unwrap();

        let paths: Vec<&str> = filtered.data_rows().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/md/title", "/md/keyword", "/md/abstract"]);
    }

    #[test]
    fn duplicate_fragments_do_not_change_the_result() {
        let table = table_with_paths(&["/a/x", "/b/y", "/a/z"]);
        let once = filter_by_recommendation(&table, &strings(&["/a", "/b"])).unwrap();
        let twice = filter_by_recommendation(&table, &strings(&["/a", "/b", "/a"])).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn path_matching_two_fragments_keeps_first_position() {
        let table = table_with_paths(&["/md/dateCreated", "/md/title"]);
        let filtered =
            filter_by_recommendation(&table, &strings(&["date", "title", "Created"])).unwrap();

        let paths: Vec<&str> = filtered.data_rows().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/md/dateCreated", "/md/title"]);
    }

    #[test]
    fn sentinel_stays_at_row_zero() {
        let table = table_with_paths(&["/md/title"]);
        let filtered = filter_by_recommendation(&table, &strings(&["title"])).unwrap();

        assert_eq!(filtered.rows[0].path, SENTINEL_PATH);
        assert_eq!(filtered.total_records, 1);
    }

    #[test]
    fn vacuous_recommendation_is_an_error() {
        let table = table_with_paths(&["/md/title"]);
        let err = filter_by_recommendation(&table, &strings(&["lineage"])).unwrap_err();
        assert!(matches!(err, EngineError::NoMatch));
    }

    #[test]
    fn fragments_with_regex_metacharacters_are_escaped() {
        let observations = vec![obs("/md/point(1)"), obs("/md/title")];
        let matched = filter_observations(&observations, &strings(&["point(1)"])).unwrap();

        let paths: Vec<&str> = matched.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["/md/point(1)"]);
    }

    fn obs(path: &str) -> Observation {
        Observation {
            collection: "nwt_2015".to_string(),
            record: "r1.xml".to_string(),
            path: path.to_string(),
            content: "text".to_string(),
        }
    }

    #[test]
    fn filter_observations_keeps_any_fragment_match() {
        let observations = vec![obs("/md/title"), obs("/md/abstract"), obs("/md/contact")];
        let matched =
            filter_observations(&observations, &strings(&["title", "contact"])).unwrap();

        let paths: Vec<&str> = matched.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["/md/title", "/md/contact"]);
    }

    #[test]
    fn empty_fragment_list_is_an_error() {
        let table = table_with_paths(&["/md/title"]);
        let err = filter_by_recommendation(&table, &[]).unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput));

        let err = filter_observations(&[obs("/md/title")], &[]).unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput));
    }

    #[test]
    fn filter_observations_with_no_match_is_an_error() {
        let observations = vec![obs("/md/title")];
        let err = filter_observations(&observations, &strings(&["lineage"])).unwrap_err();
        assert!(matches!(err, EngineError::NoMatch));
    }
}
