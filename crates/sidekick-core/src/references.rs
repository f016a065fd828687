//! Source attribution for answers.

use std::collections::HashSet;

use crate::models::{Reference, SearchResult};

/// Distinct source documents of `results`, in first-seen ranking order.
///
/// The first result for a path decides both its position and its title;
/// later results from the same path add nothing.
pub fn extract_references(results: &[SearchResult]) -> Vec<Reference> {
    let mut seen: HashSet<&str> = HashSet::new();
    results
        .iter()
        .filter(|r| seen.insert(r.source_path.as_str()))
        .map(|r| Reference {
            path: r.source_path.clone(),
            title: r.source_title.clone(),
        })
        .collect()
}
