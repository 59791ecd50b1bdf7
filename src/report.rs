//! Format-agnostic summary of a resolution run.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::graph::DependencyGraph;
use crate::resolver::ResolutionResult;

/// Counts are over distinct references (canonical form), not declarations.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub total_checked: usize,
    /// Satisfied by the primary collection or the secondary source
    pub total_satisfied: usize,
    pub total_satisfied_externally: usize,
    pub total_missing: usize,
    pub missing_entries: Vec<MissingEntry>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MissingEntry {
    pub reference: String,
    pub requirers: Vec<String>,
}

impl ResolutionReport {
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let mut outcomes: BTreeMap<String, ResolutionResult> = BTreeMap::new();
        for (_, references) in graph.iter() {
            for reference in references {
                outcomes.insert(reference.canonical(), reference.result.clone());
            }
        }

        let missing_entries: Vec<MissingEntry> = graph
            .missing()
            .into_iter()
            .map(|(reference, requirers)| MissingEntry {
                reference,
                requirers: requirers.iter().map(ToString::to_string).collect(),
            })
            .collect();

        Self {
            total_checked: outcomes.len(),
            total_satisfied: outcomes.values().filter(|r| r.is_satisfied()).count(),
            total_satisfied_externally: outcomes
                .values()
                .filter(|r| matches!(r, ResolutionResult::SatisfiedExternally(_)))
                .count(),
            total_missing: missing_entries.len(),
            missing_entries,
        }
    }

    /// Satisfied inside the primary collection without any help.
    pub fn total_already_satisfied(&self) -> usize {
        self.total_satisfied - self.total_satisfied_externally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Collection, build_graph};
    use crate::package::{PackageIdentifier, PackageIndex, normalize};

    fn id(raw: &str) -> PackageIdentifier {
        normalize(raw).unwrap()
    }

    #[test]
    fn test_report_counts_distinct_references() {
        let mut collection = Collection::new();
        collection.add_package(
            id("A.Pkg.1"),
            vec!["B.Thing.1".into(), "C.Src.latest".into(), "D.Gone.1".into(), "bad".into()],
        );
        collection.add_package(id("A.Other.1"), vec!["B.Thing.1".into(), "D.Gone.1".into()]);
        collection.add_package(id("B.Thing.1"), vec![]);
        let primary = PackageIndex::build(collection.packages().cloned());
        let secondary = PackageIndex::build(vec![id("C.Src.2")]);

        let graph = build_graph(&collection, &primary, Some(&secondary));
        let report = ResolutionReport::from_graph(&graph);

        assert_eq!(report.total_checked, 4);
        assert_eq!(report.total_satisfied, 2);
        assert_eq!(report.total_satisfied_externally, 1);
        assert_eq!(report.total_already_satisfied(), 1);
        assert_eq!(report.total_missing, 2);
        assert_eq!(
            report.missing_entries,
            vec![
                MissingEntry {
                    reference: "D.Gone.1".into(),
                    requirers: vec!["A.Other.1".into(), "A.Pkg.1".into()],
                },
                MissingEntry {
                    reference: "bad".into(),
                    requirers: vec!["A.Pkg.1".into()],
                },
            ]
        );
    }

    #[test]
    fn test_report_serializes_to_expected_shape() {
        let mut collection = Collection::new();
        collection.add_package(id("A.Pkg.1"), vec!["Missing.Pkg.2".into()]);
        let graph = build_graph(&collection, &PackageIndex::build(collection.packages().cloned()), None);

        let json = serde_json::to_value(ResolutionReport::from_graph(&graph)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "total_checked": 1,
                "total_satisfied": 0,
                "total_satisfied_externally": 0,
                "total_missing": 1,
                "missing_entries": [
                    { "reference": "Missing.Pkg.2", "requirers": ["A.Pkg.1"] }
                ]
            })
        );
    }

    #[test]
    fn test_empty_graph() {
        let report = ResolutionReport::from_graph(&DependencyGraph::default());
        assert_eq!(report, ResolutionReport::default());
    }
}
