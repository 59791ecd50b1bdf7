//! Which secondary-source packages to copy into the destination.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::graph::DependencyGraph;
use crate::package::{PackageIdentifier, PackageIndex};

/// One file to copy forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCopy {
    pub package: PackageIdentifier,
    /// Where the package was found in the secondary source
    pub source: PathBuf,
    /// File name to create in the destination directory
    pub destination: String,
}

/// Plan one copy per distinct package that only the secondary source has.
///
/// When the index does not know where a package lives (built from bare
/// identifiers), its canonical file name is used as the source.
pub fn plan_copies(graph: &DependencyGraph, secondary: &PackageIndex) -> Vec<PlannedCopy> {
    let packages: BTreeSet<PackageIdentifier> = graph
        .iter()
        .flat_map(|(_, refs)| refs.iter())
        .filter_map(|reference| reference.satisfied_externally_by())
        .collect();

    packages
        .into_iter()
        .map(|package| {
            let source = secondary
                .location(&package)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(package.file_name()));
            let destination = source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| package.file_name());
            PlannedCopy {
                package,
                source,
                destination,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Collection, build_graph};
    use crate::package::normalize;

    fn id(raw: &str) -> PackageIdentifier {
        normalize(raw).unwrap()
    }

    #[test]
    fn test_plan_single_copy_for_latest() {
        let mut collection = Collection::new();
        collection.add_package(id("A.Pkg.1"), vec!["B.Thing.latest".into()]);
        let primary = PackageIndex::build(collection.packages().cloned());
        let secondary = PackageIndex::from_entries(vec![
            (id("B.Thing.1"), PathBuf::from("/src/B.Thing.1.var")),
            (id("B.Thing.3"), PathBuf::from("/src/deep/B.Thing.3.var")),
        ]);

        let graph = build_graph(&collection, &primary, Some(&secondary));
        let plan = plan_copies(&graph, &secondary);

        assert_eq!(
            plan,
            vec![PlannedCopy {
                package: id("B.Thing.3"),
                source: PathBuf::from("/src/deep/B.Thing.3.var"),
                destination: "B.Thing.3.var".into(),
            }]
        );
    }

    #[test]
    fn test_plan_deduplicates_across_requirers() {
        let mut collection = Collection::new();
        collection.add_package(id("A.One.1"), vec!["B.Thing.latest".into()]);
        collection.add_package(id("A.Two.1"), vec!["B.Thing.3".into()]);
        collection.add_preset("Preset_x.vap", vec!["B.Thing.latest".into()]);
        let primary = PackageIndex::build(collection.packages().cloned());
        let secondary = PackageIndex::build(vec![id("B.Thing.3")]);

        let graph = build_graph(&collection, &primary, Some(&secondary));
        let plan = plan_copies(&graph, &secondary);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].source, PathBuf::from("B.Thing.3.var"));
        assert_eq!(plan[0].destination, "B.Thing.3.var");
    }

    #[test]
    fn test_plan_ignores_primary_and_missing() {
        let mut collection = Collection::new();
        collection.add_package(id("A.Pkg.1"), vec!["B.Here.1".into(), "C.Gone.1".into()]);
        collection.add_package(id("B.Here.1"), vec![]);
        let primary = PackageIndex::build(collection.packages().cloned());
        let secondary = PackageIndex::build(vec![id("B.Here.1")]);

        let graph = build_graph(&collection, &primary, Some(&secondary));
        assert!(plan_copies(&graph, &secondary).is_empty());
    }
}
