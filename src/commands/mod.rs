use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    archive::{PackageReader, ReferenceReader},
    copy_plan::plan_copies,
    graph::build_graph,
    report::ResolutionReport,
    runtime::Runtime,
};

mod collect;
pub mod config;
mod copy;
mod render;

pub use collect::{PrimaryScan, collect_primary, index_source};
pub use config::{Config, DEFAULT_OUTPUT_FILE, ScanOptions};
pub use copy::{CopyOutcome, FailedCopy, execute_copies};
pub use render::{OutputFormat, ScanSummary, render, render_json, render_text};

/// Scan a collection, print the results and optionally save them to a file.
#[tracing::instrument(skip(runtime))]
pub fn scan<R: Runtime + 'static>(runtime: R, options: ScanOptions) -> Result<()> {
    let config = Config::new(&runtime, options)?;
    let output = run(&runtime, &PackageReader::new(), &config)?;

    print!("{}", output);

    if let Some(path) = &config.output {
        runtime
            .write(path, output.as_bytes())
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
        eprintln!("Results saved to: {}", path.display());
    }
    Ok(())
}

/// Run one scan with an already validated config and return the rendered
/// results.
#[tracing::instrument(skip(runtime, reader, config))]
pub fn run<R: Runtime + 'static, P: ReferenceReader>(
    runtime: &R,
    reader: &P,
    config: &Config,
) -> Result<String> {
    info!("Scanning {:?}", config.root);
    let primary = collect_primary(runtime, reader, &config.root)?;

    let secondary = match &config.source {
        Some(source) => Some(index_source(runtime, source)?),
        None => None,
    };

    let graph = build_graph(&primary.collection, &primary.index, secondary.as_ref());
    let report = ResolutionReport::from_graph(&graph);
    debug!(
        "Checked {} reference(s), {} missing",
        report.total_checked, report.total_missing
    );

    let plan = secondary
        .as_ref()
        .map(|secondary| plan_copies(&graph, secondary))
        .unwrap_or_default();

    let copies = match &config.dest {
        Some(dest) if config.copy_found => Some(execute_copies(runtime, &plan, dest)?),
        _ => None,
    };

    let summary = ScanSummary {
        graph,
        report,
        plan,
        copies,
    };
    render(&summary, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MockReferenceReader;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::{Path, PathBuf};

    fn config() -> Config {
        Config {
            root: PathBuf::from("/vam"),
            source: Some(PathBuf::from("/src")),
            name: None,
            output: None,
            missing_only: false,
            verbose: false,
            dest: Some(PathBuf::from("/dest")),
            copy_found: true,
            format: OutputFormat::Text,
        }
    }

    fn primary_runtime() -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/vam/AddonPackages")))
            .returning(|_| true);
        runtime
            .expect_glob()
            .with(eq("/vam/AddonPackages/**/*.var"))
            .returning(|_| {
                Ok(vec![
                    PathBuf::from("/vam/AddonPackages/A.Pkg.1.var"),
                    PathBuf::from("/vam/AddonPackages/E.Other.1.var"),
                ])
            });
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/vam/Custom")))
            .returning(|_| false);
        runtime
            .expect_glob()
            .with(eq("/src/**/*.var"))
            .returning(|_| {
                Ok(vec![
                    PathBuf::from("/src/B.Thing.3.var"),
                    PathBuf::from("/src/C.Extra.1.var"),
                ])
            });
        runtime
    }

    fn reader() -> MockReferenceReader {
        let mut reader = MockReferenceReader::new();
        reader
            .expect_read_references::<MockRuntime>()
            .withf(|_, path| path == Path::new("/vam/AddonPackages/A.Pkg.1.var"))
            .returning(|_, _| Ok(vec!["B.Thing.latest".into(), "D.Gone.1".into()]));
        reader
            .expect_read_references::<MockRuntime>()
            .returning(|_, _| Ok(vec![]));
        reader
    }

    #[test]
    fn test_run_copies_latest_from_source() {
        let mut runtime = primary_runtime();
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/dest")))
            .returning(|_| true);
        runtime
            .expect_copy()
            .with(
                eq(PathBuf::from("/src/B.Thing.3.var")),
                eq(PathBuf::from("/dest/B.Thing.3.var")),
            )
            .times(1)
            .returning(|_, _| Ok(1024));

        let output = run(&runtime, &reader(), &config()).unwrap();

        assert!(output.contains("Dependencies already satisfied: 0\n"));
        assert!(output.contains("Found matches for 1 dependencies in /src\n"));
        assert!(output.contains("Missing 1 dependencies\n"));
        assert!(output.contains("Copied 1 dependencies to: /dest\n"));
        assert!(output.contains("  Missing: D.Gone.1\n  Required by:\n    - A.Pkg.1\n"));
        assert!(output.contains("2 packages are not used as a dependency:\n\tA.Pkg.1\n\tE.Other.1\n"));
    }

    #[test]
    fn test_run_without_copy_found_only_plans() {
        let runtime = primary_runtime();
        let mut config = config();
        config.copy_found = false;

        let output = run(&runtime, &reader(), &config).unwrap();

        assert!(output.contains("1 dependencies can be copied from the source"));
        assert!(output.contains("  /src/B.Thing.3.var\n"));
        assert!(!output.contains("Copied"));
    }

    #[test]
    fn test_run_json() {
        let runtime = primary_runtime();
        let mut config = config();
        config.copy_found = false;
        config.format = OutputFormat::Json;

        let output = run(&runtime, &reader(), &config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["total_checked"], 2);
        assert_eq!(value["total_satisfied_externally"], 1);
        assert_eq!(value["planned_copies"][0]["package"], "B.Thing.3");
        assert_eq!(value["planned_copies"][0]["source"], "/src/B.Thing.3.var");
    }
}
