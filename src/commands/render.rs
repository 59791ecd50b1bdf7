use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write};
use std::path::PathBuf;

use crate::{
    copy_plan::PlannedCopy,
    graph::{DependencyGraph, Requirer},
    package::PackageIdentifier,
    report::ResolutionReport,
};

use super::config::Config;
use super::copy::CopyOutcome;

/// How scan results are written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything a scan produced, ready to be rendered.
#[derive(Debug)]
pub struct ScanSummary {
    pub graph: DependencyGraph,
    pub report: ResolutionReport,
    pub plan: Vec<PlannedCopy>,
    /// Set when copies were actually executed
    pub copies: Option<CopyOutcome>,
}

pub fn render(summary: &ScanSummary, config: &Config) -> Result<String> {
    match config.format {
        OutputFormat::Text => render_text(summary, config),
        OutputFormat::Json => render_json(summary, config),
    }
}

pub fn render_text(summary: &ScanSummary, config: &Config) -> Result<String> {
    let mut out = String::new();
    write_text(&mut out, summary, config).context("Failed to format scan results")?;
    Ok(out)
}

fn write_text(out: &mut impl Write, summary: &ScanSummary, config: &Config) -> fmt::Result {
    write_resolution(out, summary, config)?;
    if config.missing_only {
        return Ok(());
    }

    let dependants = summary.graph.dependants();
    match &config.name {
        Some(name) => write_name_matches(out, &summary.graph, &dependants, name),
        None => write_unused(out, &summary.graph),
    }
}

fn sorted_names<'a>(items: impl IntoIterator<Item = &'a Requirer>) -> Vec<String> {
    let mut names: Vec<String> = items.into_iter().map(ToString::to_string).collect();
    names.sort_by_key(|name| name.to_lowercase());
    names
}

/// Unused packages, ordered without regard to case.
fn unused_names(graph: &DependencyGraph) -> Vec<String> {
    let mut unused: Vec<String> = graph.unused().iter().map(ToString::to_string).collect();
    unused.sort_by_key(|id| id.to_lowercase());
    unused
}

fn write_resolution(out: &mut impl Write, summary: &ScanSummary, config: &Config) -> fmt::Result {
    let report = &summary.report;
    writeln!(
        out,
        "Dependencies already satisfied: {}",
        report.total_already_satisfied()
    )?;
    if let Some(source) = &config.source {
        writeln!(
            out,
            "Found matches for {} dependencies in {}",
            report.total_satisfied_externally,
            source.display()
        )?;
    }
    writeln!(out, "Missing {} dependencies", report.total_missing)?;

    if let Some(copies) = &summary.copies {
        if let Some(dest) = &config.dest {
            writeln!(
                out,
                "Copied {} dependencies to: {}",
                copies.copied.len(),
                dest.display()
            )?;
        }
        for failed in &copies.failed {
            writeln!(
                out,
                "ERROR copying {}: {}",
                failed.copy.source.display(),
                failed.error
            )?;
        }
    } else if !summary.plan.is_empty() {
        writeln!(
            out,
            "\n{} dependencies can be copied from the source (use --copy-found --dest <PATH>):",
            summary.plan.len()
        )?;
        for copy in &summary.plan {
            writeln!(out, "  {}", copy.source.display())?;
        }
    }

    if report.missing_entries.is_empty() {
        writeln!(out, "\nNo missing references found.")?;
    } else {
        writeln!(
            out,
            "\nFound {} missing references:",
            report.missing_entries.len()
        )?;
        for entry in &report.missing_entries {
            writeln!(out, "  Missing: {}", entry.reference)?;
            writeln!(out, "  Required by:")?;
            let mut requirers = entry.requirers.clone();
            requirers.sort_by_key(|name| name.to_lowercase());
            for requirer in requirers {
                writeln!(out, "    - {}", requirer)?;
            }
            writeln!(out)?;
        }
    }

    if config.verbose {
        write_verbose_details(out, summary)?;
    }
    writeln!(out)
}

fn write_verbose_details(out: &mut impl Write, summary: &ScanSummary) -> fmt::Result {
    let satisfied = summary.graph.satisfied();
    if !satisfied.is_empty() {
        writeln!(out, "\nAlready satisfied dependencies:")?;
        for (reference, package) in &satisfied {
            writeln!(out, "  {} (satisfied by: {})", reference, package)?;
        }
    }

    let found = summary.graph.found_externally();
    if found.is_empty() {
        return Ok(());
    }
    let sources: BTreeMap<&PackageIdentifier, &PathBuf> = summary
        .plan
        .iter()
        .map(|copy| (&copy.package, &copy.source))
        .collect();

    writeln!(out, "\nFound {} references in the source:", found.len())?;
    for (reference, matched) in &found {
        writeln!(out, "  Found: {}", reference)?;
        if let Some(source) = sources.get(&matched.package) {
            writeln!(out, "  Source: {}", source.display())?;
        }
        writeln!(out, "  Required by:")?;
        for requirer in sorted_names(&matched.requirers) {
            writeln!(out, "    - {}", requirer)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_unused(out: &mut impl Write, graph: &DependencyGraph) -> fmt::Result {
    let unused = unused_names(graph);
    writeln!(out, "{} packages are not used as a dependency:", unused.len())?;
    for id in unused {
        writeln!(out, "\t{}", id)?;
    }
    Ok(())
}

fn write_name_matches(
    out: &mut impl Write,
    graph: &DependencyGraph,
    dependants: &BTreeMap<PackageIdentifier, BTreeSet<Requirer>>,
    name: &str,
) -> fmt::Result {
    let matches = graph.find_requirers(name);
    if matches.is_empty() {
        return writeln!(out, "No packages match '{}'.", name);
    }

    let (used, unused): (Vec<_>, Vec<_>) = matches.into_iter().partition(|(_, used)| *used);

    if !unused.is_empty() {
        if unused.len() == 1 {
            writeln!(
                out,
                "The following package is not used as a dependency in other packages:"
            )?;
        } else {
            writeln!(
                out,
                "The following {} packages are not used as a dependency in other packages:",
                unused.len()
            )?;
        }
        for (id, _) in &unused {
            writeln!(out, "\t{}", id)?;
        }
    }

    if !used.is_empty() {
        if !unused.is_empty() {
            writeln!(out)?;
        }
        writeln!(
            out,
            "The following {} version(s) of '{}' are used by other packages:",
            used.len(),
            name
        )?;
        for (id, _) in &used {
            writeln!(out, "{} ->", id)?;
            let requirers = dependants.get(id).map(|r| sorted_names(r)).unwrap_or_default();
            for requirer in requirers {
                writeln!(out, "\t{}", requirer)?;
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a ResolutionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    unused: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<Vec<NameMatch>>,
    planned_copies: &'a [PlannedCopy],
    #[serde(skip_serializing_if = "Option::is_none")]
    copies: Option<&'a CopyOutcome>,
}

#[derive(Serialize)]
struct NameMatch {
    package: PackageIdentifier,
    used: bool,
    required_by: Vec<String>,
}

pub fn render_json(summary: &ScanSummary, config: &Config) -> Result<String> {
    let dependants = summary.graph.dependants();

    let (unused, matches) = match (&config.name, config.missing_only) {
        (_, true) => (None, None),
        (None, false) => (Some(unused_names(&summary.graph)), None),
        (Some(name), false) => {
            let matches = summary
                .graph
                .find_requirers(name)
                .into_iter()
                .map(|(package, used)| NameMatch {
                    required_by: dependants
                        .get(&package)
                        .map(|r| sorted_names(r))
                        .unwrap_or_default(),
                    package,
                    used,
                })
                .collect();
            (None, Some(matches))
        }
    };

    let output = JsonOutput {
        report: &summary.report,
        unused,
        matches,
        planned_copies: &summary.plan,
        copies: summary.copies.as_ref(),
    };
    let mut json =
        serde_json::to_string_pretty(&output).context("Failed to serialize scan results")?;
    json.push('\n');
    Ok(json)
}
