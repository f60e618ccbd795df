use crate::aggregate::aggregate_and_sort;
use crate::collector::ShardCollector;
use crate::discover::{discover_shards, discover_sources};
use crate::error::{Diagnostic, ReportError};
use crate::git::GitEnricher;
use crate::models::{DebtItem, ReportConfig};
use crate::reporter;
use crate::scanner::CommentScanner;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Result of a successful run
#[derive(Debug)]
pub struct RunOutcome {
    /// Absolute path of the written report
    pub output: PathBuf,

    /// Items as rendered, aggregated and sorted
    pub items: Vec<DebtItem>,

    /// Shards and files that were skipped
    pub diagnostics: Vec<Diagnostic>,
}

/// Collect, merge, enrich and render, then write the report.
///
/// Only a failed final write is returned as an error; everything else degrades
/// into diagnostics.
pub fn run(config: &ReportConfig) -> Result<RunOutcome, ReportError> {
    let config = normalize(config);
    let mut diagnostics = Vec::new();

    let shards = if config.shards.is_empty() {
        discover_shards(&config.root_dir, &config.generated_dir_marker)
    } else {
        config.shards.clone()
    };

    let collected = ShardCollector::from_config(&config).collect(&shards);
    let mut items = collected.items;
    diagnostics.extend(collected.diagnostics);
    tracing::info!("Collected {} items from {} shards", items.len(), shards.len());

    if config.collect_comments {
        let projects = project_dirs(&config);
        let sources = if config.sources.is_empty() {
            discover_sources(projects.keys(), &config.source_extensions)
        } else {
            config.sources.iter().map(|s| canonical(s)).collect()
        };

        let scanned = CommentScanner::new(projects)?.scan(&sources);
        tracing::info!(
            "Collected {} comments from {} source files",
            scanned.items.len(),
            sources.len()
        );
        items.extend(scanned.items);
        diagnostics.extend(scanned.diagnostics);
    }

    let items = aggregate_and_sort(items);
    let items = GitEnricher::from_config(&config).enrich(items);

    let rendered = reporter::render(&items, config.format, config.base_ticket_url.as_deref())
        .map_err(|e| ReportError::Write {
            path: config.output.clone(),
            source: io::Error::other(e),
        })?;
    reporter::write_report(&config.output, &rendered)?;

    Ok(RunOutcome {
        output: canonical(&config.output),
        items,
        diagnostics,
    })
}

/// Anchor the root and make every relative path in the config absolute against it
fn normalize(config: &ReportConfig) -> ReportConfig {
    let root = canonical(&config.root_dir);
    let anchor = |path: &Path| -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    };

    ReportConfig {
        output: anchor(&config.output),
        shards: config.shards.iter().map(|s| anchor(s)).collect(),
        sources: config.sources.iter().map(|s| anchor(s)).collect(),
        root_dir: root.clone(),
        ..config.clone()
    }
}

/// Project directories keyed by canonical path; the root alone when none are configured
fn project_dirs(config: &ReportConfig) -> BTreeMap<PathBuf, String> {
    let projects = config.project_dirs();
    if projects.is_empty() {
        return BTreeMap::from([(config.root_dir.clone(), ":".to_string())]);
    }

    projects
        .into_iter()
        .map(|(dir, module)| (canonical(&dir), module))
        .collect()
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
