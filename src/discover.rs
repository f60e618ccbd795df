//! Input discovery for when no shards or sources are listed explicitly.

use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

const SHARD_SUFFIX: &str = "resources/techdebt/report.json";

/// Directories never worth descending into while discovering inputs
const SKIPPED_DIRS: &[&str] = &[".git", ".gradle", ".idea", "node_modules"];

/// Find shard files under `root`: `**/<marker>/<source set>/resources/techdebt/report.json`
pub fn discover_shards(root: &Path, marker: &str) -> Vec<PathBuf> {
    let mut walker = WalkBuilder::new(root);
    // Shards live in build output, which is usually gitignored
    walker.standard_filters(false).filter_entry(|entry| {
        let name = entry.file_name().to_str().unwrap_or("");
        !SKIPPED_DIRS.contains(&name)
    });

    let mut shards: Vec<PathBuf> = walker
        .build()
        .filter_map(|result| result.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.into_path())
        .filter(|path| path.ends_with(SHARD_SUFFIX) && has_component(path, marker))
        .collect();

    shards.sort();
    tracing::debug!("Discovered {} shards under {}", shards.len(), root.display());
    shards
}

/// Find source files under each project's `src/` directory with one of `extensions`
pub fn discover_sources<'a>(
    project_dirs: impl IntoIterator<Item = &'a PathBuf>,
    extensions: &[String],
) -> Vec<PathBuf> {
    let mut sources = BTreeSet::new();

    for project_dir in project_dirs {
        let src = project_dir.join("src");
        if !src.is_dir() {
            continue;
        }

        let mut walker = WalkBuilder::new(&src);
        walker.standard_filters(true);

        for result in walker.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| extensions.iter().any(|wanted| wanted == e))
                .unwrap_or(false);
            if matches {
                sources.insert(entry.into_path());
            }
        }
    }

    tracing::debug!("Discovered {} source files", sources.len());
    sources.into_iter().collect()
}

fn has_component(path: &Path, name: &str) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(s) if s.to_str() == Some(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "[]").unwrap();
    }

    #[test]
    fn test_discover_shards() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("app/build/generated/ksp/main/resources/techdebt/report.json"));
        touch(&root.join("shared/build/generated/ksp/iosArm64/resources/techdebt/report.json"));
        touch(&root.join("shared/build/other/resources/techdebt/report.json"));
        touch(&root.join("app/src/main/resources/report.json"));

        let shards = discover_shards(root, "ksp");
        assert_eq!(shards.len(), 2);
        assert!(shards.iter().all(|s| s.ends_with(SHARD_SUFFIX)));
    }

    #[test]
    fn test_discover_sources() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        touch(&app.join("src/main/kotlin/Main.kt"));
        touch(&app.join("src/main/java/Legacy.java"));
        touch(&app.join("src/main/res/layout.xml"));
        touch(&app.join("build/generated/Generated.kt"));

        let extensions = vec!["kt".to_string(), "java".to_string()];
        let sources = discover_sources([&app], &extensions);

        assert_eq!(sources.len(), 2);
        assert!(sources.iter().any(|s| s.ends_with("Main.kt")));
        assert!(sources.iter().any(|s| s.ends_with("Legacy.java")));
    }
}
