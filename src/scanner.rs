use crate::error::ReportError;
use crate::models::{Collected, DebtItem};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// TODO/FIXME right after `//`, `/*`, `/**` or a `*` continuation, with an optional colon
const COMMENT_PATTERN: &str = r"^\s*(?://|/\*\*?|\*)\s*(TODO|FIXME)\b[:\s]?(.*?)(?:\s*\*+/)?\s*$";

/// Extracts TODO/FIXME comments from source files
#[derive(Debug, Clone)]
pub struct CommentScanner {
    pattern: Regex,
    projects: BTreeMap<PathBuf, String>,
}

impl CommentScanner {
    /// `projects` maps each project directory to its module identifier
    pub fn new(projects: BTreeMap<PathBuf, String>) -> Result<Self, ReportError> {
        Ok(Self {
            pattern: Regex::new(COMMENT_PATTERN)?,
            projects,
        })
    }

    /// Scan every file. Files outside all projects are skipped silently,
    /// unreadable files are skipped with a diagnostic.
    pub fn scan(&self, sources: &[PathBuf]) -> Collected {
        let mut collected = Collected::default();

        for source in sources {
            let Some((project_dir, module)) = owning_project(&self.projects, source) else {
                tracing::debug!("{} belongs to no project, skipping", source.display());
                continue;
            };

            match self.scan_file(source, project_dir, module) {
                Ok(items) => collected.items.extend(items),
                Err(error) => collected.skip(error),
            }
        }

        collected
    }

    /// Scan a single file attributed to `module`, rooted at `project_dir`
    pub fn scan_file(
        &self,
        path: &Path,
        project_dir: &Path,
        module: &str,
    ) -> Result<Vec<DebtItem>, ReportError> {
        let file = File::open(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let relative = relative_display(path, project_dir);

        let mut items = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            // Undecodable lines are not comments we can report
            let Ok(line) = line else { continue };

            if let Some(description) = self.describe(&line) {
                let location = format!("{}:{}", relative, index + 1);
                items.push(DebtItem::comment(module, description, location));
            }
        }

        Ok(items)
    }

    /// Description for a matching line: `"TODO: text"`, or the bare keyword without text
    pub fn describe(&self, line: &str) -> Option<String> {
        let captures = self.pattern.captures(line)?;
        let keyword = captures.get(1)?.as_str();
        let content = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");

        if content.is_empty() {
            Some(keyword.to_string())
        } else {
            Some(format!("{}: {}", keyword, content))
        }
    }
}

/// The most specific project directory containing `file`
pub fn owning_project<'a>(
    projects: &'a BTreeMap<PathBuf, String>,
    file: &Path,
) -> Option<(&'a Path, &'a str)> {
    projects
        .iter()
        .filter(|(dir, _)| file.starts_with(dir))
        .max_by_key(|(dir, _)| dir.components().count())
        .map(|(dir, module)| (dir.as_path(), module.as_str()))
}

/// Path of `file` relative to `base`, always with forward slashes
fn relative_display(file: &Path, base: &Path) -> String {
    let relative = file.strip_prefix(base).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemType, Priority};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn scanner_for(projects: &[(&Path, &str)]) -> CommentScanner {
        let projects = projects
            .iter()
            .map(|(dir, module)| (dir.to_path_buf(), module.to_string()))
            .collect();
        CommentScanner::new(projects).unwrap()
    }

    #[test]
    fn test_describe_comment_styles() {
        let scanner = scanner_for(&[]);

        assert_eq!(scanner.describe("// TODO: fix me").as_deref(), Some("TODO: fix me"));
        assert_eq!(scanner.describe("// FIXME").as_deref(), Some("FIXME"));
        assert_eq!(scanner.describe("    // TODO fix later").as_deref(), Some("TODO: fix later"));
        assert_eq!(scanner.describe("/* FIXME: leak */").as_deref(), Some("FIXME: leak"));
        assert_eq!(scanner.describe("/** TODO: document */").as_deref(), Some("TODO: document"));
        assert_eq!(scanner.describe(" * TODO: continuation").as_deref(), Some("TODO: continuation"));
        assert_eq!(scanner.describe("// TODO:").as_deref(), Some("TODO"));
    }

    #[test]
    fn test_describe_ignores_non_comments() {
        let scanner = scanner_for(&[]);

        assert!(scanner.describe("val todo = \"TODO: not a comment\"").is_none());
        assert!(scanner.describe("// TODOS are fine").is_none());
        assert!(scanner.describe("# TODO: hash comments are not scanned").is_none());
        assert!(scanner.describe("This is a TODO in prose").is_none());
    }

    #[test]
    fn test_scan_file() {
        let temp = TempDir::new().unwrap();
        let module_dir = temp.path().join("app");
        let src = module_dir.join("src/main/kotlin");
        fs::create_dir_all(&src).unwrap();
        let file_path = src.join("Main.kt");

        let content = r#"fun main() {
    // TODO: implement this
    println("Hello")
    // FIXME
}
"#;
        let mut file = File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let scanner = scanner_for(&[(module_dir.as_path(), ":app")]);
        let collected = scanner.scan(&[file_path]);

        assert!(collected.diagnostics.is_empty());
        assert_eq!(collected.items.len(), 2);

        let first = &collected.items[0];
        assert_eq!(first.module_name, ":app");
        assert_eq!(first.name, "");
        assert_eq!(first.description, "TODO: implement this");
        assert_eq!(first.item_type, ItemType::Comment);
        assert_eq!(first.priority, Priority::Unspecified);
        assert_eq!(first.source_set, "src/main/kotlin/Main.kt:2");
        assert_eq!(first.location.as_deref(), Some("src/main/kotlin/Main.kt:2"));

        assert_eq!(collected.items[1].description, "FIXME");
        assert_eq!(collected.items[1].source_set, "src/main/kotlin/Main.kt:4");
    }

    #[test]
    fn test_most_specific_project_wins() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let feature = root.join("app/feature");
        fs::create_dir_all(feature.join("src")).unwrap();
        let file_path = feature.join("src/Feature.kt");
        fs::write(&file_path, "// TODO: nested\n").unwrap();

        let app = root.join("app");
        let scanner = scanner_for(&[
            (root, ":"),
            (app.as_path(), ":app"),
            (feature.as_path(), ":app:feature"),
        ]);
        let collected = scanner.scan(&[file_path]);

        assert_eq!(collected.items.len(), 1);
        assert_eq!(collected.items[0].module_name, ":app:feature");
        assert_eq!(collected.items[0].source_set, "src/Feature.kt:1");
    }

    #[test]
    fn test_sibling_prefix_is_not_an_ancestor() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        let app2 = temp.path().join("app2");
        fs::create_dir_all(&app2).unwrap();
        let file_path = app2.join("A.kt");
        fs::write(&file_path, "// TODO: orphan\n").unwrap();

        let scanner = scanner_for(&[(app.as_path(), ":app")]);
        let collected = scanner.scan(&[file_path]);
        assert!(collected.items.is_empty());
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("Good.kt");
        fs::write(&good, "// TODO: keep\n").unwrap();
        let missing = temp.path().join("Missing.kt");

        let scanner = scanner_for(&[(temp.path(), ":")]);
        let collected = scanner.scan(&[missing, good]);

        assert_eq!(collected.items.len(), 1);
        assert_eq!(collected.diagnostics.len(), 1);
        assert!(matches!(collected.diagnostics[0].0, ReportError::Io { .. }));
    }
}
