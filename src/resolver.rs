use crate::models::ReportConfig;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

const UNKNOWN_LOCATION: &str = "unknown";

/// Split a `path:line` hint. A trailing segment that is not a number stays part of the path.
pub fn split_location(location: &str) -> (&str, Option<usize>) {
    match location.rsplit_once(':') {
        Some((path, line)) => match line.trim().parse::<usize>() {
            Ok(line) => (path, Some(line)),
            Err(_) => (location, None),
        },
        None => (location, None),
    }
}

/// Maps location hints back to physical files under the project root
#[derive(Debug, Clone)]
pub struct SourceResolver {
    root: PathBuf,
    max_depth: usize,
    excluded_dirs: Vec<String>,
}

impl SourceResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = ReportConfig::default();
        Self {
            root: root.into(),
            max_depth: defaults.search_max_depth,
            excluded_dirs: defaults.search_excluded_dirs,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            root: config.root_dir.clone(),
            max_depth: config.search_max_depth,
            excluded_dirs: config.search_excluded_dirs.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a location hint owned by `module_name` (e.g. `:app:feature`).
    ///
    /// Strategies, first hit wins:
    /// 1. the path as an absolute path
    /// 2. the path relative to the root
    /// 3. the path inside the module's directory (`:app:feature` -> `app/feature`)
    /// 4. any file under the root whose path ends with the given one
    ///
    /// With duplicate file names, strategy 4 returns whichever the walk meets first.
    pub fn resolve(&self, location: Option<&str>, module_name: &str) -> Option<PathBuf> {
        let location = location?.trim();
        if location.is_empty() || location == UNKNOWN_LOCATION {
            return None;
        }

        let (path, _) = split_location(location);
        let path = Path::new(path);

        if path.is_absolute() && path.is_file() {
            return Some(path.to_path_buf());
        }

        let from_root = self.root.join(path);
        if from_root.is_file() {
            return Some(from_root);
        }

        if let Some(found) = self.resolve_in_module(module_name, path) {
            return Some(found);
        }

        tracing::debug!(
            "Falling back to recursive search for {} under {}",
            path.display(),
            self.root.display()
        );
        self.search(&self.root, path)
    }

    fn resolve_in_module(&self, module_name: &str, path: &Path) -> Option<PathBuf> {
        let module_dir = module_name
            .split(':')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |dir, segment| dir.join(segment));

        if module_dir == self.root || !module_dir.is_dir() {
            return None;
        }

        let direct = module_dir.join(path);
        if direct.is_file() {
            return Some(direct);
        }

        self.search(&module_dir, path)
    }

    fn search(&self, base: &Path, suffix: &Path) -> Option<PathBuf> {
        if suffix.is_absolute() {
            return None;
        }

        let excluded = self.excluded_dirs.clone();
        let mut walker = WalkBuilder::new(base);
        walker
            .standard_filters(false)
            .max_depth(Some(self.max_depth))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
                let name = entry.file_name().to_str().unwrap_or("");
                !(is_dir && entry.depth() > 0 && excluded.iter().any(|e| e == name))
            });

        walker
            .build()
            .filter_map(|result| result.ok())
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .find(|entry| entry.path().ends_with(suffix))
            .map(|entry| entry.into_path())
    }
}
