use crate::error::{Diagnostic, ReportError};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where a debt item was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    /// Structured `@TechDebt` annotation
    #[default]
    TechDebt,

    /// Suppressed lint rule
    Suppress,

    /// TODO/FIXME comment marker
    Comment,
}

impl ItemType {
    /// Decode a wire label, falling back to `TechDebt` for anything unrecognized
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "SUPPRESS" => ItemType::Suppress,
            "COMMENT" => ItemType::Comment,
            _ => ItemType::TechDebt,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemType::TechDebt => "TECH_DEBT",
            ItemType::Suppress => "SUPPRESS",
            ItemType::Comment => "COMMENT",
        }
    }
}

/// Priority of an annotated debt item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    High,
    Medium,
    Low,
    None,

    /// Empty or unrecognized label
    #[default]
    Unspecified,
}

impl Priority {
    /// Decode a wire label. Labels are matched exactly; anything else is `Unspecified`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "HIGH" => Priority::High,
            "MEDIUM" => Priority::Medium,
            "LOW" => Priority::Low,
            "NONE" => Priority::None,
            _ => Priority::Unspecified,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
            Priority::None => "NONE",
            Priority::Unspecified => "",
        }
    }

    /// Ordering rank: HIGH < MEDIUM < LOW < everything else
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
            Priority::None | Priority::Unspecified => 3,
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A single technical debt item, from a shard or a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtItem {
    /// Owning module, e.g. `:app:feature`
    pub module_name: String,

    /// Annotated symbol, empty for comment markers
    pub name: String,

    pub description: String,

    /// External ticket reference, may be empty
    pub ticket: String,

    pub priority: Priority,

    #[serde(rename = "type")]
    pub item_type: ItemType,

    /// Where the item occurs; after aggregation a sorted, comma-joined union
    pub source_set: String,

    /// Precise `path:line` hint used for file and blame resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Last commit touching the item's line
    pub last_modified: Option<DateTime<Utc>>,

    /// Author of that commit
    pub author: Option<String>,
}

impl DebtItem {
    /// Create a comment-origin item. The location doubles as the source set.
    pub fn comment(module_name: &str, description: String, location: String) -> Self {
        Self {
            module_name: module_name.to_string(),
            name: String::new(),
            description,
            ticket: String::new(),
            priority: Priority::Unspecified,
            item_type: ItemType::Comment,
            source_set: location.clone(),
            location: Some(location),
            last_modified: None,
            author: None,
        }
    }

    pub fn priority_rank(&self) -> u8 {
        self.priority.rank()
    }

    /// Key deciding whether two items describe the same logical debt.
    /// `source_set` and `location` are deliberately left out.
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            module_name: self.module_name.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            ticket: self.ticket.clone(),
            priority: self.priority,
            item_type: self.item_type,
        }
    }

    pub fn set_git_info(&mut self, info: GitInfo) {
        self.author = Some(info.author);
        self.last_modified = Some(info.last_modified);
    }
}

/// Identity of a debt item across compilation targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub module_name: String,
    pub name: String,
    pub description: String,
    pub ticket: String,
    pub priority: Priority,
    pub item_type: ItemType,
}

/// Provenance for one line, as reported by git blame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitInfo {
    pub author: String,
    pub last_modified: DateTime<Utc>,
}

/// Items produced by one collection stage, plus whatever was skipped on the way
#[derive(Debug, Default)]
pub struct Collected {
    pub items: Vec<DebtItem>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Collected {
    pub fn skip(&mut self, error: ReportError) {
        tracing::warn!("{}", error);
        self.diagnostics.push(Diagnostic(error));
    }
}

/// Output format of the consolidated report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Self-contained HTML document
    #[default]
    Html,
    /// Aggregated items as JSON
    Json,
}

/// Configuration for one report run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Where the report is written
    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,

    /// Scan source files for TODO/FIXME comments
    #[serde(default)]
    pub collect_comments: bool,

    /// Keep SUPPRESS items found in shards
    #[serde(default)]
    pub collect_suppress: bool,

    /// Attach author and last-modified data from git blame
    #[serde(default)]
    pub enable_git_metadata: bool,

    /// Base URL tickets are appended to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_ticket_url: Option<String>,

    /// Root of the multi-module build
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// JSON shard files emitted per module and target
    #[serde(default)]
    pub shards: Vec<PathBuf>,

    /// Source files scanned for comments
    #[serde(default)]
    pub sources: Vec<PathBuf>,

    /// Source-set values that say nothing about the real target
    #[serde(default = "default_placeholder_source_sets")]
    pub placeholder_source_sets: Vec<String>,

    /// Path segment under which generated shards live, followed by the source-set name
    #[serde(default = "default_generated_dir_marker")]
    pub generated_dir_marker: String,

    /// Extensions picked up when discovering source files
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Depth limit of the resolver's recursive fallback search
    #[serde(default = "default_search_max_depth")]
    pub search_max_depth: usize,

    /// Directories skipped by the resolver's recursive fallback search
    #[serde(default = "default_search_excluded_dirs")]
    pub search_excluded_dirs: Vec<String>,

    /// Project directory to module identifier, e.g. `"app/feature" = ":app:feature"`
    #[serde(default)]
    pub projects: BTreeMap<String, String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            collect_comments: false,
            collect_suppress: false,
            enable_git_metadata: false,
            base_ticket_url: None,
            root_dir: default_root_dir(),
            projects: BTreeMap::new(),
            shards: Vec::new(),
            sources: Vec::new(),
            placeholder_source_sets: default_placeholder_source_sets(),
            generated_dir_marker: default_generated_dir_marker(),
            source_extensions: default_source_extensions(),
            search_max_depth: default_search_max_depth(),
            search_excluded_dirs: default_search_excluded_dirs(),
        }
    }
}

impl ReportConfig {
    /// Project directories as absolute paths, resolved against `root_dir`
    pub fn project_dirs(&self) -> BTreeMap<PathBuf, String> {
        self.projects
            .iter()
            .map(|(dir, module)| {
                let dir = PathBuf::from(dir);
                let dir = if dir.is_absolute() {
                    dir
                } else {
                    self.root_dir.join(dir)
                };
                (dir, module.clone())
            })
            .collect()
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("build/reports/techdebt/consolidated-report.html")
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_placeholder_source_sets() -> Vec<String> {
    vec!["unknown".to_string()]
}

fn default_generated_dir_marker() -> String {
    "ksp".to_string()
}

fn default_source_extensions() -> Vec<String> {
    vec!["kt".to_string(), "kts".to_string(), "java".to_string()]
}

fn default_search_max_depth() -> usize {
    32
}

fn default_search_excluded_dirs() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".gradle".to_string(),
        "build".to_string(),
        "target".to_string(),
        "node_modules".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(priority: Priority) -> DebtItem {
        DebtItem {
            module_name: ":app".to_string(),
            name: "com.example.Foo".to_string(),
            description: "Refactor".to_string(),
            ticket: "JIRA-1".to_string(),
            priority,
            item_type: ItemType::TechDebt,
            source_set: "main".to_string(),
            location: None,
            last_modified: None,
            author: None,
        }
    }

    #[test]
    fn test_priority_mapping() {
        assert_eq!(Priority::from_label("HIGH").rank(), 0);
        assert_eq!(Priority::from_label("MEDIUM").rank(), 1);
        assert_eq!(Priority::from_label("LOW").rank(), 2);
        assert_eq!(Priority::from_label("NONE").rank(), 3);
        assert_eq!(Priority::from_label("").rank(), 3);
        assert_eq!(Priority::from_label("URGENT").rank(), 3);
        assert_eq!(Priority::from_label("URGENT"), Priority::Unspecified);
    }

    #[test]
    fn test_item_type_fallback() {
        assert_eq!(ItemType::from_label("SUPPRESS"), ItemType::Suppress);
        assert_eq!(ItemType::from_label("COMMENT"), ItemType::Comment);
        assert_eq!(ItemType::from_label("TECH_DEBT"), ItemType::TechDebt);
        assert_eq!(ItemType::from_label("SOMETHING_ELSE"), ItemType::TechDebt);
    }

    #[test]
    fn test_identity_key_ignores_occurrence() {
        let a = item(Priority::High);
        let mut b = a.clone();
        b.source_set = "iosArm64".to_string();
        b.location = Some("Foo.kt:3".to_string());
        assert_eq!(a.identity_key(), b.identity_key());

        let c = item(Priority::Low);
        assert_ne!(a.identity_key(), c.identity_key());
    }

    #[test]
    fn test_comment_item() {
        let comment = DebtItem::comment(":app", "TODO: fix".to_string(), "src/A.kt:4".to_string());
        assert_eq!(comment.item_type, ItemType::Comment);
        assert_eq!(comment.source_set, "src/A.kt:4");
        assert_eq!(comment.location.as_deref(), Some("src/A.kt:4"));
        assert!(comment.ticket.is_empty());
        assert_eq!(comment.priority, Priority::Unspecified);
    }

    #[test]
    fn test_serialize_labels() {
        let json = serde_json::to_value(item(Priority::Medium)).unwrap();
        assert_eq!(json["priority"], "MEDIUM");
        assert_eq!(json["type"], "TECH_DEBT");
        assert_eq!(json["moduleName"], ":app");
        assert!(json.get("location").is_none());
    }

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert!(!config.collect_comments);
        assert!(!config.enable_git_metadata);
        assert_eq!(config.placeholder_source_sets, vec!["unknown".to_string()]);
        assert_eq!(config.generated_dir_marker, "ksp");
        assert!(config.search_excluded_dirs.contains(&"build".to_string()));
    }

    #[test]
    fn test_project_dirs_resolved_against_root() {
        let mut config = ReportConfig {
            root_dir: PathBuf::from("/work"),
            ..ReportConfig::default()
        };
        config.projects.insert("app".to_string(), ":app".to_string());
        config.projects.insert("/abs/lib".to_string(), ":lib".to_string());

        let dirs = config.project_dirs();
        assert_eq!(dirs.get(&PathBuf::from("/work/app")), Some(&":app".to_string()));
        assert_eq!(dirs.get(&PathBuf::from("/abs/lib")), Some(&":lib".to_string()));
    }
}
