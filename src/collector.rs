use crate::error::ReportError;
use crate::models::{Collected, DebtItem, ItemType, Priority, ReportConfig};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// One item as written by the annotation front end
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShardRecord {
    #[serde(default, deserialize_with = "nullable")]
    module_name: String,
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    description: String,
    #[serde(default, deserialize_with = "nullable")]
    ticket: String,
    #[serde(default, deserialize_with = "nullable")]
    priority: String,
    #[serde(default, deserialize_with = "nullable")]
    source_set: String,
    #[serde(default, rename = "type", deserialize_with = "nullable")]
    item_type: String,
    #[serde(default)]
    location: Option<String>,
}

impl From<ShardRecord> for DebtItem {
    fn from(record: ShardRecord) -> Self {
        DebtItem {
            module_name: record.module_name,
            name: record.name,
            description: record.description,
            ticket: record.ticket,
            priority: Priority::from_label(&record.priority),
            item_type: ItemType::from_label(&record.item_type),
            source_set: record.source_set,
            location: record.location.filter(|l| !l.is_empty()),
            last_modified: None,
            author: None,
        }
    }
}

/// Treat an explicit `null` like a missing field
fn nullable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads the per-module JSON shards into debt items
#[derive(Debug, Clone)]
pub struct ShardCollector {
    placeholders: Vec<String>,
    generated_dir_marker: String,
    collect_suppress: bool,
}

impl ShardCollector {
    pub fn new(
        placeholders: Vec<String>,
        generated_dir_marker: impl Into<String>,
        collect_suppress: bool,
    ) -> Self {
        Self {
            placeholders,
            generated_dir_marker: generated_dir_marker.into(),
            collect_suppress,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(
            config.placeholder_source_sets.clone(),
            config.generated_dir_marker.clone(),
            config.collect_suppress,
        )
    }

    /// Parse every shard. A shard that cannot be read or decoded is skipped
    /// and reported as a diagnostic; the rest still contribute.
    pub fn collect(&self, shards: &[PathBuf]) -> Collected {
        let mut collected = Collected::default();

        for shard in shards {
            if !shard.exists() {
                tracing::debug!("Shard {} does not exist, skipping", shard.display());
                continue;
            }

            match self.collect_shard(shard) {
                Ok(items) => {
                    tracing::debug!("Read {} items from {}", items.len(), shard.display());
                    collected.items.extend(items);
                }
                Err(error) => collected.skip(error),
            }
        }

        collected
    }

    /// Parse a single shard and repair placeholder source sets from its path
    pub fn collect_shard(&self, shard: &Path) -> Result<Vec<DebtItem>, ReportError> {
        let contents = fs::read_to_string(shard).map_err(|source| ReportError::Io {
            path: shard.to_path_buf(),
            source,
        })?;

        let records: Vec<ShardRecord> =
            serde_json::from_str(&contents).map_err(|source| ReportError::Parse {
                path: shard.to_path_buf(),
                source,
            })?;

        let resolved = resolve_source_set(&absolute(shard), &self.generated_dir_marker);

        let items = records
            .into_iter()
            .map(DebtItem::from)
            .filter(|item| self.collect_suppress || item.item_type != ItemType::Suppress)
            .map(|mut item| {
                if self.is_placeholder(&item.source_set) {
                    if let Some(ref source_set) = resolved {
                        item.source_set = source_set.clone();
                    }
                }
                item
            })
            .collect();

        Ok(items)
    }

    fn is_placeholder(&self, source_set: &str) -> bool {
        self.placeholders.iter().any(|p| p == source_set)
    }
}

/// Source-set name taken from the path segment after the generated-output marker,
/// e.g. `build/generated/ksp/iosArm64/resources/techdebt/report.json` gives `iosArm64`
pub fn resolve_source_set(shard: &Path, marker: &str) -> Option<String> {
    let segments: Vec<&str> = shard
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    let index = segments.iter().position(|s| *s == marker)?;
    segments.get(index + 1).map(|s| s.to_string())
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
