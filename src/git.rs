use crate::error::ReportError;
use crate::models::{DebtItem, GitInfo, ReportConfig};
use crate::resolver::{split_location, SourceResolver};
use chrono::DateTime;
use git2::{BlameOptions, ErrorCode, Oid, Repository};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

/// Get git repository for a given path, walking up from it
pub fn get_repository(path: &Path) -> Option<Repository> {
    match Repository::discover(path) {
        Ok(repo) => Some(repo),
        Err(e) => {
            tracing::debug!("No git repository found from {}: {}", path.display(), e);
            None
        }
    }
}

/// Attaches author and last-modified data to items from git blame
#[derive(Debug, Clone)]
pub struct GitEnricher {
    enabled: bool,
    resolver: SourceResolver,
}

impl GitEnricher {
    pub fn new(enabled: bool, resolver: SourceResolver) -> Self {
        Self { enabled, resolver }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.enable_git_metadata, SourceResolver::from_config(config))
    }

    /// Enrich every item whose location can be blamed. Items that cannot be
    /// resolved, are uncommitted, or fail to blame keep null provenance.
    pub fn enrich(&self, mut items: Vec<DebtItem>) -> Vec<DebtItem> {
        if !self.enabled {
            return items;
        }

        let Some(repo) = get_repository(self.resolver.root()) else {
            return items;
        };
        let Some(workdir) = repo.workdir().map(canonical) else {
            tracing::debug!("Repository has no working directory, skipping blame");
            return items;
        };

        let mut cache = BlameCache::new(&repo);
        for item in &mut items {
            if let Some(info) = self.git_info(&mut cache, &workdir, item) {
                item.set_git_info(info);
            }
        }

        tracing::debug!("Blamed {} distinct files", cache.len());
        items
    }

    fn git_info(
        &self,
        cache: &mut BlameCache<'_>,
        workdir: &Path,
        item: &DebtItem,
    ) -> Option<GitInfo> {
        let location = item.location.as_deref()?;
        let file = self.resolver.resolve(Some(location), &item.module_name)?;
        // A bare path points at the top of the file
        let line = split_location(location).1.unwrap_or(1);

        let file = canonical(&file);
        let relative = repo_relative(&file, workdir)?;

        match cache.blame(&relative, &file) {
            Ok(Some(blame)) => blame.line(line).cloned(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    "Failed to get Git info for file: {} at line: {}: {}",
                    relative,
                    line,
                    e
                );
                None
            }
        }
    }
}

/// Blame results cached per repository-relative path for one run
pub struct BlameCache<'repo> {
    repo: &'repo Repository,
    entries: HashMap<String, Option<FileBlame>>,
}

impl<'repo> BlameCache<'repo> {
    pub fn new(repo: &'repo Repository) -> Self {
        Self {
            repo,
            entries: HashMap::new(),
        }
    }

    /// Blame for `relative`, queried at most once per run. Files unknown to
    /// HEAD yield `None`; a failed query is reported once and then cached as `None`.
    pub fn blame(&mut self, relative: &str, file: &Path) -> Result<Option<&FileBlame>, ReportError> {
        if !self.entries.contains_key(relative) {
            let (entry, result) = match blame_file(self.repo, relative, file) {
                Ok(blame) => (blame, Ok(())),
                Err(e) => (None, Err(e)),
            };
            self.entries.insert(relative.to_string(), entry);
            result?;
        }

        Ok(self.entries.get(relative).and_then(|entry| entry.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Line ownership for one file, as it reads in the working tree
#[derive(Debug, Clone)]
pub struct FileBlame {
    hunks: Vec<Hunk>,
}

#[derive(Debug, Clone)]
struct Hunk {
    /// 1-based first line
    start: usize,
    lines: usize,
    info: Option<GitInfo>,
}

impl FileBlame {
    /// Provenance of a 1-based working-tree line, or `None` when it is not committed
    pub fn line(&self, line: usize) -> Option<&GitInfo> {
        self.hunks
            .iter()
            .find(|h| h.start <= line && line < h.start + h.lines)
            .and_then(|h| h.info.as_ref())
    }
}

fn blame_file(
    repo: &Repository,
    relative: &str,
    file: &Path,
) -> Result<Option<FileBlame>, ReportError> {
    let git_error = |source| ReportError::Git {
        path: PathBuf::from(relative),
        source,
    };

    if !is_committed(repo, relative).map_err(git_error)? {
        tracing::debug!("{} is not committed, skipping blame", relative);
        return Ok(None);
    }

    let working = fs::read(file).map_err(|source| ReportError::Io {
        path: file.to_path_buf(),
        source,
    })?;

    let mut opts = BlameOptions::new();
    opts.track_copies_same_file(true)
        .track_copies_same_commit_moves(true)
        .track_copies_same_commit_copies(true);

    let committed = repo
        .blame_file(Path::new(relative), Some(&mut opts))
        .map_err(git_error)?;
    // Lines added or edited in the working tree come back with a zero commit id
    let blame = committed.blame_buffer(&working).map_err(git_error)?;

    let mut commits: HashMap<Oid, Option<GitInfo>> = HashMap::new();
    let mut hunks = Vec::with_capacity(blame.len());
    for hunk in blame.iter() {
        let oid = hunk.final_commit_id();
        let info = if oid.is_zero() {
            None
        } else {
            match commits.entry(oid) {
                Entry::Occupied(e) => e.get().clone(),
                Entry::Vacant(e) => e.insert(commit_info(repo, oid)).clone(),
            }
        };

        hunks.push(Hunk {
            start: hunk.final_start_line(),
            lines: hunk.lines_in_hunk(),
            info,
        });
    }

    Ok(Some(FileBlame { hunks }))
}

/// Whether `relative` exists in the HEAD tree
fn is_committed(repo: &Repository, relative: &str) -> Result<bool, git2::Error> {
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    match head.peel_to_tree()?.get_path(Path::new(relative)) {
        Ok(_) => Ok(true),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn commit_info(repo: &Repository, oid: Oid) -> Option<GitInfo> {
    let commit = match repo.find_commit(oid) {
        Ok(commit) => commit,
        Err(e) => {
            tracing::warn!("Failed to read commit {}: {}", oid, e);
            return None;
        }
    };

    let author = commit.author();
    let last_modified = DateTime::from_timestamp(author.when().seconds(), 0)?;

    Some(GitInfo {
        author: author.name().unwrap_or("Unknown").to_string(),
        last_modified,
    })
}

/// Forward-slash path of `file` inside the working directory
fn repo_relative(file: &Path, workdir: &Path) -> Option<String> {
    let relative = match file.strip_prefix(workdir) {
        Ok(relative) => relative,
        Err(_) => {
            tracing::debug!("{} is outside the repository", file.display());
            return None;
        }
    };

    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
