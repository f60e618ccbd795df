use crate::models::{OutputFormat, ReportConfig};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "techdebt-report")]
#[command(version, about = "Consolidate tech debt from every module into one report", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Parser, Debug)]
pub enum Commands {
    /// Collect, merge and render the consolidated report
    Generate(GenerateArgs),

    /// Write a config file with every default spelled out
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Path to custom config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Root directory of the build
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Shard file to include (repeatable); discovered under the root when omitted
    #[arg(long = "shard")]
    pub shards: Vec<PathBuf>,

    /// Source file to scan for comments (repeatable); discovered when omitted
    #[arg(long = "source")]
    pub sources: Vec<PathBuf>,

    /// Project directory and its module, as DIR=:module (repeatable)
    #[arg(long = "project", value_parser = parse_project)]
    pub projects: Vec<(PathBuf, String)>,

    /// Collect TODO/FIXME comments from source files
    #[arg(long)]
    pub collect_comments: bool,

    /// Keep suppressed rules found in shards
    #[arg(long)]
    pub collect_suppress: bool,

    /// Attach last author and modification time from git blame
    #[arg(long = "git")]
    pub enable_git_metadata: bool,

    /// Base URL used to link tickets
    #[arg(long = "ticket-url")]
    pub base_ticket_url: Option<String>,

    /// Print a per-module summary table after writing the report
    #[arg(long)]
    pub summary: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the config file
    #[arg(default_value = ".techdebtrc")]
    pub path: PathBuf,
}

fn parse_project(value: &str) -> Result<(PathBuf, String), String> {
    match value.split_once('=') {
        Some((dir, module)) if !dir.is_empty() && !module.is_empty() => {
            Ok((PathBuf::from(dir), module.to_string()))
        }
        _ => Err(format!("expected DIR=:module, got '{}'", value)),
    }
}

impl GenerateArgs {
    /// Override config values with the flags given; relative paths are taken from `cwd`
    pub fn apply(&self, config: &mut ReportConfig, cwd: &Path) {
        let from_cwd = |path: &Path| cwd.join(path);

        if let Some(ref output) = self.output {
            config.output = from_cwd(output);
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(ref root) = self.root {
            config.root_dir = from_cwd(root);
        }
        if !self.shards.is_empty() {
            config.shards = self.shards.iter().map(|s| from_cwd(s)).collect();
        }
        if !self.sources.is_empty() {
            config.sources = self.sources.iter().map(|s| from_cwd(s)).collect();
        }
        for (dir, module) in &self.projects {
            config
                .projects
                .insert(from_cwd(dir).to_string_lossy().into_owned(), module.clone());
        }
        if let Some(ref url) = self.base_ticket_url {
            config.base_ticket_url = Some(url.clone());
        }

        config.collect_comments |= self.collect_comments;
        config.collect_suppress |= self.collect_suppress;
        config.enable_git_metadata |= self.enable_git_metadata;
    }
}
