use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::filter::FilterOptions;

/// A command line manager for the freedesktop.org (XDG) trash.
///
/// Run with no command and no filenames to browse the trash
/// interactively; run with filenames to trash them.
#[derive(Parser, Debug)]
#[command(name = "trashctl", version, about)]
pub struct Cli {
    /// Set log level (debug, info, warn, error, off)
    #[arg(short = 'l', long, global = true, default_value = "warn", value_name = "LEVEL")]
    pub log: String,

    /// Ask for confirmation before executing any action
    #[arg(short = 'c', long, global = true)]
    pub confirm: bool,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Files or directories to trash
    #[arg(value_name = "FILE")]
    pub targets: Vec<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Trash a file or files
    #[command(alias = "tr")]
    Trash(TrashArgs),

    /// List trashed files
    #[command(alias = "ls")]
    List(ListArgs),

    /// Restore a trashed file or files
    #[command(alias = "re")]
    Restore(RestoreArgs),

    /// Clean files from the trash permanently
    #[command(alias = "cl")]
    Clean(CleanArgs),
}

/// Filter flags shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Operate on files matching regex PATTERN
    #[arg(short = 'm', long = "match", value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Operate on files matching GLOB
    #[arg(short = 'g', long, value_name = "GLOB")]
    pub glob: Option<String>,

    /// Operate on files not matching regex PATTERN
    #[arg(short = 'M', long = "not-match", value_name = "PATTERN")]
    pub not_pattern: Option<String>,

    /// Operate on files not matching GLOB
    #[arg(short = 'G', long = "not-glob", value_name = "GLOB")]
    pub not_glob: Option<String>,

    /// Operate on files modified on DATE
    #[arg(short = 'O', long, value_name = "DATE")]
    pub on: Option<String>,

    /// Operate on files modified after DATE
    #[arg(short = 'A', long, value_name = "DATE")]
    pub after: Option<String>,

    /// Operate on files modified before DATE
    #[arg(short = 'B', long, value_name = "DATE")]
    pub before: Option<String>,

    /// Operate on files only
    #[arg(short = 'F', long)]
    pub files_only: bool,

    /// Operate on directories only
    #[arg(short = 'D', long)]
    pub dirs_only: bool,

    /// Operate on files larger than SIZE
    #[arg(short = 'N', long, value_name = "SIZE")]
    pub min_size: Option<String>,

    /// Operate on files smaller than SIZE
    #[arg(short = 'X', long, value_name = "SIZE")]
    pub max_size: Option<String>,

    /// Operate on files matching octal MODE
    #[arg(short = 'x', long, value_name = "MODE")]
    pub mode: Option<String>,
}

impl FilterArgs {
    /// Turns the raw flags into filter configuration. `ignore_hidden`
    /// comes from the caller because only disk discovery skips dotfiles
    /// by default.
    pub fn to_options(&self, ignore_hidden: bool, names: Vec<String>) -> FilterOptions {
        FilterOptions {
            on: self.on.clone(),
            after: self.after.clone(),
            before: self.before.clone(),
            glob: self.glob.clone(),
            not_glob: self.not_glob.clone(),
            regex: self.pattern.clone(),
            not_regex: self.not_pattern.clone(),
            names,
            files_only: self.files_only,
            dirs_only: self.dirs_only,
            ignore_hidden,
            min_size: self.min_size.clone(),
            max_size: self.max_size.clone(),
            mode: self.mode.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct TrashArgs {
    /// Files to trash, or filter names when --work-dir is given
    #[arg(value_name = "FILE")]
    pub targets: Vec<String>,

    /// Operate on files recursively
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Operate on files in this DIRECTORY
    #[arg(short = 'w', long, value_name = "DIRECTORY")]
    pub work_dir: Option<PathBuf>,

    /// Operate on hidden files
    #[arg(short = 'H', long)]
    pub hidden: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by these filenames
    #[arg(value_name = "FILE")]
    pub targets: Vec<String>,

    /// Operate on files trashed from this DIRECTORY
    #[arg(short = 'o', long, value_name = "DIRECTORY")]
    pub original_path: Option<PathBuf>,

    /// List files and quit
    #[arg(short = 'n', long)]
    pub non_interactive: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Filter by these filenames
    #[arg(value_name = "FILE")]
    pub targets: Vec<String>,

    /// Operate on files trashed from this DIRECTORY
    #[arg(short = 'o', long, value_name = "DIRECTORY")]
    pub original_path: Option<PathBuf>,

    /// Operate on all files in the trash
    #[arg(short = 'a', long)]
    pub all: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Filter by these filenames
    #[arg(value_name = "FILE")]
    pub targets: Vec<String>,

    /// Operate on files trashed from this DIRECTORY
    #[arg(short = 'o', long, value_name = "DIRECTORY")]
    pub original_path: Option<PathBuf>,

    /// Operate on all files in the trash
    #[arg(short = 'a', long)]
    pub all: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}
