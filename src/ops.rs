use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::{
    cli::{Cli, CleanArgs, Command, ListArgs, RestoreArgs, TrashArgs},
    disk,
    fileview::{DiskFile, FileEntry},
    filter::Filter,
    pathutil,
    prompt::Prompter,
    trash::{self, DirSizesStore, roots},
    ui::{self, Mode},
};

pub fn run(cli: &Cli, prompter: &dyn Prompter) -> Result<()> {
    roots::ensure_home_trash().context("cannot create home trash directories")?;

    match &cli.command {
        None => default_action(cli, prompter),
        Some(Command::Trash(args)) => run_trash(cli, args, prompter),
        Some(Command::List(args)) => run_list(args),
        Some(Command::Restore(args)) => run_restore(cli, args, prompter),
        Some(Command::Clean(args)) => run_clean(cli, args, prompter),
    }
}

/// No subcommand: trash the named files, or browse the trash when
/// nothing was named.
fn default_action(cli: &Cli, prompter: &dyn Prompter) -> Result<()> {
    if !cli.targets.is_empty() {
        let mut entries = Vec::new();
        for target in &cli.targets {
            match DiskFile::from_path(target) {
                Ok(file) => entries.push(FileEntry::Disk(file)),
                Err(e) => warn!("cannot trash '{}': {e}", target.display()),
            }
        }
        return confirm_trash(cli.confirm, &entries, prompter);
    }

    let filter = Filter::new(cli.filter.to_options(false, vec![]))?;
    let files = enumerate(&filter, None);
    if files.is_empty() {
        println!("{}", empty_message(&filter, None));
        return Ok(());
    }

    let (selected, mode) = ui::select(files, false, false, "", Mode::Interactive)?;
    if selected.is_empty() {
        return Ok(());
    }

    match mode {
        Mode::Restoring => confirm_restore(cli.confirm, &selected, prompter),
        Mode::Cleaning => confirm_clean(cli.confirm, &selected, prompter),
        _ => Ok(()),
    }
}

fn run_trash(cli: &Cli, args: &TrashArgs, prompter: &dyn Prompter) -> Result<()> {
    let mut entries = Vec::new();
    let mut names = Vec::new();

    for target in &args.targets {
        if args.work_dir.is_some() {
            names.push(target.clone());
            continue;
        }
        match DiskFile::from_path(Path::new(target)) {
            Ok(file) => entries.push(FileEntry::Disk(file)),
            Err(_) => {
                debug!("'{target}' isn't a file, treating it as a filter name");
                names.push(target.clone());
            }
        }
    }

    let filter = Filter::new(args.filter.to_options(!args.hidden, names))?;

    // Nothing named directly: discover by filter under the work dir.
    if entries.is_empty() {
        let work_dir = args.work_dir.clone().unwrap_or_default();
        entries = disk::find_files(&work_dir, args.recursive, &filter);
        if entries.is_empty() {
            println!("no files to trash");
            return Ok(());
        }
    }

    let workdir = args
        .work_dir
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_default();
    let (selected, _) = ui::select(entries, false, false, &workdir, Mode::Trashing)?;
    if selected.is_empty() {
        return Ok(());
    }

    confirm_trash(cli.confirm, &selected, prompter)
}

fn run_list(args: &ListArgs) -> Result<()> {
    let filter = Filter::new(
        args.filter
            .to_options(false, args.targets.clone()),
    )?;
    let ogdir = args.original_path.as_deref().map(pathutil::clean_path);

    let files = enumerate(&filter, ogdir.as_deref());
    if files.is_empty() {
        println!("{}", empty_message(&filter, ogdir.as_deref()));
        return Ok(());
    }

    ui::show(files, args.non_interactive, "")
}

fn run_restore(cli: &Cli, args: &RestoreArgs, prompter: &dyn Prompter) -> Result<()> {
    let filter = Filter::new(
        args.filter
            .to_options(false, args.targets.clone()),
    )?;
    let ogdir = args.original_path.as_deref().map(pathutil::clean_path);

    let files = enumerate(&filter, ogdir.as_deref());
    if files.is_empty() {
        println!("no files to restore");
        return Ok(());
    }

    let (selected, _) = ui::select(files, args.all, args.all, "", Mode::Restoring)?;
    if selected.is_empty() {
        return Ok(());
    }

    confirm_restore(cli.confirm || args.all, &selected, prompter)
}

fn run_clean(cli: &Cli, args: &CleanArgs, prompter: &dyn Prompter) -> Result<()> {
    let filter = Filter::new(
        args.filter
            .to_options(false, args.targets.clone()),
    )?;
    let ogdir = args.original_path.as_deref().map(pathutil::clean_path);

    let files = enumerate(&filter, ogdir.as_deref());
    if files.is_empty() {
        println!("no files to clean");
        return Ok(());
    }

    let (selected, _) = ui::select(files, args.all, args.all, "", Mode::Cleaning)?;
    if selected.is_empty() {
        return Ok(());
    }

    confirm_clean(cli.confirm, &selected, prompter)
}

/// Lists every trash root through the directory-sizes cache, then
/// flushes the cache so new directories get their aggregates recorded
/// for the next run.
fn enumerate(filter: &Filter, ogdir: Option<&Path>) -> Vec<FileEntry> {
    let trash_roots = roots::all_trash_roots();
    let mut sizes = DirSizesStore::load(&trash_roots);
    let files = trash::list_all(ogdir, filter, &sizes);
    sizes.flush(&trash_roots);
    files
}

fn empty_message(filter: &Filter, ogdir: Option<&Path>) -> &'static str {
    if filter.blank() && ogdir.is_none() {
        "trash is empty"
    } else {
        "no files to show"
    }
}

fn confirm_trash(ask: bool, files: &[FileEntry], prompter: &dyn Prompter) -> Result<()> {
    if files.is_empty() {
        return Ok(());
    }
    if ask && !prompter.confirm(&format!("trash {} selected files?", files.len()))? {
        println!("not doing anything");
        return Ok(());
    }

    let trashed = trash::trash_all(files);
    println!("trashed {} file{}", trashed, plural(trashed));
    Ok(())
}

fn confirm_restore(ask: bool, files: &[FileEntry], prompter: &dyn Prompter) -> Result<()> {
    if ask && !prompter.confirm(&format!("restore {} selected files?", files.len()))? {
        println!("not doing anything");
        return Ok(());
    }

    let result = trash::restore(files, prompter);
    match result.error {
        Some(e) => Err(e.context(format!("restored {} files before error", result.completed))),
        None => {
            println!("restored {} file{}", result.completed, plural(result.completed));
            Ok(())
        }
    }
}

fn confirm_clean(ask: bool, files: &[FileEntry], prompter: &dyn Prompter) -> Result<()> {
    let confirmed = prompter.confirm(&format!(
        "remove {} selected files permanently from the trash?",
        files.len()
    ))? && (!ask
        || prompter.confirm(&format!(
            "really remove all these {} selected files permanently from the trash forever??",
            files.len()
        ))?);

    if !confirmed {
        println!("not doing anything");
        return Ok(());
    }

    let result = trash::purge(files);
    match result.error {
        Some(e) => Err(e.context(format!("removed {} files before error", result.completed))),
        None => {
            println!("removed {} file{}", result.completed, plural(result.completed));
            Ok(())
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
