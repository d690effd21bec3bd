use std::{
    env, fs,
    os::unix::fs::DirBuilderExt,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::{
    error::{Error, Result},
    pathutil,
    trash::{FILES_DIR, INFO_DIR},
};

const TRASH_NAME: &str = ".Trash";

pub fn uid() -> u32 {
    rustix::process::getuid().as_raw()
}

/// Mount points in mount-table order, from `/proc/mounts`.
pub fn mount_points() -> Vec<PathBuf> {
    let Ok(table) = fs::read_to_string("/proc/mounts") else {
        warn!("cannot read /proc/mounts, falling back to / only");
        return vec![PathBuf::from("/")];
    };
    table
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(PathBuf::from)
        .collect()
}

/// The per-user home trash, `$XDG_DATA_HOME/Trash`.
pub fn home_trash() -> PathBuf {
    let data_home = env::var("XDG_DATA_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::data_dir)
        .unwrap_or_else(|| {
            let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        });
    data_home.join("Trash")
}

/// Creates the home trash skeleton if it is not there yet. Runs once at
/// startup so later operations can assume `files/` and `info/` exist.
pub fn ensure_home_trash() -> Result<PathBuf> {
    let root = home_trash();
    for sub in [FILES_DIR, INFO_DIR] {
        let dir = root.join(sub);
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
    }
    Ok(root)
}

/// Picks the trash root responsible for `path`: the home trash for
/// anything under `$HOME`, otherwise a per-volume trash on the same
/// mount, created on demand. Failing to find or create one means the
/// file cannot be trashed without crossing filesystems.
pub fn resolve_trash_root(path: &Path) -> Result<PathBuf> {
    let abs = pathutil::clean_path(path);
    let home = env::var("HOME").unwrap_or_default();
    resolve_in(&abs, &home, &mount_points(), uid())
}

fn resolve_in(abs: &Path, home: &str, mounts: &[PathBuf], uid: u32) -> Result<PathBuf> {
    if !home.is_empty() && abs.starts_with(home) {
        return ensure_home_trash();
    }

    let mount = longest_mount_prefix(abs, mounts);
    let sticky = mount.join(TRASH_NAME);

    // A symlinked $MOUNT/.Trash is an attack vector per the trash spec.
    if sticky.is_symlink() {
        warn!("{} is a symbolic link, refusing to use it", sticky.display());
        return Err(Error::CrossFilesystem(abs.to_path_buf()));
    }

    let user_trash = mount.join(format!("{TRASH_NAME}-{uid}"));
    if let Ok(root) = create_volume_trash(&user_trash) {
        return Ok(root);
    }

    // Fall back to the admin-created $MOUNT/.Trash/$UID flavour.
    if sticky.is_dir() {
        if let Ok(root) = create_volume_trash(&sticky.join(uid.to_string())) {
            return Ok(root);
        }
    }

    Err(Error::CrossFilesystem(abs.to_path_buf()))
}

fn create_volume_trash(root: &Path) -> std::io::Result<PathBuf> {
    if !root.is_dir() {
        fs::DirBuilder::new().mode(0o700).create(root)?;
        debug!("created volume trash {}", root.display());
    }
    for sub in [FILES_DIR, INFO_DIR] {
        let dir = root.join(sub);
        if !dir.is_dir() {
            fs::DirBuilder::new().mode(0o700).create(&dir)?;
        }
    }
    Ok(root.to_path_buf())
}

/// Every trash root worth scanning: the home trash plus both per-volume
/// flavours wherever they exist.
pub fn all_trash_roots() -> Vec<PathBuf> {
    all_roots_in(home_trash(), &mount_points(), uid())
}

fn all_roots_in(home: PathBuf, mounts: &[PathBuf], uid: u32) -> Vec<PathBuf> {
    let mut roots = vec![home];

    for mount in mounts {
        let admin = mount.join(TRASH_NAME).join(uid.to_string());
        let user = mount.join(format!("{TRASH_NAME}-{uid}"));
        for candidate in [admin, user] {
            if candidate.symlink_metadata().is_ok() && !roots.contains(&candidate) {
                roots.push(candidate);
            }
        }
    }

    roots
}

fn longest_mount_prefix(path: &Path, mounts: &[PathBuf]) -> PathBuf {
    let mut best = PathBuf::from("/");
    for mount in mounts {
        if path.starts_with(mount) && mount.components().count() > best.components().count() {
            best = mount.clone();
        }
    }
    best
}
