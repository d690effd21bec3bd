//! The trash engine: root discovery, the `.trashinfo` codec, the
//! `directorysizes` cache, and the move/restore/purge operations.

pub mod dirsizes;
pub mod engine;
pub mod roots;
pub mod sidecar;

pub use dirsizes::DirSizesStore;
pub use engine::{BatchResult, list_all, purge, restore, trash_all, trash_file};

pub(crate) const FILES_DIR: &str = "files";
pub(crate) const INFO_DIR: &str = "info";
pub(crate) const TRASHINFO_EXT: &str = "trashinfo";
