//! trashctl — a command line manager for the freedesktop.org trash.
//!
//! The crate splits into a small set of layers: `trash` knows the
//! on-disk spec (roots, sidecars, the directorysizes cache, the
//! move/restore/purge engine), `filter`/`sort`/`disk` work on the
//! uniform [`fileview::FileEntry`] view, and `ui` drives the
//! interactive table the subcommands share.

pub mod cli;
pub mod disk;
pub mod error;
pub mod fileview;
pub mod filter;
pub mod humanize;
pub mod logging;
pub mod ops;
pub mod pathutil;
pub mod prompt;
pub mod sort;
pub mod trash;
pub mod ui;
