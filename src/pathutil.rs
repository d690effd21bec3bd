use std::{
    env,
    path::{Component, Path, PathBuf},
};

const SPACE: &str = " ";
const SPACE_ENC: &str = "%20";
const NEWLINE: &str = "\n";
const NEWLINE_ENC: &str = "%0A";

/// Resolves `.` and `..` segments without touching the filesystem, so
/// paths whose targets no longer exist (trashed originals) still clean up.
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Normalizes a user-supplied path: inputs starting with `.` are cleaned
/// in place, other relative inputs are joined onto the working directory.
pub fn clean_path(path: &Path) -> PathBuf {
    if path.starts_with(".") || path.starts_with("..") {
        lexical_clean(path)
    } else if path.is_relative() {
        let pwd = env::current_dir().unwrap_or_default();
        lexical_clean(&pwd.join(path))
    } else {
        lexical_clean(path)
    }
}

/// Renders a path for display: the working directory collapses to
/// nothing, `$PWD` to `.`, `$HOME` to `~`, and percent escapes decode.
pub fn unexpand(path: &Path, workdir: &str) -> String {
    let home = env::var("HOME").unwrap_or_default();
    let pwd = env::var("PWD")
        .ok()
        .or_else(|| env::current_dir().ok().map(|d| d.display().to_string()))
        .unwrap_or_default();
    unexpand_in(path, workdir, &pwd, &home)
}

fn unexpand_in(path: &Path, workdir: &str, pwd: &str, home: &str) -> String {
    let mut out = if path.as_os_str().is_empty() {
        String::new()
    } else {
        clean_path(path).display().to_string()
    };

    if !workdir.is_empty() {
        let workdir = clean_path(Path::new(workdir)).display().to_string();
        if let Some(rest) = out.strip_prefix(&workdir) {
            out = rest.to_string();
        }
    } else if home != pwd && !pwd.is_empty() {
        if let Some(rest) = out.strip_prefix(pwd) {
            out = format!(".{rest}");
        }
    }

    if !home.is_empty() {
        if let Some(rest) = out.strip_prefix(home) {
            out = format!("~{rest}");
        }
    }

    out = percent_decode(&out);

    if out.is_empty() {
        out = "/".to_string();
    }

    out
}

/// Encodes only the two characters the `directorysizes` line format
/// cannot carry: space and newline.
pub fn percent_encode(input: &str) -> String {
    input.replace(SPACE, SPACE_ENC).replace(NEWLINE, NEWLINE_ENC)
}

pub fn percent_decode(input: &str) -> String {
    input.replace(SPACE_ENC, SPACE).replace(NEWLINE_ENC, NEWLINE)
}
