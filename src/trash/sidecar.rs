use std::{
    fs::OpenOptions,
    io::Write,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local, NaiveDateTime};

use crate::error::{Error, Result};

/// Deletion date format mandated by the trash spec.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const SECTION: &str = "[Trash Info]";
const KEY_PATH: &str = "Path";
const KEY_DATE: &str = "DeletionDate";

/// The semantic content of a `.trashinfo` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidecar {
    /// Where the file lived before trashing, stored verbatim.
    pub original_path: PathBuf,
    pub deleted_at: DateTime<Local>,
}

impl Sidecar {
    pub fn new(original_path: PathBuf, deleted_at: DateTime<Local>) -> Self {
        Self {
            original_path,
            deleted_at,
        }
    }

    /// Reads and parses the sidecar at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::SidecarMissing(path.to_path_buf())
            } else {
                Error::io(path, e)
            }
        })?;
        Self::parse(&content, path)
    }

    /// Parses the single-section INI subset. Unknown keys are ignored;
    /// keys outside `[Trash Info]` don't count.
    pub fn parse(content: &str, source: &Path) -> Result<Self> {
        let mut in_section = false;
        let mut original: Option<&str> = None;
        let mut date: Option<&str> = None;

        for line in content.lines() {
            let line = line.trim_end();
            if line.starts_with('[') {
                in_section = line == SECTION;
                continue;
            }
            if !in_section {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    KEY_PATH => original = Some(value),
                    KEY_DATE => date = Some(value),
                    _ => {}
                }
            }
        }

        let original = original
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::SidecarMalformed(source.to_path_buf()))?;
        let date = date.ok_or_else(|| Error::SidecarMalformed(source.to_path_buf()))?;

        let deleted_at = NaiveDateTime::parse_from_str(date, TIME_FORMAT)
            .ok()
            .and_then(|naive| naive.and_local_timezone(Local).earliest())
            .ok_or_else(|| Error::SidecarDateUnparseable {
                path: source.to_path_buf(),
                value: date.to_string(),
            })?;

        Ok(Self {
            original_path: PathBuf::from(original),
            deleted_at,
        })
    }

    /// The exact on-disk form, trailing newline included.
    pub fn serialize(&self) -> String {
        format!(
            "{SECTION}\n{KEY_PATH}={}\n{KEY_DATE}={}\n",
            self.original_path.display(),
            self.deleted_at.format(TIME_FORMAT)
        )
    }

    /// Writes the sidecar with the spec's 0600 permission.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| Error::io(path, e))?;
        file.write_all(self.serialize().as_bytes())
            .map_err(|e| Error::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn src() -> PathBuf {
        PathBuf::from("/trash/info/x.trashinfo")
    }

    #[test]
    fn test_round_trip() {
        let deleted = Local.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let sidecar = Sidecar::new(PathBuf::from("/tmp/hello.txt"), deleted);

        let text = sidecar.serialize();
        assert_eq!(
            text,
            "[Trash Info]\nPath=/tmp/hello.txt\nDeletionDate=2024-06-01T12:30:00\n"
        );
        assert_eq!(Sidecar::parse(&text, &src()).unwrap(), sidecar);
    }

    #[test]
    fn test_path_with_spaces_stays_verbatim() {
        let deleted = Local.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let sidecar = Sidecar::new(PathBuf::from("/tmp/my file.txt"), deleted);
        assert!(sidecar.serialize().contains("Path=/tmp/my file.txt\n"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let text = "[Trash Info]\nPath=/tmp/a\nUid=1000\nDeletionDate=2024-06-01T12:00:00\n";
        let sidecar = Sidecar::parse(text, &src()).unwrap();
        assert_eq!(sidecar.original_path, PathBuf::from("/tmp/a"));
    }

    #[test]
    fn test_keys_outside_section_do_not_count() {
        let text = "Path=/evil\n[Trash Info]\nPath=/tmp/a\nDeletionDate=2024-06-01T12:00:00\n";
        let sidecar = Sidecar::parse(text, &src()).unwrap();
        assert_eq!(sidecar.original_path, PathBuf::from("/tmp/a"));

        let text = "[Other]\nPath=/tmp/a\nDeletionDate=2024-06-01T12:00:00\n";
        assert!(matches!(
            Sidecar::parse(text, &src()),
            Err(Error::SidecarMalformed(_))
        ));
    }

    #[test]
    fn test_missing_path_is_malformed() {
        let text = "[Trash Info]\nDeletionDate=2024-06-01T12:00:00\n";
        assert!(matches!(
            Sidecar::parse(text, &src()),
            Err(Error::SidecarMalformed(_))
        ));
    }

    #[test]
    fn test_bad_date_is_its_own_error() {
        let text = "[Trash Info]\nPath=/tmp/a\nDeletionDate=last tuesday\n";
        assert!(matches!(
            Sidecar::parse(text, &src()),
            Err(Error::SidecarDateUnparseable { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Sidecar::load(Path::new("/nope/gone.trashinfo")).unwrap_err();
        assert!(matches!(err, Error::SidecarMissing(_)));
    }
}
