//! Load and save the persistent data aggregate as a single JSON file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::data::PersistentData;
use crate::error::{Result, SaveError};

pub const DATA_DIR_NAME: &str = "data";
pub const DATA_FILE_NAME: &str = "save.ultradata";

/// What to do when the data file exists but cannot be decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CorruptPolicy {
    /// Return `SaveError::Corrupt` and leave the file alone.
    Fail,
    /// Move the bad file aside and start from an empty aggregate.
    #[default]
    Reset,
}

/// Path under `<base>/data`, optionally extended by `subpath` components.
pub fn data_path<I, S>(base: &Path, subpath: I) -> PathBuf
where
    I: IntoIterator<Item = S>,
    S: AsRef<Path>,
{
    let mut path = base.join(DATA_DIR_NAME);
    for part in subpath {
        path.push(part);
    }
    path
}

/// Default location of the data file below a base directory.
pub fn derive_data_file(base: &Path) -> PathBuf {
    data_path(base, [DATA_FILE_NAME])
}

pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| SaveError::StorageWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Load the aggregate from `path`.
///
/// A missing file yields an empty aggregate which is saved straight away, so
/// the file always exists after the first load.
pub fn load(path: &Path, on_corrupt: CorruptPolicy) -> Result<PersistentData> {
    info!(path = %path.display(), "loading persistent data");
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no data file, initialising defaults");
            return init_default(path);
        }
        Err(source) => {
            return Err(SaveError::StorageRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    match serde_json::from_slice::<PersistentData>(&bytes) {
        Ok(data) => Ok(data),
        Err(source) => match on_corrupt {
            CorruptPolicy::Fail => Err(SaveError::Corrupt {
                path: path.to_path_buf(),
                source,
            }),
            CorruptPolicy::Reset => {
                let aside = corrupt_path(path);
                warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %source,
                    "data file is corrupt, starting from empty data"
                );
                fs::rename(path, &aside).map_err(|source| SaveError::StorageWrite {
                    path: aside.clone(),
                    source,
                })?;
                init_default(path)
            }
        },
    }
}

/// Serialize the whole aggregate and replace the file at `path`.
///
/// The JSON is written to a sibling temporary file first and renamed over the
/// target, so an interrupted write leaves the previous contents in place.
pub fn save(path: &Path, data: &PersistentData) -> Result<()> {
    ensure_parent_dirs(path)?;
    let json = serde_json::to_string(data)?;
    let tmp = temp_path(path);
    fs::write(&tmp, json).map_err(|source| SaveError::StorageWrite {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        SaveError::StorageWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    info!(path = %path.display(), "saved persistent data");
    Ok(())
}

fn init_default(path: &Path) -> Result<PersistentData> {
    let data = PersistentData::default();
    save(path, &data)?;
    Ok(data)
}

fn temp_path(path: &Path) -> PathBuf {
    with_suffix(path, ".tmp")
}

/// Where a corrupt data file is moved before starting over: `<file>.corrupt`,
/// or `<file>.corrupt.N` with the first free `N` once earlier backups exist.
pub fn corrupt_path(path: &Path) -> PathBuf {
    let first = with_suffix(path, ".corrupt");
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|n| with_suffix(path, &format!(".corrupt.{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Scope;
    use crate::types::PersistentValue;
    use tempfile::tempdir;

    #[test]
    fn data_path_layout() {
        let base = Path::new("/opt/host");
        assert_eq!(
            derive_data_file(base),
            PathBuf::from("/opt/host/data/save.ultradata")
        );
        assert_eq!(
            data_path(base, ["logs", "a.txt"]),
            PathBuf::from("/opt/host/data/logs/a.txt")
        );
        assert_eq!(data_path(base, Vec::<&str>::new()), PathBuf::from("/opt/host/data"));
    }

    #[test]
    fn first_load_creates_file_with_empty_maps() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = derive_data_file(dir.path());
        assert!(!path.exists());

        let data = load(&path, CorruptPolicy::Fail)?;
        assert!(data.is_empty());
        assert!(path.exists());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 16);
        assert!(object.values().all(|v| v == &serde_json::json!({})));
        Ok(())
    }

    #[test]
    fn save_then_load_roundtrip() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("save.ultradata");
        let mut data = PersistentData::new();
        data.set_global("title", PersistentValue::String("hello".into()));
        data.set_global("ratio", PersistentValue::Float(0.1));
        data.set_private("mod.x", "scores", PersistentValue::IntArray(vec![3, 1, 2]));
        data.set_private("mod.x", "flags", PersistentValue::BoolArray(vec![true, false]));
        save(&path, &data)?;

        let loaded = load(&path, CorruptPolicy::Fail)?;
        assert_eq!(loaded, data);
        assert_eq!(loaded.get_typed::<f32>(Scope::Global, "ratio"), Some(0.1));
        assert!(!temp_path(&path).exists());
        Ok(())
    }

    #[test]
    fn corrupt_file_fails_under_fail_policy() {
        let dir = tempdir().unwrap();
        let path = derive_data_file(dir.path());
        ensure_parent_dirs(&path).unwrap();
        fs::write(&path, "{\"g_int_data\": {\"a\": ").unwrap();

        let err = load(&path, CorruptPolicy::Fail).unwrap_err();
        assert!(matches!(err, SaveError::Corrupt { .. }));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\"g_int_data\": {\"a\": "
        );
    }

    #[test]
    fn corrupt_file_is_moved_aside_under_reset_policy() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = derive_data_file(dir.path());
        ensure_parent_dirs(&path)?;
        fs::write(&path, "not json").unwrap();

        let data = load(&path, CorruptPolicy::Reset)?;
        assert!(data.is_empty());
        assert_eq!(
            fs::read_to_string(with_suffix(&path, ".corrupt")).unwrap(),
            "not json"
        );
        assert_eq!(load(&path, CorruptPolicy::Fail)?, PersistentData::default());
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_treated_as_corrupt() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = derive_data_file(dir.path());
        ensure_parent_dirs(&path)?;
        fs::write(&path, [0xff, 0xfe, 0x7b]).unwrap();

        let err = load(&path, CorruptPolicy::Fail).unwrap_err();
        assert!(matches!(err, SaveError::Corrupt { .. }));

        let data = load(&path, CorruptPolicy::Reset)?;
        assert!(data.is_empty());
        assert_eq!(
            fs::read(with_suffix(&path, ".corrupt")).unwrap(),
            vec![0xff, 0xfe, 0x7b]
        );
        Ok(())
    }

    #[test]
    fn repeated_corruption_keeps_every_backup() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = derive_data_file(dir.path());
        ensure_parent_dirs(&path)?;

        fs::write(&path, "first bad").unwrap();
        load(&path, CorruptPolicy::Reset)?;
        fs::write(&path, "second bad").unwrap();
        load(&path, CorruptPolicy::Reset)?;
        fs::write(&path, "third bad").unwrap();
        load(&path, CorruptPolicy::Reset)?;

        let read = |suffix: &str| fs::read_to_string(with_suffix(&path, suffix)).unwrap();
        assert_eq!(read(".corrupt"), "first bad");
        assert_eq!(read(".corrupt.1"), "second bad");
        assert_eq!(read(".corrupt.2"), "third bad");
        assert_eq!(corrupt_path(&path), with_suffix(&path, ".corrupt.3"));
        Ok(())
    }

    #[test]
    fn save_fails_with_storage_write_when_parent_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("data");
        fs::write(&blocker, "").unwrap();
        let path = derive_data_file(dir.path());

        let err = save(&path, &PersistentData::default()).unwrap_err();
        assert!(err.is_storage_write());
    }
}
