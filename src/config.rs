use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Result, SaveError};
use crate::persist::{self, CorruptPolicy};

/// Supplies the base directory the data folder lives under.
pub trait BaseDirSource {
    fn base_dir(&self) -> Result<PathBuf>;
}

impl BaseDirSource for PathBuf {
    fn base_dir(&self) -> Result<PathBuf> {
        Ok(self.clone())
    }
}

impl BaseDirSource for Path {
    fn base_dir(&self) -> Result<PathBuf> {
        Ok(self.to_path_buf())
    }
}

/// The directory holding the running executable.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExecutableDir;

impl BaseDirSource for ExecutableDir {
    fn base_dir(&self) -> Result<PathBuf> {
        let exe = env::current_exe().map_err(|err| SaveError::BaseDir(err.to_string()))?;
        exe.parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| SaveError::BaseDir(format!("{} has no parent", exe.display())))
    }
}

/// Where and how the registry persists its data.
#[derive(Clone, Debug)]
pub struct SaveConfig {
    pub base_dir: PathBuf,
    pub file_name: String,
    pub on_corrupt: CorruptPolicy,
}

impl SaveConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            file_name: persist::DATA_FILE_NAME.to_string(),
            on_corrupt: CorruptPolicy::default(),
        }
    }

    /// Query the source once and build a config from its answer.
    pub fn from_source<S: BaseDirSource + ?Sized>(source: &S) -> Result<Self> {
        Ok(Self::new(source.base_dir()?))
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_corrupt_policy(mut self, on_corrupt: CorruptPolicy) -> Self {
        self.on_corrupt = on_corrupt;
        self
    }

    /// `<base_dir>/data/<file_name>`
    pub fn data_file(&self) -> PathBuf {
        persist::data_path(&self.base_dir, [&self.file_name])
    }
}
