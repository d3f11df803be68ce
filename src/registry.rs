//! The registry: the entry point client code uses to store and fetch values.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::OnceCell;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::SaveConfig;
use crate::data::{Persistable, PersistentData, Scope};
use crate::error::{Result, SaveError};
use crate::persist;
use crate::types::{PersistentValue, ValueKind};

/// What a set did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOutcome {
    /// The key was new in its scope and kind.
    Created,
    /// An existing value was overwritten.
    Updated,
    /// The value cannot be stored; nothing changed and nothing was written.
    Ignored,
}

impl SetOutcome {
    pub fn existed(self) -> bool {
        matches!(self, SetOutcome::Updated)
    }
}

/// Typed, namespaced key-value registry persisted to a single file.
///
/// The aggregate is loaded on first use and every successful set rewrites the
/// whole file before returning. One lock covers each operation including its
/// save, so a registry can be shared between threads behind an `Arc`.
pub struct Registry {
    config: SaveConfig,
    path: PathBuf,
    data: OnceCell<Mutex<PersistentData>>,
}

impl Registry {
    /// Bind a registry to the data file described by `config`. Nothing is read
    /// until the first operation.
    pub fn open(config: SaveConfig) -> Self {
        let path = config.data_file();
        Self {
            config,
            path,
            data: OnceCell::new(),
        }
    }

    /// Load the data file now instead of on first use.
    pub fn load_now(&self) -> Result<()> {
        self.data().map(drop)
    }

    /// Write the aggregate one last time, if it was ever loaded.
    pub fn close(self) -> Result<()> {
        match self.data.into_inner() {
            Some(data) => {
                let data = data.into_inner().unwrap_or_else(PoisonError::into_inner);
                persist::save(&self.path, &data)
            }
            None => Ok(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    /// Store `value` under `key` in `scope`. Returns whether the key already
    /// held a value of the same kind in that scope; an ignored value reports
    /// `false`.
    pub fn set_persistent(
        &self,
        key: &str,
        value: impl Into<PersistentValue>,
        scope: Scope<'_>,
    ) -> Result<bool> {
        self.put(key, value, scope).map(SetOutcome::existed)
    }

    /// Store an untyped value, inferring its kind. Values that fit none of the
    /// kinds are ignored and report `false`.
    pub fn set_dynamic(&self, key: &str, value: &JsonValue, scope: Scope<'_>) -> Result<bool> {
        self.put_dynamic(key, value, scope).map(SetOutcome::existed)
    }

    /// Like [`Registry::set_persistent`], but tells an ignored value apart
    /// from a newly created key.
    ///
    /// Non-finite floats are ignored without touching the file, since they
    /// cannot be written as JSON.
    pub fn put(
        &self,
        key: &str,
        value: impl Into<PersistentValue>,
        scope: Scope<'_>,
    ) -> Result<SetOutcome> {
        let value = value.into();
        if !value.is_representable() {
            debug!(key = %key, kind = %value.kind(), "ignoring non-finite float value");
            return Ok(SetOutcome::Ignored);
        }
        let mut data = self.data()?;
        let existed = data.set(scope, key, value);
        persist::save(&self.path, &data)?;
        Ok(if existed {
            SetOutcome::Updated
        } else {
            SetOutcome::Created
        })
    }

    pub fn put_dynamic(
        &self,
        key: &str,
        value: &JsonValue,
        scope: Scope<'_>,
    ) -> Result<SetOutcome> {
        match PersistentValue::from_json(value) {
            Some(value) => self.put(key, value, scope),
            None => {
                debug!(key = %key, value = %value, "ignoring value of unsupported kind");
                Ok(SetOutcome::Ignored)
            }
        }
    }

    /// Look up `key` as a `T`. On a miss returns `T::default()` and `false`.
    pub fn try_get_persistent<T: Persistable>(
        &self,
        key: &str,
        scope: Scope<'_>,
    ) -> Result<(T, bool)> {
        let data = self.data()?;
        Ok(match data.get_typed::<T>(scope, key) {
            Some(value) => (value, true),
            None => (T::default(), false),
        })
    }

    /// Look up `key` as a `T`, failing with `SaveError::NotFound` on a miss.
    pub fn get_persistent<T: Persistable>(&self, key: &str, scope: Scope<'_>) -> Result<T> {
        let data = self.data()?;
        data.get_typed::<T>(scope, key).ok_or_else(|| SaveError::NotFound {
            key: key.to_string(),
            scope: scope.to_string(),
        })
    }

    /// Look up `key` with the kind chosen at runtime.
    pub fn get_kind(
        &self,
        kind: ValueKind,
        key: &str,
        scope: Scope<'_>,
    ) -> Result<Option<PersistentValue>> {
        Ok(self.data()?.get(kind, scope, key))
    }

    /// Copy of the whole aggregate.
    pub fn snapshot(&self) -> Result<PersistentData> {
        Ok(self.data()?.clone())
    }

    fn data(&self) -> Result<MutexGuard<'_, PersistentData>> {
        let cell = self.data.get_or_try_init(|| {
            persist::load(&self.path, self.config.on_corrupt).map(Mutex::new)
        })?;
        Ok(cell.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
