//! Typed, namespaced key-value persistence for plugin-style callers.
//!
//! Values of eight kinds live either in a shared global namespace or in a
//! private namespace per caller identity, and the whole aggregate is saved to
//! one JSON file after every change.

pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod persist;
pub mod registry;
pub mod types;

pub use config::{BaseDirSource, ExecutableDir, SaveConfig};
pub use data::{Persistable, PersistentData, Scope};
pub use error::{Result, SaveError};
pub use persist::{
    CorruptPolicy, DATA_DIR_NAME, DATA_FILE_NAME, data_path, derive_data_file, ensure_parent_dirs,
};
pub use registry::{Registry, SetOutcome};
pub use types::{PersistentValue, ValueKind};
