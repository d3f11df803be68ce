use std::path::PathBuf;

use anyhow::Result;
use serde_json::Value as JsonValue;

use savekit::{CorruptPolicy, ExecutableDir, Registry, SaveConfig, Scope};

pub(crate) fn open_registry(
    base_dir: Option<PathBuf>,
    policy: CorruptPolicy,
) -> Result<Registry> {
    let config = match base_dir {
        Some(dir) => SaveConfig::from_source(&dir)?,
        None => SaveConfig::from_source(&ExecutableDir)?,
    };
    Ok(Registry::open(config.with_corrupt_policy(policy)))
}

pub(crate) fn scope_for(private: Option<&str>) -> Scope<'_> {
    match private {
        Some(caller) => Scope::Private(caller),
        None => Scope::Global,
    }
}

/// Read a CLI token as JSON, falling back to a bare string.
pub(crate) fn parse_cli_value(token: &str) -> JsonValue {
    serde_json::from_str(token).unwrap_or_else(|_| JsonValue::String(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    #[test]
    fn cli_values_prefer_json() {
        assert_eq!(parse_cli_value("12"), json!(12));
        assert_eq!(parse_cli_value("[true,false]"), json!([true, false]));
        assert_eq!(parse_cli_value("\"12\""), json!("12"));
        assert_eq!(parse_cli_value("hello world"), json!("hello world"));
    }

    #[test]
    fn scope_from_flag() {
        assert_eq!(scope_for(None), Scope::Global);
        assert_eq!(scope_for(Some("mod.a")), Scope::Private("mod.a"));
    }

    #[test]
    fn explicit_base_dir_wins() {
        let registry = open_registry(Some(PathBuf::from("/tmp/sk")), CorruptPolicy::Fail).unwrap();
        assert_eq!(registry.path(), Path::new("/tmp/sk/data/save.ultradata"));
        assert_eq!(registry.config().on_corrupt, CorruptPolicy::Fail);
    }
}
