use anyhow::Result;

use super::util::scope_for;
use savekit::{Registry, SaveError, ValueKind};

pub(crate) fn cmd_get(
    registry: &Registry,
    key: &str,
    kind: &str,
    private: Option<&str>,
) -> Result<()> {
    let kind = ValueKind::from_atom(kind)?;
    let scope = scope_for(private);
    let value = registry
        .get_kind(kind, key, scope)?
        .ok_or_else(|| SaveError::NotFound {
            key: key.to_string(),
            scope: scope.to_string(),
        })?;
    println!("{value}");
    Ok(())
}
