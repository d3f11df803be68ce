use anyhow::Result;

use super::util::{parse_cli_value, scope_for};
use savekit::{PersistentValue, Registry, Scope, SetOutcome, ValueKind};

pub(crate) fn cmd_set(
    registry: &Registry,
    key: &str,
    value: &str,
    kind: Option<&str>,
    private: Option<&str>,
) -> Result<()> {
    let scope = scope_for(private);
    let outcome = match kind {
        Some(atom) => {
            let kind = ValueKind::from_atom(atom)?;
            registry.put(key, PersistentValue::parse(kind, value)?, scope)?
        }
        None => registry.put_dynamic(key, &parse_cli_value(value), scope)?,
    };
    println!("{}", describe_outcome(key, value, scope, outcome));
    Ok(())
}

fn describe_outcome(key: &str, value: &str, scope: Scope<'_>, outcome: SetOutcome) -> String {
    match outcome {
        SetOutcome::Created => format!("stored `{key}` in {scope} data"),
        SetOutcome::Updated => format!("updated `{key}` in {scope} data"),
        SetOutcome::Ignored => format!("value `{value}` cannot be stored; nothing written"),
    }
}
