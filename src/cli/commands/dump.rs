use anyhow::Result;

use savekit::{Registry, ValueKind};

pub(crate) fn cmd_dump(registry: &Registry) -> Result<()> {
    let snapshot = registry.snapshot()?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

pub(crate) fn cmd_stats(registry: &Registry) -> Result<()> {
    let snapshot = registry.snapshot()?;
    if snapshot.is_empty() {
        println!("(empty)");
        return Ok(());
    }
    for kind in ValueKind::ALL {
        let (global, private) = snapshot.counts(kind);
        if global + private > 0 {
            println!("{:<9} global={global} private={private}", kind.as_atom());
        }
    }
    let callers = snapshot.callers();
    if !callers.is_empty() {
        let list = callers.into_iter().collect::<Vec<_>>().join(", ");
        println!("callers: {list}");
    }
    Ok(())
}
