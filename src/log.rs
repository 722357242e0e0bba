use crate::error::Result;
use crate::object::{Object, ObjectKind};
use crate::object_id::ObjectId;
use crate::object_read::read_object_of_kind;
use crate::repository::ObjectPaths;
use bstr::ByteSlice;
use std::collections::HashSet;
use std::io::Write;
use tracing::debug;

/// Write the ancestry of `start` as a Graphviz digraph.
///
/// Each commit is visited once. A parent missing from the store ends that
/// line of history instead of failing the walk.
pub fn render_graphviz(store: &dyn ObjectPaths, start: ObjectId, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "digraph log{{")?;
    writeln!(out, "  node[shape=rect]")?;

    let mut seen = HashSet::new();
    let mut pending = vec![start];
    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Some(Object::Commit(commit)) = read_object_of_kind(store, &id, ObjectKind::Commit)?
        else {
            debug!(%id, "commit missing from store, stopping here");
            continue;
        };

        let message = commit.message().to_str_lossy();
        let first_line = message.trim().lines().next().unwrap_or_default();
        let label = first_line.replace('\\', "\\\\").replace('"', "\\\"");
        let short = &id.to_hex()[..7];
        writeln!(out, "  c_{id} [label=\"{short}: {label}\"]")?;

        let parents = commit.parents().map_err(|e| e.in_object(id))?;
        for parent in parents.iter() {
            writeln!(out, "  c_{id} -> c_{parent};")?;
        }
        // Reversed so the first parent is walked first.
        pending.extend(parents.into_iter().rev());
    }
    writeln!(out, "}}")?;
    Ok(())
}
