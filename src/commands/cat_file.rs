use super::resolve_object;
use anyhow::{Context, Result};
use loose_objects::{ObjectKind, Repository, read_object_of_kind};
use std::io::{Write, stdout};

/// Write the payload of `name`, which must be a `kind`, to stdout.
pub fn git_cat_file(repo: &Repository, kind: ObjectKind, name: &str) -> Result<()> {
    let id = resolve_object(repo, name)?;
    let object = read_object_of_kind(repo, &id, kind)?
        .with_context(|| format!("object {id} not found"))?;
    let mut sout = stdout().lock();
    sout.write_all(&object.serialize())
        .context("write to stdout failed")?;
    Ok(())
}
