use super::resolve_object;
use anyhow::{Context, Result};
use loose_objects::{Object, ObjectKind, Repository, Tree, read_object_of_kind};
use std::io::{Write, stdout};

pub fn git_ls_tree(repo: &Repository, name_only: bool, name: &str) -> Result<()> {
    let id = resolve_object(repo, name)?;
    let tree = read_object_of_kind(repo, &id, ObjectKind::Tree)?
        .and_then(Object::into_tree)
        .with_context(|| format!("tree {id} not found"))?;
    let mut sout = stdout().lock();
    sout.write_all(format_tree(&tree, name_only).as_bytes())
        .context("write to stdout failed")?;
    Ok(())
}

fn format_tree(tree: &Tree, name_only: bool) -> String {
    let mut out = String::new();
    for entry in tree.iter() {
        if name_only {
            out.push_str(entry.path());
            out.push('\n');
        } else {
            out.push_str(&format!(
                "{} {} {}\t{}\n",
                entry.mode(),
                entry.kind(),
                entry.id(),
                entry.path()
            ));
        }
    }
    out
}
