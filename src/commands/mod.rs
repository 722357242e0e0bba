pub mod cat_file;
pub mod commit;
pub mod ls_tree;
pub mod write_tree;

use anyhow::{Context, Result};
use loose_objects::{ObjectId, Repository};

/// Resolve a ref name or hex id to the object it points at.
pub fn resolve_object(repo: &Repository, name: &str) -> Result<ObjectId> {
    repo.resolve(name)
        .with_context(|| format!("failed to resolve {name}"))?
        .with_context(|| format!("{name} does not point at an object yet"))
}
