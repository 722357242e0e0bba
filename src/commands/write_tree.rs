use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use loose_objects::{
    Blob, Object, ObjectId, ObjectKind, ObjectPaths, Repository, Tree, TreeEntry, hash_file,
    write_object,
};
use std::fs::{self, Metadata};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Snapshot the worktree into tree objects and return the root tree id.
///
/// Files become blobs, directories become trees; empty directories are
/// skipped, as are paths excluded by ignore files.
pub fn git_write_tree(repo: &Repository) -> Result<ObjectId> {
    let Some(id) = git_write_tree_with_path(repo, repo.worktree())? else {
        bail!("nothing to snapshot in {}", repo.worktree().display())
    };
    Ok(id)
}

pub fn git_write_tree_with_path(store: &dyn ObjectPaths, path: &Path) -> Result<Option<ObjectId>> {
    let walker = WalkBuilder::new(path)
        .max_depth(Some(1))
        .hidden(false)
        .build();
    // sadly ignore::Walk does not provide an easy way to ignore itself or .git
    let entries: Vec<_> = walker
        .filter_map(|e| {
            let entry = e.ok()?;
            if entry.depth() == 0 || entry.file_name() == ".git" {
                None
            } else {
                Some(entry)
            }
        })
        .collect();
    // Tree serialization puts the entries in canonical order.
    let mut tree = Tree::new();
    for entry in entries {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("unknown file type for {}", path.display()))?;
        let id = if file_type.is_dir() {
            let Some(id) = git_write_tree_with_path(store, path)? else {
                continue;
            };
            id
        } else if file_type.is_symlink() {
            let target = fs::read_link(path)
                .with_context(|| format!("reading link {}", path.display()))?;
            let blob = Blob::new(target.as_os_str().as_encoded_bytes().to_vec());
            write_object(&Object::from(blob), Some(store))?
        } else {
            hash_file(path, ObjectKind::Blob, Some(store))
                .with_context(|| format!("storing {}", path.display()))?
        };
        let mode = get_mode_for_entry(&entry.metadata().context("reading metadata")?);
        let name = entry
            .file_name()
            .to_str()
            .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
        tree.insert(TreeEntry::new(mode, name, id)?);
    }
    if tree.is_empty() {
        Ok(None)
    } else {
        Ok(Some(write_object(&Object::from(tree), Some(store))?))
    }
}

pub fn get_mode_for_entry(meta: &Metadata) -> &'static str {
    if meta.is_dir() {
        "40000"
    } else if meta.is_symlink() {
        "120000"
    } else if meta.permissions().mode() & 0o111 != 0 {
        "100755"
    } else {
        "100644"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loose_objects::{ObjectDir, read_object};
    use tempfile::TempDir;

    #[test]
    fn snapshots_nested_directories() {
        let work = TempDir::new().unwrap();
        let objects = TempDir::new().unwrap();
        fs::write(work.path().join("hello.txt"), "hello world\n").unwrap();
        fs::create_dir(work.path().join("empty")).unwrap();
        fs::create_dir(work.path().join("src")).unwrap();
        fs::write(work.path().join("src").join("lib.rs"), "").unwrap();

        let store = ObjectDir::new(objects.path());
        let id = git_write_tree_with_path(&store, work.path())
            .unwrap()
            .unwrap();
        let root = read_object(&store, &id).unwrap().unwrap().into_tree().unwrap();
        let paths: Vec<_> = root.iter().map(TreeEntry::path).collect();
        assert_eq!(paths, ["hello.txt", "src"]);
        assert_eq!(
            root.get("hello.txt").unwrap().id().to_string(),
            "3b18e512dba79e4c8300dd08aeb37f8e728b8dad"
        );
        let src = root.get("src").unwrap();
        assert!(src.is_tree());
        assert!(read_object(&store, &src.id()).unwrap().is_some());
    }

    #[test]
    fn empty_directory_has_no_tree() {
        let work = TempDir::new().unwrap();
        let objects = TempDir::new().unwrap();
        let store = ObjectDir::new(objects.path());
        assert!(git_write_tree_with_path(&store, work.path()).unwrap().is_none());
    }
}
