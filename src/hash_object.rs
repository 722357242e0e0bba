use crate::error::Result;
use crate::object::{Object, ObjectKind};
use crate::object_id::ObjectId;
use crate::object_write::write_object;
use crate::repository::ObjectPaths;
use std::fs;
use std::path::Path;

/// In Git, each file is stored as a *blob object*.
///
/// The blob’s raw (uncompressed) format is:
///     "blob <size>\0<content of file>"
///
/// Hashing never touches a store. `raw` is decoded as `kind` first, so a
/// malformed tree, commit or tag is rejected instead of hashed.
///
/// Example:
///   File content: "hello world\n"
///   Uncompressed form: "blob 12\0hello world\n"
///   SHA-1 hash: 3b18e512dba79e4c8300dd08aeb37f8e728b8dad
pub fn hash_object(raw: &[u8], kind: ObjectKind) -> Result<ObjectId> {
    let object = Object::deserialize(kind, raw)?;
    write_object(&object, None)
}

/// Hash the contents of `file` as a `kind` object, storing it when `store` is given.
pub fn hash_file(
    file: &Path,
    kind: ObjectKind,
    store: Option<&dyn ObjectPaths>,
) -> Result<ObjectId> {
    let raw = fs::read(file)?;
    let object = Object::deserialize(kind, &raw)?;
    write_object(&object, store)
}
