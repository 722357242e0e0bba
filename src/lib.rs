//! Loose object storage in the Git format.
//!
//! Objects (blobs, trees, commits and tags) are framed as
//! `<type> <size>\0<payload>`, identified by the SHA-1 of that frame and
//! stored zlib-compressed under `<objects>/<2 hex digits>/<38 hex digits>`.
//!
//! - [`kvlm`]: the header-and-message text format of commits and tags
//! - [`tree`]: the binary directory listing format
//! - [`write_object`] / [`read_object`]: framing, hashing and the on-disk store
//!
//! The store reaches the filesystem only through [`ObjectPaths`], which
//! [`Repository`] and [`ObjectDir`] implement.

pub mod error;
pub mod hash_object;
pub mod kvlm;
pub mod log;
pub mod object;
pub mod object_id;
pub mod object_read;
pub mod object_write;
pub mod repository;
pub mod tree;

pub use error::{ObjectError, Result};
pub use hash_object::{hash_file, hash_object};
pub use kvlm::{Kvlm, KvlmValue};
pub use object::{Blob, Commit, Object, ObjectKind, Tag};
pub use object_id::ObjectId;
pub use object_read::{decode_frame, decode_object, read_object, read_object_of_kind};
pub use object_write::{encode_frame, hash_frame, write_object};
pub use repository::{ObjectDir, ObjectPaths, Repository, RepositoryError};
pub use tree::{Tree, TreeEntry, parse_tree, serialize_tree};

/// Decode a commit or tag payload.
pub fn parse_kvlm(raw: &[u8]) -> Result<Kvlm> {
    Kvlm::parse(raw)
}

pub fn serialize_kvlm(kvlm: &Kvlm) -> Vec<u8> {
    kvlm.serialize()
}
