use crate::error::Result;
use crate::object::{Object, ObjectKind};
use crate::object_id::ObjectId;
use crate::repository::{ObjectPaths, loose_object_path};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use sha1::{Digest, Sha1};
use std::io::{self, Write};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

/// The bytes an object id is computed over: `<type> <size>\0<payload>`.
pub fn encode_frame(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let header = format!("{} {}\0", kind, payload.len());
    let mut framed = Vec::with_capacity(header.len() + payload.len());
    framed.extend_from_slice(header.as_bytes());
    framed.extend_from_slice(payload);
    framed
}

/// SHA-1 of already framed bytes.
pub fn hash_frame(framed: &[u8]) -> ObjectId {
    let digest: [u8; 20] = Sha1::digest(framed).into();
    ObjectId::from_bytes(digest)
}

/// Compute the id of `object` and, when `store` is given, persist it.
///
/// Steps:
/// 1. Serialize the payload and prefix it with `"<type> <size>\0"`.
/// 2. Compute the SHA-1 of the framed bytes; hex-encoded, this is the id.
/// 3. Compress the framed bytes using zlib.
/// 4. Store them under `<store>/<first 2 hex chars>/<remaining 38 chars>`.
///
/// An object that is already present is left untouched: its file name is its
/// hash, so the existing file holds the same bytes.
pub fn write_object(object: &Object, store: Option<&dyn ObjectPaths>) -> Result<ObjectId> {
    let framed = encode_frame(object.kind(), &object.serialize());
    let id = hash_frame(&framed);
    let Some(store) = store else {
        return Ok(id);
    };

    let path = loose_object_path(store, &id, true)?;
    if path.exists() {
        trace!(%id, "object already stored");
        return Ok(id);
    }
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::other("object path has no parent directory"))?;
    let mut encoder = ZlibEncoder::new(NamedTempFile::new_in(dir)?, Compression::default());
    encoder.write_all(&framed)?;
    let tmp_file = encoder.finish()?;
    match tmp_file.persist_noclobber(&path) {
        Ok(_) => debug!(%id, kind = %object.kind(), size = framed.len(), "wrote object"),
        // Another writer got there first with identical content.
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
            trace!(%id, "object stored concurrently");
        }
        Err(e) => return Err(e.error.into()),
    }
    Ok(id)
}
