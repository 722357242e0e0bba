use crate::error::{ObjectError, Result};
use crate::object::{Object, ObjectKind};
use crate::object_id::ObjectId;
use crate::repository::{ObjectPaths, loose_object_path};
use bstr::ByteSlice;
use flate2::read::ZlibDecoder;
use std::fs::File;
use std::io::{self, Read};
use tracing::{debug, warn};

/// Split framed bytes into their type and payload.
///
/// The header is `<type> <decimal size>\0`; the declared size must match the
/// number of payload bytes exactly.
pub fn decode_frame(raw: &[u8]) -> Result<(ObjectKind, &[u8])> {
    let space = raw
        .find_byte(b' ')
        .ok_or_else(|| ObjectError::framing(0, "missing space after object type"))?;
    let nul = raw[space..]
        .find_byte(0)
        .map(|i| space + i)
        .ok_or_else(|| ObjectError::framing(space, "missing NUL after object size"))?;
    let size = &raw[space + 1..nul];
    if size.is_empty() || !size.iter().all(u8::is_ascii_digit) {
        return Err(ObjectError::framing(
            space + 1,
            format!("object size {:?} is not a decimal number", size.as_bstr()),
        ));
    }
    let size: usize = size
        .to_str_lossy()
        .parse()
        .map_err(|_| ObjectError::framing(space + 1, "object size is out of range"))?;
    let payload = &raw[nul + 1..];
    if size != payload.len() {
        return Err(ObjectError::framing(
            nul + 1,
            format!("declared size {size}, found {} bytes", payload.len()),
        ));
    }
    let kind = ObjectKind::from_bytes(&raw[..space])?;
    Ok((kind, payload))
}

/// Decode framed (uncompressed) bytes into an object.
pub fn decode_object(raw: &[u8]) -> Result<Object> {
    let (kind, payload) = decode_frame(raw)?;
    Object::deserialize(kind, payload)
}

/// Read object `id` from the store.
///
/// `Ok(None)` means the store has no such object.
pub fn read_object(store: &dyn ObjectPaths, id: &ObjectId) -> Result<Option<Object>> {
    let path = loose_object_path(store, id, false)?;
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(%id, "object not found");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let mut raw = Vec::new();
    ZlibDecoder::new(file)
        .read_to_end(&mut raw)
        .map_err(|e| ObjectError::parse(0, format!("zlib stream: {e}")).in_object(*id))?;
    match decode_object(&raw) {
        Ok(object) => {
            debug!(%id, kind = %object.kind(), size = raw.len(), "read object");
            Ok(Some(object))
        }
        Err(e) => {
            let e = e.in_object(*id);
            warn!(path = %path.display(), "{e}");
            Err(e)
        }
    }
}

/// Read object `id` and check that it is a `kind`.
pub fn read_object_of_kind(
    store: &dyn ObjectPaths,
    id: &ObjectId,
    kind: ObjectKind,
) -> Result<Option<Object>> {
    match read_object(store, id)? {
        Some(object) if object.kind() != kind => Err(ObjectError::UnexpectedKind {
            id: *id,
            expected: kind,
            found: object.kind(),
        }),
        other => Ok(other),
    }
}
