use crate::error::{ObjectError, Result};
use std::fmt;
use std::str::FromStr;

/// SHA-1 of an object's framed bytes.
///
/// Held as the 20 raw digest bytes; displayed as 40 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    pub const LEN: usize = 20;
    pub const HEX_LEN: usize = 40;

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        ObjectId(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ObjectError::InvalidId(hex::encode(bytes)))?;
        Ok(ObjectId(raw))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Loose object location: a 2-digit shard directory and a 38-digit file name.
    pub fn shard(&self) -> (String, String) {
        let hex = self.to_hex();
        let (dir, file) = hex.split_at(2);
        (dir.to_string(), file.to_string())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != Self::HEX_LEN {
            return Err(ObjectError::InvalidId(s.to_string()));
        }
        let mut raw = [0; 20];
        hex::decode_to_slice(s, &mut raw).map_err(|_| ObjectError::InvalidId(s.to_string()))?;
        Ok(ObjectId(raw))
    }
}

impl From<[u8; 20]> for ObjectId {
    fn from(bytes: [u8; 20]) -> Self {
        ObjectId(bytes)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_fixed_width_and_zero_padded() {
        let mut raw = [0u8; 20];
        raw[19] = 0x0f;
        let id = ObjectId::from_bytes(raw);
        assert_eq!(id.to_hex(), format!("{}0f", "0".repeat(38)));
        assert_eq!(id.to_string().len(), 40);
    }

    #[test]
    fn parse_accepts_upper_case_and_displays_lower() {
        let id: ObjectId = "4B825DC642CB6EB9A060E54BF8D69288FBEE4904".parse().unwrap();
        assert_eq!(id.to_string(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn parse_rejects_wrong_length_and_non_hex() {
        assert!(matches!(
            "abc".parse::<ObjectId>(),
            Err(ObjectError::InvalidId(_))
        ));
        assert!(matches!(
            "zz825dc642cb6eb9a060e54bf8d69288fbee4904".parse::<ObjectId>(),
            Err(ObjectError::InvalidId(_))
        ));
    }

    #[test]
    fn shard_splits_two_and_thirty_eight() {
        let id: ObjectId = "4b825dc642cb6eb9a060e54bf8d69288fbee4904".parse().unwrap();
        let (dir, file) = id.shard();
        assert_eq!(dir, "4b");
        assert_eq!(file, "825dc642cb6eb9a060e54bf8d69288fbee4904");
    }
}
