use crate::error::{ObjectError, Result};
use bstr::{BStr, BString, ByteSlice};
use std::mem;

/// Key-value list with message: the payload of commit and tag objects.
///
/// ```text
/// tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147
/// parent 206941306e8a8af65b66eaaaea388a7ae24d49a0
/// author Thibault Polge <thibault@thb.lt> 1527025023 +0200
/// gpgsig -----BEGIN PGP SIGNATURE-----
///  iQIzBAABCAAdFiEExwXquOM8bWb4Q2zVGxM2FxoLkGQFAlsEjZQACgkQGxM2FxoL
///  -----END PGP SIGNATURE-----
///
/// Create first draft
/// ```
///
/// A value continues onto every following line that starts with a single
/// space. The first blank line ends the headers; the rest is the message,
/// kept byte for byte.
///
/// Header order is kept as first seen. A repeated key (`parent` on a merge)
/// collects its values in order instead of overwriting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Kvlm {
    headers: Vec<(BString, KvlmValue)>,
    message: BString,
}

/// A header slot holds one value or, once its key repeats, all of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KvlmValue {
    Single(BString),
    Many(Vec<BString>),
}

impl KvlmValue {
    pub fn first(&self) -> Option<&BStr> {
        match self {
            KvlmValue::Single(value) => Some(value.as_bstr()),
            KvlmValue::Many(values) => values.first().map(|v| v.as_bstr()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BStr> {
        let values = match self {
            KvlmValue::Single(value) => std::slice::from_ref(value),
            KvlmValue::Many(values) => values.as_slice(),
        };
        values.iter().map(|v| v.as_bstr())
    }

    pub fn len(&self) -> usize {
        match self {
            KvlmValue::Single(_) => 1,
            KvlmValue::Many(values) => values.len(),
        }
    }

    fn push(&mut self, value: BString) {
        match self {
            KvlmValue::Single(first) => {
                let first = mem::take(first);
                *self = KvlmValue::Many(vec![first, value]);
            }
            KvlmValue::Many(values) => values.push(value),
        }
    }
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key`, keeping any values already there.
    ///
    /// Keys must be non-empty and free of spaces and newlines, otherwise the
    /// header line could not be read back.
    pub fn insert(&mut self, key: impl Into<BString>, value: impl Into<BString>) -> Result<()> {
        let key = key.into();
        if key.is_empty() || key.contains(&b' ') || key.contains(&b'\n') {
            return Err(ObjectError::format(0, format!("invalid header key {key:?}")));
        }
        self.push(key, value.into());
        Ok(())
    }

    fn push(&mut self, key: BString, value: BString) {
        match self.headers.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => slot.push(value),
            None => self.headers.push((key, KvlmValue::Single(value))),
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&KvlmValue> {
        self.headers
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, v)| v)
    }

    /// First value stored under `key`.
    pub fn first(&self, key: &[u8]) -> Option<&BStr> {
        self.get(key).and_then(KvlmValue::first)
    }

    /// Every value stored under `key`, in insertion order.
    pub fn get_all(&self, key: &[u8]) -> Vec<&BStr> {
        self.get(key).map(|v| v.iter().collect()).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BStr> {
        self.headers.iter().map(|(k, _)| k.as_bstr())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BStr, &KvlmValue)> {
        self.headers.iter().map(|(k, v)| (k.as_bstr(), v))
    }

    pub fn message(&self) -> &BStr {
        self.message.as_bstr()
    }

    pub fn set_message(&mut self, message: impl Into<BString>) {
        self.message = message.into();
    }

    pub fn parse(raw: &[u8]) -> Result<Kvlm> {
        let mut kvlm = Kvlm::new();
        let mut start = 0;
        loop {
            let space = raw[start..].find_byte(b' ').map(|i| start + i);
            let newline = raw[start..].find_byte(b'\n').map(|i| start + i);
            let space = match (space, newline) {
                (Some(spc), Some(nl)) if spc < nl => spc,
                (Some(spc), None) => spc,
                (_, Some(nl)) if nl == start => {
                    kvlm.message = BString::from(&raw[nl + 1..]);
                    return Ok(kvlm);
                }
                (_, Some(_)) => return Err(ObjectError::parse(start, "header line has no value")),
                (None, None) => {
                    return Err(ObjectError::parse(start, "missing blank line before message"));
                }
            };
            if space == start {
                return Err(ObjectError::parse(start, "empty header key"));
            }

            // The value ends at the first newline not followed by a space.
            let mut end = space;
            loop {
                end = match raw[end + 1..].find_byte(b'\n') {
                    Some(i) => end + 1 + i,
                    None => return Err(ObjectError::parse(start, "unterminated header value")),
                };
                match raw.get(end + 1) {
                    Some(b' ') => continue,
                    Some(_) => break,
                    None => return Err(ObjectError::parse(end, "headers run past end of data")),
                }
            }

            let key = BString::from(&raw[start..space]);
            let value = BString::from(raw[space + 1..end].replace(b"\n ", b"\n"));
            kvlm.push(key, value);
            start = end + 1;
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, value) in &self.headers {
            for v in value.iter() {
                out.extend_from_slice(key);
                out.push(b' ');
                out.extend_from_slice(&v.replace(b"\n", b"\n "));
                out.push(b'\n');
            }
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }
}
