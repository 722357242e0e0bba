use crate::error::{ObjectError, Result};
use crate::object_id::ObjectId;
use crate::object::ObjectKind;
use bstr::ByteSlice;
use std::cmp::Ordering;

/// A *tree object* in Git represents a directory snapshot.
///
/// Each tree entry maps a filename to a blob (file) or another tree (subdirectory),
/// along with its file mode (permissions).
///
/// The raw (uncompressed) format of a tree object is a concatenation of entries:
///
/// ```text
/// "<file mode> <file name>\0<20-byte binary object id>"
/// ```
///
/// - `<file mode>`: ASCII digits like `100644` (normal file), `100755` (executable), or `40000` (directory)
/// - `<file name>`: the file or directory name (no path separators)
/// - `<20-byte binary object id>`: raw SHA-1 bytes of the referenced blob, tree or commit
///
/// There is no entry count: entries run until the end of the payload.
///
/// Entries are written in canonical order, so the same set of entries always
/// hashes to the same id whatever order they were inserted in. Two trees are
/// equal when they hold the same entries, in any order.
#[derive(Clone, Debug, Default)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TreeEntry {
    /// Mode digits exactly as written, 5 or 6 of them.
    raw_mode: String,
    /// `raw_mode` padded to 6 digits.
    mode: String,
    path: String,
    id: ObjectId,
}

impl TreeEntry {
    /// Modes are 5 or 6 digits and are written back exactly as given. The
    /// path must be a single component.
    pub fn new(mode: &str, path: impl Into<String>, id: ObjectId) -> Result<Self> {
        let normalized = normalize_mode(mode.as_bytes(), 0)?;
        let path = path.into();
        validate_path(&path, 0)?;
        Ok(TreeEntry {
            raw_mode: mode.to_string(),
            mode: normalized,
            path,
            id,
        })
    }

    /// Six-digit mode, e.g. `100644` or `040000`, whichever width was written.
    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        ObjectKind::from_mode(&self.mode)
    }

    pub fn is_tree(&self) -> bool {
        self.kind() == ObjectKind::Tree
    }

    /// Mode digits as they appear in the encoded tree.
    pub fn mode_on_disk(&self) -> &str {
        &self.raw_mode
    }
}

/// Git orders tree entries by name, comparing a subtree as if its name ended
/// with `/`. Every other mode, submodules included, compares by bare name.
pub fn canonical_cmp(a: &TreeEntry, b: &TreeEntry) -> Ordering {
    let af = a.path.as_bytes();
    let bf = b.path.as_bytes();
    let min_len = af.len().min(bf.len());
    match af[..min_len].cmp(&bf[..min_len]) {
        Ordering::Equal => {}
        other => return other,
    }
    let a1 = af.get(min_len).copied().or(a.is_tree().then_some(b'/'));
    let b1 = bf.get(min_len).copied().or(b.is_tree().then_some(b'/'));
    a1.cmp(&b1)
}

/// Canonical order, with ties on path broken by mode and id so that the
/// encoding never depends on input order.
fn sort_canonical(entries: &mut [&TreeEntry]) {
    entries.sort_by(|a, b| {
        canonical_cmp(a, b)
            .then_with(|| a.raw_mode.cmp(&b.raw_mode))
            .then_with(|| a.id.cmp(&b.id))
    });
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for Tree {}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<TreeEntry>) -> Self {
        Tree { entries }
    }

    /// Add an entry, replacing any entry with the same path.
    pub fn insert(&mut self, entry: TreeEntry) {
        match self.entries.iter_mut().find(|e| e.path == entry.path) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Entries in the order they were inserted or decoded.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sort_canonical(&mut sorted);
        sorted.into_iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn parse(raw: &[u8]) -> Result<Tree> {
        Ok(Tree {
            entries: parse_tree(raw)?,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        serialize_tree(&self.entries)
    }
}

/// Decode a tree payload into its entries, in stored order.
pub fn parse_tree(raw: &[u8]) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let mut pos = 0;
    while pos < raw.len() {
        let (entry, next) = parse_entry(raw, pos)?;
        entries.push(entry);
        pos = next;
    }
    Ok(entries)
}

fn parse_entry(raw: &[u8], start: usize) -> Result<(TreeEntry, usize)> {
    let space = raw[start..]
        .find_byte(b' ')
        .map(|i| start + i)
        .ok_or_else(|| ObjectError::parse(start, "tree entry mode is not terminated"))?;
    let raw_mode = &raw[start..space];
    let mode = normalize_mode(raw_mode, start)?;

    let path_start = space + 1;
    let nul = raw[path_start..]
        .find_byte(0)
        .map(|i| path_start + i)
        .ok_or_else(|| ObjectError::parse(path_start, "tree entry path is not terminated"))?;
    let path = std::str::from_utf8(&raw[path_start..nul])
        .map_err(|_| ObjectError::format(path_start, "tree entry path is not UTF-8"))?;
    validate_path(path, path_start)?;

    let id_end = nul + 1 + ObjectId::LEN;
    let digest = raw
        .get(nul + 1..id_end)
        .ok_or_else(|| ObjectError::parse(nul + 1, "tree entry object id is truncated"))?;
    let entry = TreeEntry {
        raw_mode: String::from_utf8_lossy(raw_mode).into_owned(),
        mode,
        path: path.to_string(),
        id: ObjectId::from_slice(digest)?,
    };
    Ok((entry, id_end))
}

/// Encode entries in canonical order, whatever order they are given in.
pub fn serialize_tree(entries: &[TreeEntry]) -> Vec<u8> {
    let mut sorted: Vec<_> = entries.iter().collect();
    sort_canonical(&mut sorted);
    let mut out = Vec::new();
    for entry in sorted {
        out.extend_from_slice(entry.mode_on_disk().as_bytes());
        out.push(b' ');
        out.extend_from_slice(entry.path.as_bytes());
        out.push(0);
        out.extend_from_slice(entry.id.as_bytes());
    }
    out
}

fn normalize_mode(mode: &[u8], offset: usize) -> Result<String> {
    if !mode.iter().all(u8::is_ascii_digit) {
        return Err(ObjectError::format(
            offset,
            format!("tree entry mode {:?} is not numeric", mode.as_bstr()),
        ));
    }
    match mode.len() {
        6 => Ok(String::from_utf8_lossy(mode).into_owned()),
        5 => Ok(format!("0{}", String::from_utf8_lossy(mode))),
        n => Err(ObjectError::format(
            offset,
            format!("tree entry mode {:?} has {n} digits", mode.as_bstr()),
        )),
    }
}

fn validate_path(path: &str, offset: usize) -> Result<()> {
    if path.is_empty() {
        return Err(ObjectError::format(offset, "tree entry path is empty"));
    }
    if path.contains(['/', '\0']) {
        return Err(ObjectError::format(
            offset,
            format!("tree entry path {path:?} is not a single component"),
        ));
    }
    Ok(())
}
