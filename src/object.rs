use crate::error::{ObjectError, Result};
use crate::kvlm::Kvlm;
use crate::object_id::ObjectId;
use crate::tree::Tree;
use bstr::{BStr, ByteSlice};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    pub fn from_bytes(kind: &[u8]) -> Result<Self> {
        match kind {
            b"blob" => Ok(ObjectKind::Blob),
            b"tree" => Ok(ObjectKind::Tree),
            b"commit" => Ok(ObjectKind::Commit),
            b"tag" => Ok(ObjectKind::Tag),
            other => Err(ObjectError::UnknownType(other.to_str_lossy().into_owned())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }

    /// Kind of object a tree entry with this mode points at.
    pub fn from_mode(mode: &str) -> Self {
        let mode = mode.trim_start_matches('0');
        if mode.starts_with('4') {
            ObjectKind::Tree
        } else if mode.starts_with("16") {
            ObjectKind::Commit
        } else {
            ObjectKind::Blob
        }
    }
}

impl FromStr for ObjectKind {
    type Err = ObjectError;

    fn from_str(kind: &str) -> Result<Self> {
        Self::from_bytes(kind.as_bytes())
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded object. Once built it is never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Commit(Commit),
    Tree(Tree),
    Tag(Tag),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Commit(_) => ObjectKind::Commit,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Tag(_) => ObjectKind::Tag,
        }
    }

    /// Payload bytes, without the `type size\0` header.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Object::Blob(blob) => blob.data.clone(),
            Object::Commit(commit) => commit.kvlm.serialize(),
            Object::Tree(tree) => tree.serialize(),
            Object::Tag(tag) => tag.kvlm.serialize(),
        }
    }

    pub fn deserialize(kind: ObjectKind, payload: &[u8]) -> Result<Object> {
        Ok(match kind {
            ObjectKind::Blob => Object::Blob(Blob::new(payload.to_vec())),
            ObjectKind::Commit => Object::Commit(Commit::new(Kvlm::parse(payload)?)),
            ObjectKind::Tree => Object::Tree(Tree::parse(payload)?),
            ObjectKind::Tag => Object::Tag(Tag::new(Kvlm::parse(payload)?)),
        })
    }

    pub fn into_commit(self) -> Option<Commit> {
        match self {
            Object::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    pub fn into_tree(self) -> Option<Tree> {
        match self {
            Object::Tree(tree) => Some(tree),
            _ => None,
        }
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Object::Blob(blob)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Object::Commit(commit)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Object::Tree(tree)
    }
}

impl From<Tag> for Object {
    fn from(tag: Tag) -> Self {
        Object::Tag(tag)
    }
}

/// Uninterpreted file contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Blob { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A *commit object* in Git represents a snapshot of the repository at a point in time,
/// along with metadata about the author, committer, and commit message.
///
/// A commit object references a single tree object (the root directory snapshot)
/// and optionally one or more parent commits (for merges). Its payload is a
/// [`Kvlm`]:
///
/// ```text
/// tree <tree-id>
/// parent <parent-id>  # optional, repeatable for multiple parents
/// author <name> <email> <timestamp> <timezone>
/// committer <name> <email> <timestamp> <timezone>
///
/// <commit message>
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    kvlm: Kvlm,
}

impl Commit {
    pub fn new(kvlm: Kvlm) -> Self {
        Commit { kvlm }
    }

    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    pub fn tree(&self) -> Result<ObjectId> {
        let value = self
            .kvlm
            .first(b"tree")
            .ok_or_else(|| ObjectError::format(0, "commit has no tree header"))?;
        header_id(value)
    }

    pub fn parents(&self) -> Result<Vec<ObjectId>> {
        self.kvlm
            .get_all(b"parent")
            .into_iter()
            .map(header_id)
            .collect()
    }

    pub fn author(&self) -> Option<&BStr> {
        self.kvlm.first(b"author")
    }

    pub fn message(&self) -> &BStr {
        self.kvlm.message()
    }
}

/// An annotated tag: a [`Kvlm`] naming the tagged object, its type, the tag
/// name and the tagger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    kvlm: Kvlm,
}

impl Tag {
    pub fn new(kvlm: Kvlm) -> Self {
        Tag { kvlm }
    }

    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    pub fn object(&self) -> Result<ObjectId> {
        let value = self
            .kvlm
            .first(b"object")
            .ok_or_else(|| ObjectError::format(0, "tag has no object header"))?;
        header_id(value)
    }

    /// Kind of the tagged object, from the `type` header.
    pub fn kind(&self) -> Result<ObjectKind> {
        let value = self
            .kvlm
            .first(b"type")
            .ok_or_else(|| ObjectError::format(0, "tag has no type header"))?;
        ObjectKind::from_bytes(value)
    }

    pub fn name(&self) -> Option<&BStr> {
        self.kvlm.first(b"tag")
    }

    pub fn message(&self) -> &BStr {
        self.kvlm.message()
    }
}

fn header_id(value: &BStr) -> Result<ObjectId> {
    let text = value
        .to_str()
        .map_err(|_| ObjectError::InvalidId(value.to_str_lossy().into_owned()))?;
    text.parse()
}
