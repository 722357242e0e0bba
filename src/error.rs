use crate::object::ObjectKind;
use crate::object_id::ObjectId;

/// Errors raised while encoding, decoding or storing objects.
///
/// A missing object is not an error: [`crate::read_object`] returns `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    /// The `type SP length NUL` header is malformed or its length does not
    /// match the payload.
    #[error("bad object header at byte {offset}: {reason}")]
    Framing { offset: usize, reason: String },

    /// The header names a type other than blob, commit, tree or tag.
    #[error("unknown object type {0:?}")]
    UnknownType(String),

    /// Truncated or otherwise undecodable payload.
    #[error("parse error at byte {offset}: {reason}")]
    Parse { offset: usize, reason: String },

    /// Structurally readable data that breaks a format rule, e.g. a mode that
    /// is not 5 or 6 digits or a path holding a separator.
    #[error("format violation at byte {offset}: {reason}")]
    FormatViolation { offset: usize, reason: String },

    #[error("invalid object id {0:?}")]
    InvalidId(String),

    #[error("object {id} is a {found}, expected a {expected}")]
    UnexpectedKind {
        id: ObjectId,
        expected: ObjectKind,
        found: ObjectKind,
    },

    /// A stored object failed to decode.
    #[error("corrupt object {id}: {source}")]
    Corrupt {
        id: ObjectId,
        #[source]
        source: Box<ObjectError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ObjectError {
    pub(crate) fn parse(offset: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn format(offset: usize, reason: impl Into<String>) -> Self {
        Self::FormatViolation {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn framing(offset: usize, reason: impl Into<String>) -> Self {
        Self::Framing {
            offset,
            reason: reason.into(),
        }
    }

    /// Attach the id of the object being decoded.
    pub(crate) fn in_object(self, id: ObjectId) -> Self {
        match self {
            Self::Io(_) | Self::Corrupt { .. } | Self::UnexpectedKind { .. } => self,
            other => Self::Corrupt {
                id,
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ObjectError>;
