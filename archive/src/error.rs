//! Error type shared by all archive implementations.

/// Errors that can occur while reading or writing an archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Binary input ended before the requested value.
    #[error("unexpected end of archive data at offset {offset}")]
    UnexpectedEof { offset: usize },
    /// A named element is missing from an unordered block.
    #[error("element '{name}' not found in block '{block}'")]
    ElementNotFound { name: String, block: String },
    /// All elements of an array block have already been read.
    #[error("array block '{block}' has no more elements")]
    ArrayOverrun { block: String },
    /// Fewer or more elements were written to an array block than announced.
    #[error("array block '{block}' expected {expected} elements, got {actual}")]
    ArraySizeMismatch {
        block: String,
        expected: usize,
        actual: usize,
    },
    /// An element exists but holds an incompatible value.
    #[error("element '{name}' has invalid value: {message}")]
    InvalidValue { name: String, message: String },
    /// Blocks were opened and closed out of order.
    #[error("unbalanced blocks: {0}")]
    UnbalancedBlock(String),
    /// The data does not start with a recognized resource header.
    #[error("unknown resource format")]
    UnknownFormat,
    /// JSON document could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// XML document could not be parsed or produced.
    #[error("XML error: {0}")]
    Xml(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub(crate) fn invalid_value(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.to_owned(),
            message: message.into(),
        }
    }
}

impl From<quick_xml::Error> for ArchiveError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}
