/// Error types for OOXML preprocessing.
use std::fmt;
use thiserror::Error;

/// Result type for OOXML operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for OOXML operations.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// XML tokenizer error
    #[error("XML error: {0}")]
    Xml(String),

    /// The event stream broke a construct tracker invariant; the scan is aborted
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// A metadata, script or row collaborator failed
    #[error("Handler error: {0}")]
    Handler(String),

    /// Invalid format (fields metadata, attribute values)
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<quick_xml::Error> for OoxmlError {
    fn from(err: quick_xml::Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}

/// The constructs followed by the construct tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructKind {
    Paragraph,
    Run,
    SimpleField,
    Bookmark,
    Hyperlink,
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Paragraph => "paragraph",
            Self::Run => "run",
            Self::SimpleField => "simple field",
            Self::Bookmark => "bookmark",
            Self::Hyperlink => "hyperlink",
        };
        f.write_str(name)
    }
}

/// Fatal breaches of the single forward scan model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A construct opened while another one of the same kind was still open
    #[error("{kind} opened while another {kind} is still open")]
    NestedConstruct { kind: ConstructKind },

    /// A construct closed that the tracker does not hold as open
    #[error("end of {kind} without a matching open {kind}")]
    UnmatchedEnd { kind: ConstructKind },

    /// The scan ended while a construct was still open
    #[error("{kind} still open at end of document")]
    Unterminated { kind: ConstructKind },

    /// An end event arrived with no open element at all
    #[error("unbalanced end element </{qname}>")]
    UnbalancedEnd { qname: String },
}
