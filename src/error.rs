use thiserror::Error;

/// Errors that may rise while parsing Observation RINEX
#[derive(Error, Debug)]
pub enum Error {
    /// File access or decompression failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip archive could not be walked
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Zip archive contains no Observation RINEX member
    #[error("no observation member found in zip archive")]
    NoObservationMember,

    /// Header is unusable: terminator never found,
    /// or a mandatory field is absent / unparseable
    #[error("malformed header (line {line}): {reason}")]
    MalformedHeader { line: usize, reason: String },

    /// A non blank record field failed to parse as a number.
    /// Blank fields are valid missing values and never raise this.
    #[error("record decoding failed (line {line}): \"{field}\"")]
    RecordDecode { line: usize, field: String },

    /// Selection names a satellite system that is either
    /// not a valid constellation letter, or absent from this file header
    #[error("unknown satellite system \"{0}\"")]
    UnknownSystem(String),
}

impl Error {
    /// Attaches file position context to errors raised
    /// by field level helpers that do not know their line number.
    pub(crate) fn at_line(self, line_no: usize) -> Self {
        match self {
            Self::MalformedHeader { reason, .. } => Self::MalformedHeader {
                line: line_no,
                reason,
            },
            Self::RecordDecode { field, .. } => Self::RecordDecode {
                line: line_no,
                field,
            },
            other => other,
        }
    }

    pub(crate) fn record_decode(field: &str) -> Self {
        Self::RecordDecode {
            line: 0,
            field: field.to_string(),
        }
    }

    pub(crate) fn malformed_header(reason: &str) -> Self {
        Self::MalformedHeader {
            line: 0,
            reason: reason.to_string(),
        }
    }
}
