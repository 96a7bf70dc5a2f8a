use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Dangling reference: {0} {1} R was never registered")]
    DanglingReference(u32, u16),

    #[error("Stream data for object {0} {1} was not finished by its provider")]
    StreamIncomplete(u32, u16),

    #[error("Stream sink already finished")]
    SinkFinished,

    #[error("Object belongs to a different document")]
    ForeignObject,

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),

    #[error("Compression error: {0}")]
    CompressionError(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;
