//! PDF serialization: object numbering, stream materialization, the
//! cross-reference table and the trailer.

mod config;
mod numbering;
mod pdf_writer;
mod syntax;

pub use config::WriterConfig;
pub use pdf_writer::PdfWriter;
