//! # pdfgraph
//!
//! Build a PDF as an in-memory object graph and write it out as a valid file.
//!
//! ## Features
//!
//! - **Object Graph**: Dictionaries, arrays and streams that can be shared and mutated after linking
//! - **Indirect Objects**: Automatic object numbering, registration is idempotent
//! - **Streaming Providers**: Stream data generated on demand at write time, lengths computed from what was produced
//! - **Document Assembly**: Page tree, fonts, image XObjects and content streams
//! - **Compression**: Flate encoding of streams (`compression` feature, on by default)
//! - **Deterministic Output**: Static file identifiers for byte-identical test output
//!
//! ## Quick Start
//!
//! ```rust
//! use pdfgraph::{
//!     Document, Font, FontResource, ImageSpec, Page, SolidColorImage, StreamContent, WriterConfig,
//! };
//!
//! # fn main() -> pdfgraph::Result<()> {
//! let mut doc = Document::new();
//!
//! let font = FontResource::new(Font::Helvetica, "F1").build(&mut doc)?;
//!
//! // Pixel data is produced while the file is written.
//! let square = SolidColorImage::rgb(100, 100, [0xFF, 0x7F, 0x00]);
//! let image = square.spec().build(&mut doc, StreamContent::provider(square))?;
//!
//! let contents = doc.new_stream(
//!     b"BT /F1 24 Tf 72 720 Td (Hello) Tj ET q 144 0 0 144 234 288 cm /Im1 Do Q".to_vec(),
//! )?;
//!
//! let page = Page::letter()
//!     .with_font("F1", font)
//!     .with_xobject("Im1", image)
//!     .with_contents(contents)
//!     .build(&mut doc)?;
//! doc.add_page(&page, true)?;
//!
//! let bytes = doc.to_bytes(WriterConfig::default())?;
//! assert!(bytes.starts_with(b"%PDF-1.3"));
//! # Ok(())
//! # }
//! ```

pub mod compression;
pub mod document;
pub mod error;
pub mod graphics;
pub mod objects;
pub mod page;
pub mod provider;
pub mod text;
pub mod writer;

pub use document::{Document, DocumentMetadata, DEFAULT_PDF_VERSION};
pub use error::{PdfError, Result};
pub use graphics::{ColorSpace, ImageSpec, SolidColorImage};
pub use objects::{Object, ObjectHandle, ObjectId, StreamContent};
pub use page::Page;
pub use provider::{StreamDataProvider, StreamSink};
pub use text::{Font, FontEncoding, FontResource};
pub use writer::{PdfWriter, WriterConfig};

/// Current version of pdfgraph
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
