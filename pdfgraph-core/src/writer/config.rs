/// Options for a single write pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Apply the Flate filter to streams that do not declare a filter and
    /// have not opted out.
    pub compress_streams: bool,
    /// Write a fixed `/ID` so repeated writes are byte-identical. For tests
    /// only.
    pub static_id: bool,
    /// Drop objects unreachable from the trailer and renumber the rest
    /// contiguously in registration order.
    pub compact_object_numbers: bool,
    /// Header version overriding the document's own.
    pub pdf_version: Option<String>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compress_streams: true,
            static_id: false,
            compact_object_numbers: false,
            pdf_version: None,
        }
    }
}

impl WriterConfig {
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress_streams = compress;
        self
    }

    pub fn with_static_id(mut self, static_id: bool) -> Self {
        self.static_id = static_id;
        self
    }

    pub fn with_compact_numbering(mut self, compact: bool) -> Self {
        self.compact_object_numbers = compact;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.pdf_version = Some(version.into());
        self
    }
}
