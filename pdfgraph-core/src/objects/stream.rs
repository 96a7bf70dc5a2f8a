use crate::objects::ObjectHandle;
use crate::provider::StreamDataProvider;
use std::fmt;
use std::rc::Rc;

/// Where a stream's bytes come from.
#[derive(Clone)]
pub enum StreamContent {
    /// Bytes already in memory.
    Data(Vec<u8>),
    /// Bytes produced at write time.
    Provider(Rc<dyn StreamDataProvider>),
}

impl StreamContent {
    pub fn provider(provider: impl StreamDataProvider + 'static) -> Self {
        StreamContent::Provider(Rc::new(provider))
    }

    /// Resident length, or the provider's declared hint.
    pub fn length_hint(&self) -> Option<u64> {
        match self {
            StreamContent::Data(data) => Some(data.len() as u64),
            StreamContent::Provider(provider) => provider.declared_length(),
        }
    }
}

impl fmt::Debug for StreamContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamContent::Data(data) => f.debug_tuple("Data").field(&data.len()).finish(),
            StreamContent::Provider(provider) => f
                .debug_struct("Provider")
                .field("declared_length", &provider.declared_length())
                .finish(),
        }
    }
}

impl From<Vec<u8>> for StreamContent {
    fn from(data: Vec<u8>) -> Self {
        StreamContent::Data(data)
    }
}

/// A stream node: its dictionary lives in the arena as its own node so it
/// can be edited like any other dictionary.
#[derive(Debug, Clone)]
pub struct Stream {
    dictionary: ObjectHandle,
    content: StreamContent,
    compress: bool,
}

impl Stream {
    pub(crate) fn new(dictionary: ObjectHandle, content: StreamContent) -> Self {
        Self {
            dictionary,
            content,
            compress: true,
        }
    }

    pub fn dictionary(&self) -> ObjectHandle {
        self.dictionary
    }

    pub fn content(&self) -> &StreamContent {
        &self.content
    }

    pub(crate) fn set_content(&mut self, content: StreamContent) {
        self.content = content;
    }

    /// Whether the writer may apply its default filter to this stream.
    pub fn compress(&self) -> bool {
        self.compress
    }

    pub(crate) fn set_compress(&mut self, compress: bool) {
        self.compress = compress;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::objects::ObjectId;
    use crate::provider::StreamSink;

    struct Fixed;

    impl StreamDataProvider for Fixed {
        fn provide_stream_data(&self, _id: ObjectId, sink: &mut StreamSink) -> Result<()> {
            sink.finish()
        }

        fn declared_length(&self) -> Option<u64> {
            Some(30_000)
        }
    }

    #[test]
    fn test_length_hint() {
        assert_eq!(StreamContent::Data(vec![1, 2, 3]).length_hint(), Some(3));
        assert_eq!(StreamContent::provider(Fixed).length_hint(), Some(30_000));
    }

    #[test]
    fn test_stream_defaults_to_compressible() {
        let mut stream = Stream::new(ObjectHandle::new(0, 0), vec![].into());
        assert!(stream.compress());
        stream.set_compress(false);
        assert!(!stream.compress());
    }

    #[test]
    fn test_debug_does_not_dump_data() {
        let content = StreamContent::Data(vec![0; 4096]);
        assert_eq!(format!("{content:?}"), "Data(4096)");
    }
}
