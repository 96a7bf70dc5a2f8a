use crate::compression::{self, FLATE_DECODE};
use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{Node, Object, ObjectId, ObjectRegistry, Stream, StreamContent};
use crate::provider::collect_stream_data;
use crate::writer::numbering::ObjectPlan;
use crate::writer::syntax::{encode_hex, encode_name, encode_string, format_real};
use crate::writer::WriterConfig;
use chrono::Utc;
use std::io::Write;

/// File identifier written in static mode.
const STATIC_ID: [u8; 16] = [
    0x31, 0x41, 0x59, 0x26, 0x53, 0x58, 0x97, 0x93, 0x23, 0x84, 0x62, 0x64, 0x33, 0x83, 0x27, 0x95,
];

/// Serializes a finished [`Document`] into a byte sink.
///
/// A writer is single-shot: it consumes the document it writes, and any
/// later `write_document` call fails without touching the sink. On error the
/// sink holds whatever was emitted before the fault and no trailer.
pub struct PdfWriter<W: Write> {
    writer: W,
    config: WriterConfig,
    xref_positions: Vec<(u32, u64)>,
    current_position: u64,
    used: bool,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self::with_config(writer, WriterConfig::default())
    }

    pub fn with_config(writer: W, config: WriterConfig) -> Self {
        Self {
            writer,
            config,
            xref_positions: Vec::new(),
            current_position: 0,
            used: false,
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Bytes emitted so far.
    pub fn position(&self) -> u64 {
        self.current_position
    }

    pub fn write_document(&mut self, mut document: Document) -> Result<()> {
        // Offsets are absolute within the sink, so a second file cannot follow.
        if self.used {
            return Err(PdfError::InvalidStructure(
                "PdfWriter has already written a document".to_string(),
            ));
        }
        self.used = true;

        let refs = document.finalize()?;
        let registry = &document.objects;

        let mut roots = vec![refs.root];
        roots.extend(refs.info);
        let plan = ObjectPlan::build(registry, &roots, self.config.compact_object_numbers)?;

        tracing::debug!(
            objects = plan.order().len(),
            registered = registry.len(),
            pages = document.page_count(),
            "writing document"
        );

        let version = self
            .config
            .pdf_version
            .clone()
            .unwrap_or_else(|| document.version().to_string());
        self.write_header(&version)?;

        let mut info_bytes = Vec::new();
        for &id in plan.order() {
            let number = plan.number_of(id)?;
            let body = self.serialize_indirect(registry, &plan, id)?;
            if Some(id) == refs.info {
                info_bytes.clone_from(&body);
            }
            self.write_object(number, &body)?;
        }

        let xref_position = self.current_position;
        self.write_xref(plan.size())?;

        let file_id = if self.config.static_id {
            STATIC_ID.to_vec()
        } else {
            self.generate_id(&info_bytes)
        };

        let root = plan.number_of(refs.root)?;
        let info = refs.info.map(|id| plan.number_of(id)).transpose()?;
        self.write_trailer(plan.size(), root, info, &file_id, xref_position)?;
        self.writer.flush()?;

        tracing::info!(
            bytes = self.current_position,
            objects = plan.order().len(),
            "wrote PDF"
        );
        Ok(())
    }

    fn write_header(&mut self, version: &str) -> Result<()> {
        self.write_bytes(format!("%PDF-{version}\n").as_bytes())?;
        // Binary comment to ensure file is treated as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
        Ok(())
    }

    fn write_object(&mut self, number: ObjectId, body: &[u8]) -> Result<()> {
        self.xref_positions
            .push((number.number(), self.current_position));
        tracing::trace!(object = %number, offset = self.current_position, "emitting object");

        let header = format!("{} {} obj\n", number.number(), number.generation());
        self.write_bytes(header.as_bytes())?;
        self.write_bytes(body)?;
        self.write_bytes(b"\nendobj\n")?;
        Ok(())
    }

    /// Body of one indirect object: containers are written out in full here,
    /// wherever else they are only referenced.
    fn serialize_indirect(
        &self,
        registry: &ObjectRegistry,
        plan: &ObjectPlan,
        id: ObjectId,
    ) -> Result<Vec<u8>> {
        let object = registry
            .get(id)
            .ok_or(PdfError::DanglingReference(id.number(), id.generation()))?;

        let mut out = Vec::new();
        match object.handle() {
            Some(handle) => match registry.node(handle)? {
                Node::Stream(stream) => self.serialize_stream(registry, plan, id, stream, &mut out)?,
                _ => serialize_container(registry, plan, object, &mut out)?,
            },
            None => serialize_value(registry, plan, object, &mut out)?,
        }
        Ok(out)
    }

    fn serialize_stream(
        &self,
        registry: &ObjectRegistry,
        plan: &ObjectPlan,
        id: ObjectId,
        stream: &Stream,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let dict_object = Object::Dictionary(stream.dictionary());
        let dict = registry.dictionary(&dict_object)?;

        let raw = match stream.content() {
            StreamContent::Data(data) => data.clone(),
            StreamContent::Provider(provider) => collect_stream_data(provider.as_ref(), id)?,
        };

        let compress = self.config.compress_streams
            && stream.compress()
            && !dict.contains_key("Filter")
            && compression::is_available();
        let data = if compress {
            compression::compress(&raw)?
        } else {
            raw
        };
        tracing::trace!(
            object = %id,
            hint = ?stream.content().length_hint(),
            encoded = data.len(),
            compressed = compress,
            "materialized stream"
        );

        let length = Object::Integer(data.len() as i64);
        let filter = Object::name(FLATE_DECODE);
        let mut entries: Vec<(&str, &Object)> = Vec::with_capacity(dict.len() + 2);
        let mut has_length = false;
        for (key, value) in dict.iter() {
            if key == "Length" {
                entries.push((key.as_str(), &length));
                has_length = true;
            } else {
                entries.push((key.as_str(), value));
            }
        }
        if !has_length {
            entries.push(("Length", &length));
        }
        if compress {
            entries.push(("Filter", &filter));
        }

        write_dictionary(registry, plan, entries, out)?;
        out.extend_from_slice(b"\nstream\n");
        out.extend_from_slice(&data);
        out.extend_from_slice(b"\nendstream");
        Ok(())
    }

    fn write_xref(&mut self, size: u32) -> Result<()> {
        self.write_bytes(b"xref\n")?;
        self.write_bytes(format!("0 {size}\n").as_bytes())?;

        // Write free object entry
        self.write_bytes(b"0000000000 65535 f \n")?;

        let mut entries = self.xref_positions.clone();
        entries.sort_unstable_by_key(|(number, _)| *number);
        let mut entries = entries.into_iter().peekable();

        for number in 1..size {
            match entries.next_if(|(n, _)| *n == number) {
                Some((_, position)) => {
                    self.write_bytes(format!("{position:010} 00000 n \n").as_bytes())?;
                }
                // Free entry for gap
                None => self.write_bytes(b"0000000000 00000 f \n")?,
            }
        }
        Ok(())
    }

    fn write_trailer(
        &mut self,
        size: u32,
        root: ObjectId,
        info: Option<ObjectId>,
        file_id: &[u8],
        xref_position: u64,
    ) -> Result<()> {
        let mut trailer = format!("trailer\n<<\n/Size {size}\n/Root {root}\n");
        if let Some(info) = info {
            trailer.push_str(&format!("/Info {info}\n"));
        }
        self.write_bytes(trailer.as_bytes())?;

        let id = encode_hex(file_id);
        self.write_bytes(b"/ID [")?;
        self.write_bytes(&id)?;
        self.write_bytes(b" ")?;
        self.write_bytes(&id)?;
        self.write_bytes(b"]\n>>\n")?;

        self.write_bytes(format!("startxref\n{xref_position}\n%%EOF\n").as_bytes())?;
        Ok(())
    }

    /// Digest of the current time, the Info dictionary and the object layout.
    fn generate_id(&self, info: &[u8]) -> Vec<u8> {
        let mut seed = Utc::now().to_rfc3339().into_bytes();
        seed.extend_from_slice(info);
        for (number, position) in &self.xref_positions {
            seed.extend_from_slice(format!(" {number}@{position}").as_bytes());
        }
        seed.extend_from_slice(self.current_position.to_string().as_bytes());
        md5::compute(&seed).0.to_vec()
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

/// Writes `object` where it appears as a value: registered containers and
/// references become `n g R`, everything else is written inline.
fn serialize_value(
    registry: &ObjectRegistry,
    plan: &ObjectPlan,
    object: &Object,
    out: &mut Vec<u8>,
) -> Result<()> {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(f) => out.extend_from_slice(format_real(*f)?.as_bytes()),
        Object::String(s) => out.extend_from_slice(&encode_string(s)),
        Object::Name(n) => out.extend_from_slice(&encode_name(n)),
        Object::Reference(id) => write_reference(plan, *id, out)?,
        Object::Array(handle) | Object::Dictionary(handle) | Object::Stream(handle) => {
            match registry.id_of(*handle) {
                Some(id) => write_reference(plan, id, out)?,
                None if matches!(object, Object::Stream(_)) => {
                    return Err(PdfError::InvalidStructure(
                        "stream is not an indirect object".to_string(),
                    ))
                }
                None => serialize_container(registry, plan, object, out)?,
            }
        }
    }
    Ok(())
}

/// Writes the body of an array or dictionary node.
fn serialize_container(
    registry: &ObjectRegistry,
    plan: &ObjectPlan,
    object: &Object,
    out: &mut Vec<u8>,
) -> Result<()> {
    match object {
        Object::Array(_) => {
            let array = registry.array(object)?;
            out.push(b'[');
            for (i, item) in array.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                serialize_value(registry, plan, item, out)?;
            }
            out.push(b']');
            Ok(())
        }
        Object::Dictionary(_) => {
            let dict = registry.dictionary(object)?;
            write_dictionary(registry, plan, dict.iter().map(|(k, v)| (k.as_str(), v)), out)
        }
        other => Err(PdfError::TypeMismatch {
            expected: "array or dictionary",
            found: other.type_name(),
        }),
    }
}

fn write_dictionary<'a>(
    registry: &ObjectRegistry,
    plan: &ObjectPlan,
    entries: impl IntoIterator<Item = (&'a str, &'a Object)>,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut entries = entries.into_iter().peekable();
    if entries.peek().is_none() {
        out.extend_from_slice(b"<< >>");
        return Ok(());
    }

    out.extend_from_slice(b"<<");
    for (key, value) in entries {
        out.push(b'\n');
        out.extend_from_slice(&encode_name(key));
        out.push(b' ');
        serialize_value(registry, plan, value, out)?;
    }
    out.extend_from_slice(b"\n>>");
    Ok(())
}

fn write_reference(plan: &ObjectPlan, id: ObjectId, out: &mut Vec<u8>) -> Result<()> {
    let number = plan.number_of(id)?;
    out.extend_from_slice(number.to_string().as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StreamSink;
    use std::io::{self, ErrorKind};

    fn write(doc: Document, config: WriterConfig) -> Result<String> {
        let mut buffer = Vec::new();
        PdfWriter::with_config(&mut buffer, config).write_document(doc)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn static_uncompressed() -> WriterConfig {
        WriterConfig::default()
            .with_static_id(true)
            .with_compression(false)
    }

    #[test]
    fn test_pdf_writer_new_with_writer() {
        let buffer = Vec::new();
        let writer = PdfWriter::new_with_writer(buffer);
        assert_eq!(writer.position(), 0);
        assert_eq!(writer.config(), &WriterConfig::default());
    }

    #[test]
    fn test_write_empty_document() {
        let content = write(Document::new(), static_uncompressed()).unwrap();

        assert!(content.starts_with("%PDF-1.3\n"));
        assert!(content.contains("1 0 obj\n<<\n/Type /Catalog\n/Pages 2 0 R\n>>\nendobj\n"));
        assert!(content.contains("/Kids []\n/Count 0"));
        assert!(content.contains("xref\n0 3\n0000000000 65535 f \n"));
        assert!(content.contains("/Size 3"));
        assert!(content.contains("/Root 1 0 R"));
        assert!(!content.contains("/Info"));
        assert!(content.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_version_override() {
        let config = static_uncompressed().with_version("1.7");
        let content = write(Document::new(), config).unwrap();
        assert!(content.starts_with("%PDF-1.7\n"));
    }

    #[test]
    fn test_static_id() {
        let content = write(Document::new(), static_uncompressed()).unwrap();
        assert!(content.contains(
            "/ID [<31415926535897932384626433832795> <31415926535897932384626433832795>]"
        ));
    }

    #[test]
    fn test_write_info() {
        let mut doc = Document::new();
        doc.set_title("Test (Title)");
        let content = write(doc, static_uncompressed()).unwrap();

        assert!(content.contains("/Title (Test \\(Title\\))"));
        assert!(content.contains("/Info 3 0 R"));
    }

    #[test]
    fn test_provider_length_is_bytes_written() {
        let mut doc = Document::new();
        let stream = doc
            .new_stream_with_provider(|_id: ObjectId, sink: &mut StreamSink| {
                sink.write(b"A")?;
                sink.write(b"AA")?;
                sink.finish()
            })
            .unwrap();
        let catalog = doc.catalog().clone();
        doc.replace_key(&catalog, "Data", &stream).unwrap();

        let content = write(doc, static_uncompressed()).unwrap();
        assert!(content.contains("3 0 obj\n<<\n/Length 3\n>>\nstream\nAAA\nendstream\nendobj\n"));
    }

    #[test]
    fn test_existing_length_replaced_in_place() {
        let mut doc = Document::new();
        let stream = doc.new_stream(b"abc".to_vec()).unwrap();
        let dict = doc.stream_dict(&stream).unwrap();
        doc.replace_key(&dict, "Length", 1000).unwrap();
        doc.replace_key(&dict, "Type", Object::name("Test")).unwrap();

        let content = write(doc, static_uncompressed()).unwrap();
        assert!(content.contains("<<\n/Length 3\n/Type /Test\n>>\nstream\nabc\nendstream"));
        assert!(!content.contains("1000"));
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_stream_compression() {
        let mut doc = Document::new();
        doc.new_stream(vec![b'x'; 1000]).unwrap();
        let plain = doc.new_stream(vec![b'y'; 10]).unwrap();
        doc.set_stream_compression(&plain, false).unwrap();

        let content = write(doc, WriterConfig::default().with_static_id(true)).unwrap();
        assert!(content.contains("/Filter /FlateDecode"));
        assert!(content.contains("4 0 obj\n<<\n/Length 10\n>>\nstream\nyyyyyyyyyy\nendstream"));
        assert!(!content.contains(&"x".repeat(1000)));
    }

    #[test]
    fn test_declared_filter_is_not_compressed_again() {
        let mut doc = Document::new();
        let stream = doc.new_stream(b"raw".to_vec()).unwrap();
        let dict = doc.stream_dict(&stream).unwrap();
        doc.replace_key(&dict, "Filter", Object::name("ASCIIHexDecode"))
            .unwrap();

        let content = write(doc, WriterConfig::default().with_static_id(true)).unwrap();
        assert!(content.contains("/Filter /ASCIIHexDecode\n/Length 3\n>>\nstream\nraw\n"));
        assert!(!content.contains("FlateDecode"));
    }

    #[test]
    fn test_shared_indirect_written_once() {
        let mut doc = Document::new();
        let shared = doc.new_dictionary();
        doc.replace_key(&shared, "Shared", true).unwrap();
        let id = doc.make_indirect(&shared).unwrap();

        let array = doc.new_array_from([shared.clone(), shared.clone()]).unwrap();
        let catalog = doc.catalog().clone();
        doc.replace_key(&catalog, "Both", array).unwrap();

        let content = write(doc, static_uncompressed()).unwrap();
        assert_eq!(id, ObjectId::new(3, 0));
        assert!(content.contains("/Both [3 0 R 3 0 R]"));
        assert_eq!(content.matches("/Shared true").count(), 1);
    }

    #[test]
    fn test_direct_shared_written_inline() {
        let mut doc = Document::new();
        let shared = doc.new_array_from([Object::Integer(7)]).unwrap();
        let catalog = doc.catalog().clone();
        doc.replace_key(&catalog, "A", &shared).unwrap();
        doc.replace_key(&catalog, "B", &shared).unwrap();

        let content = write(doc, static_uncompressed()).unwrap();
        assert!(content.contains("/A [7]\n/B [7]"));
    }

    #[test]
    fn test_write_scalars() {
        let mut doc = Document::new();
        let catalog = doc.catalog().clone();
        doc.replace_key(&catalog, "Null", Object::Null).unwrap();
        doc.replace_key(&catalog, "Real", 0.5).unwrap();
        doc.replace_key(&catalog, "Neg", -42).unwrap();
        doc.replace_key(&catalog, "Bin", Object::string(vec![0u8, 1, 2]))
            .unwrap();
        doc.replace_key(&catalog, "Odd Name", Object::name("a/b")).unwrap();
        let empty = doc.new_dictionary();
        doc.replace_key(&catalog, "Empty", empty).unwrap();

        let content = write(doc, static_uncompressed()).unwrap();
        assert!(content.contains("/Null null"));
        assert!(content.contains("/Real 0.5"));
        assert!(content.contains("/Neg -42"));
        assert!(content.contains("/Bin <000102>"));
        assert!(content.contains("/Odd#20Name /a#2Fb"));
        assert!(content.contains("/Empty << >>"));
    }

    #[test]
    fn test_non_finite_real_rejected() {
        let mut doc = Document::new();
        let catalog = doc.catalog().clone();
        doc.replace_key(&catalog, "Bad", f64::NAN).unwrap();

        let result = write(doc, static_uncompressed());
        assert!(matches!(result, Err(PdfError::InvalidStructure(_))));
    }

    #[test]
    fn test_dangling_reference_fails_before_output() {
        let mut doc = Document::new();
        let catalog = doc.catalog().clone();
        doc.replace_key(&catalog, "Missing", ObjectId::new(999, 0)).unwrap();

        let mut buffer = Vec::new();
        let result = PdfWriter::with_config(&mut buffer, static_uncompressed()).write_document(doc);
        assert!(matches!(result, Err(PdfError::DanglingReference(999, 0))));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_unfinished_provider() {
        let mut doc = Document::new();
        doc.new_stream_with_provider(|_id: ObjectId, sink: &mut StreamSink| sink.write(b"partial"))
            .unwrap();

        let result = write(doc, static_uncompressed());
        assert!(matches!(result, Err(PdfError::StreamIncomplete(3, 0))));
    }

    #[test]
    fn test_compact_numbering() {
        let mut doc = Document::new();
        let orphan = doc.new_dictionary();
        doc.replace_key(&orphan, "Orphan", true).unwrap();
        doc.make_indirect(&orphan).unwrap();
        let kept = doc.new_dictionary();
        doc.replace_key(&kept, "Kept", true).unwrap();
        doc.make_indirect(&kept).unwrap();
        let catalog = doc.catalog().clone();
        doc.replace_key(&catalog, "Kept", &kept).unwrap();

        let config = static_uncompressed().with_compact_numbering(true);
        let content = write(doc, config).unwrap();
        assert!(!content.contains("/Orphan"));
        assert!(content.contains("/Kept 3 0 R"));
        assert!(content.contains("3 0 obj\n<<\n/Kept true\n>>"));
        assert!(content.contains("/Size 4"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut doc = Document::new();
        doc.set_title("Offsets");
        let mut buffer = Vec::new();
        PdfWriter::with_config(&mut buffer, static_uncompressed())
            .write_document(doc)
            .unwrap();

        let xref = buffer
            .windows(5)
            .rposition(|w| w == b"xref\n")
            .unwrap();
        let tail = std::str::from_utf8(&buffer[xref..]).unwrap();
        let entries: Vec<&str> = tail.lines().skip(3).take(3).collect();
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.len(), 19);
            let offset: usize = entry[..10].parse().unwrap();
            let expected = format!("{} 0 obj", i + 1);
            assert!(buffer[offset..].starts_with(expected.as_bytes()));
        }

        let startxref: usize = tail.lines().rev().nth(1).unwrap().parse().unwrap();
        assert_eq!(startxref, xref);
    }

    #[test]
    fn test_random_id_changes_only_id() {
        let build = || {
            let mut doc = Document::new();
            doc.set_title("Same");
            doc
        };
        let first = write(build(), WriterConfig::default()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = write(build(), WriterConfig::default()).unwrap();

        let strip = |s: &str| s.lines().filter(|l| !l.starts_with("/ID")).collect::<Vec<_>>().join("\n");
        assert_ne!(first, second);
        assert_eq!(strip(&first), strip(&second));
    }

    // Mock writer that simulates IO errors
    struct FailingWriter {
        fail_after: usize,
        written: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written >= self.fail_after {
                return Err(io::Error::new(ErrorKind::PermissionDenied, "Simulated write error"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_during_body() {
        let failing = FailingWriter {
            fail_after: 20,
            written: 0,
        };
        let mut writer = PdfWriter::new_with_writer(failing);
        let result = writer.write_document(Document::new());
        assert!(matches!(result, Err(PdfError::Io(_))));
    }

    #[test]
    fn test_second_write_is_rejected() {
        let mut buffer = Vec::new();
        let mut writer = PdfWriter::with_config(&mut buffer, static_uncompressed());
        writer.write_document(Document::new()).unwrap();
        let written = writer.position();

        let result = writer.write_document(Document::new());
        assert!(matches!(result, Err(PdfError::InvalidStructure(_))));
        assert_eq!(writer.position(), written);
        drop(writer);

        assert_eq!(buffer.len() as u64, written);
        assert_eq!(buffer.windows(5).filter(|w| *w == b"%%EOF").count(), 1);
    }

    #[test]
    fn test_failed_write_is_not_retried() {
        let failing = FailingWriter {
            fail_after: 20,
            written: 0,
        };
        let mut writer = PdfWriter::new_with_writer(failing);
        assert!(writer.write_document(Document::new()).is_err());

        let result = writer.write_document(Document::new());
        assert!(matches!(result, Err(PdfError::InvalidStructure(_))));
    }
}
