use crate::error::{PdfError, Result};
use crate::objects::{Array, Dictionary, Object, ObjectId, ObjectRegistry, StreamContent};
use crate::provider::StreamDataProvider;
use crate::writer::{PdfWriter, WriterConfig};
use chrono::{DateTime, Utc};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

/// PDF version written when neither the document nor the writer asks for another.
pub const DEFAULT_PDF_VERSION: &str = "1.3";

/// An in-memory PDF object graph.
///
/// A new document already holds the catalog (object 1) and an empty page
/// tree (object 2). Objects are created through the document, wired
/// together with [`replace_key`](Self::replace_key) and
/// [`append_item`](Self::append_item), and the finished document is handed
/// to the writer once.
///
/// # Example
///
/// ```rust
/// use pdfgraph::{Document, Page, WriterConfig};
///
/// # fn main() -> pdfgraph::Result<()> {
/// let mut doc = Document::new();
/// let contents = doc.new_stream(b"BT ET".to_vec())?;
/// let page = Page::letter().with_contents(contents).build(&mut doc)?;
/// doc.add_page(&page, true)?;
///
/// let bytes = doc.to_bytes(WriterConfig::default().with_static_id(true))?;
/// assert!(bytes.starts_with(b"%PDF-1.3"));
/// # Ok(())
/// # }
/// ```
pub struct Document {
    pub(crate) objects: ObjectRegistry,
    catalog: Object,
    page_tree: Object,
    pages: Vec<ObjectId>,
    pub(crate) metadata: DocumentMetadata,
    version: String,
}

/// Metadata for the document information dictionary.
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document keywords
    pub keywords: Option<String>,
    /// Software that created the original document
    pub creator: Option<String>,
    /// Software that produced the PDF
    pub producer: Option<String>,
    /// Date and time the document was created
    pub creation_date: Option<DateTime<Utc>>,
    /// Date and time the document was last modified
    pub modification_date: Option<DateTime<Utc>>,
}

impl DocumentMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
            && self.creator.is_none()
            && self.producer.is_none()
            && self.creation_date.is_none()
            && self.modification_date.is_none()
    }

    fn to_dictionary(&self) -> Dictionary {
        let mut info = Dictionary::new();
        let text_fields = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                info.set(key, Object::string(value.as_bytes()));
            }
        }
        if let Some(date) = self.creation_date {
            info.set("CreationDate", Object::string(format_pdf_date(date)));
        }
        if let Some(date) = self.modification_date {
            info.set("ModDate", Object::string(format_pdf_date(date)));
        }
        info
    }
}

/// Objects the trailer points at, resolved when the document is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailerRefs {
    pub root: ObjectId,
    pub info: Option<ObjectId>,
}

impl Document {
    /// Creates an empty document with a catalog and an empty page tree.
    pub fn new() -> Self {
        let mut objects = ObjectRegistry::new();

        let mut tree = Dictionary::new();
        tree.set("Type", Object::name("Pages"));
        tree.set("Kids", Object::Null);
        tree.set("Count", 0);
        let page_tree = objects.new_dictionary(tree);

        let mut root = Dictionary::new();
        root.set("Type", Object::name("Catalog"));
        root.set("Pages", page_tree.clone());
        let catalog = objects.new_dictionary(root);

        // Both nodes were just allocated here, so they take numbers 1 and 2.
        objects.push_entry(&catalog);
        objects.push_entry(&page_tree);

        Self {
            objects,
            catalog,
            page_tree,
            pages: Vec::new(),
            metadata: DocumentMetadata::default(),
            version: DEFAULT_PDF_VERSION.to_string(),
        }
    }

    /// Creates an empty document declaring another header version.
    pub fn with_version(version: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.version = version.into();
        doc
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Read access to the indirect-object table.
    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    /// The document catalog (`/Type /Catalog`).
    pub fn catalog(&self) -> &Object {
        &self.catalog
    }

    /// Page references in page order.
    pub fn pages(&self) -> &[ObjectId] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut DocumentMetadata {
        &mut self.metadata
    }

    /// Sets the document title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.metadata.title = Some(title.into());
    }

    /// Sets the document author.
    pub fn set_author(&mut self, author: impl Into<String>) {
        self.metadata.author = Some(author.into());
    }

    /// Sets the document producer (software that produced the PDF).
    pub fn set_producer(&mut self, producer: impl Into<String>) {
        self.metadata.producer = Some(producer.into());
    }

    /// Sets the document creation date.
    pub fn set_creation_date(&mut self, date: DateTime<Utc>) {
        self.metadata.creation_date = Some(date);
    }

    /// Sets the document modification date.
    pub fn set_modification_date(&mut self, date: DateTime<Utc>) {
        self.metadata.modification_date = Some(date);
    }

    // Object construction

    /// Creates an empty direct dictionary.
    pub fn new_dictionary(&mut self) -> Object {
        self.objects.new_dictionary(Dictionary::new())
    }

    /// Creates a direct dictionary from prepared entries.
    ///
    /// Handles among the values must belong to this document.
    pub fn new_dictionary_from(&mut self, dict: Dictionary) -> Result<Object> {
        for value in dict.values() {
            self.objects.check_value(value)?;
        }
        Ok(self.objects.new_dictionary(dict))
    }

    /// Creates an empty direct array.
    pub fn new_array(&mut self) -> Object {
        self.objects.new_array(Array::new())
    }

    /// Creates a direct array from prepared items.
    pub fn new_array_from(&mut self, items: impl IntoIterator<Item = Object>) -> Result<Object> {
        let array: Array = items.into_iter().collect();
        for value in array.iter() {
            self.objects.check_value(value)?;
        }
        Ok(self.objects.new_array(array))
    }

    /// Creates a stream holding `data`. Streams are always indirect objects.
    pub fn new_stream(&mut self, data: Vec<u8>) -> Result<Object> {
        self.objects.new_stream(StreamContent::Data(data))
    }

    /// Creates a stream whose bytes are produced by `provider` at write time.
    pub fn new_stream_with_provider(
        &mut self,
        provider: impl StreamDataProvider + 'static,
    ) -> Result<Object> {
        self.objects.new_stream(StreamContent::provider(provider))
    }

    /// Creates a stream sharing an existing provider instance.
    pub fn new_stream_with_shared_provider(
        &mut self,
        provider: Rc<dyn StreamDataProvider>,
    ) -> Result<Object> {
        self.objects.new_stream(StreamContent::Provider(provider))
    }

    /// Registers `object` as an indirect object.
    ///
    /// Containers keep their handle: every place the handle is embedded is
    /// written as a reference to the returned identity.
    pub fn make_indirect(&mut self, object: &Object) -> Result<ObjectId> {
        self.objects.register(object)
    }

    /// Identity of a registered container.
    pub fn object_id(&self, object: &Object) -> Option<ObjectId> {
        object.handle().and_then(|h| self.objects.id_of(h))
    }

    /// Follows a reference to its registered object.
    pub fn resolve(&self, id: ObjectId) -> Result<&Object> {
        self.objects
            .get(id)
            .ok_or(PdfError::DanglingReference(id.number(), id.generation()))
    }

    // Container mutation

    /// Sets `key` in a dictionary. Existing keys are overwritten in place.
    pub fn replace_key(
        &mut self,
        dict: &Object,
        key: &str,
        value: impl Into<Object>,
    ) -> Result<()> {
        self.objects.replace_key(dict, key, value.into())
    }

    pub fn remove_key(&mut self, dict: &Object, key: &str) -> Result<Option<Object>> {
        Ok(self.objects.dictionary_mut(dict)?.remove(key))
    }

    pub fn get_key(&self, dict: &Object, key: &str) -> Result<Option<&Object>> {
        Ok(self.objects.dictionary(dict)?.get(key))
    }

    pub fn dictionary(&self, dict: &Object) -> Result<&Dictionary> {
        self.objects.dictionary(dict)
    }

    /// Appends to an array.
    pub fn append_item(&mut self, array: &Object, value: impl Into<Object>) -> Result<()> {
        self.objects.append_item(array, value.into())
    }

    pub fn insert_item(
        &mut self,
        array: &Object,
        index: usize,
        value: impl Into<Object>,
    ) -> Result<()> {
        self.objects.insert_item(array, index, value.into())
    }

    pub fn array_len(&self, array: &Object) -> Result<usize> {
        Ok(self.objects.array(array)?.len())
    }

    pub fn array_item(&self, array: &Object, index: usize) -> Result<Option<&Object>> {
        Ok(self.objects.array(array)?.get(index))
    }

    // Streams

    /// The stream's dictionary, editable with [`replace_key`](Self::replace_key).
    pub fn stream_dict(&self, stream: &Object) -> Result<Object> {
        Ok(Object::Dictionary(self.objects.stream(stream)?.dictionary()))
    }

    /// Swaps the content source of a stream.
    ///
    /// `filter` and `decode_parms` describe content that is already encoded;
    /// `Object::Null` removes the key. The writer never re-encodes a stream
    /// that declares a filter.
    pub fn replace_stream_data(
        &mut self,
        stream: &Object,
        content: StreamContent,
        filter: Object,
        decode_parms: Object,
    ) -> Result<()> {
        let dict = self.stream_dict(stream)?;
        for (key, value) in [("Filter", filter), ("DecodeParms", decode_parms)] {
            if value.is_null() {
                self.remove_key(&dict, key)?;
            } else {
                self.replace_key(&dict, key, value)?;
            }
        }
        self.objects.stream_mut(stream)?.set_content(content);
        Ok(())
    }

    /// Opts a single stream in or out of the writer's default compression.
    pub fn set_stream_compression(&mut self, stream: &Object, compress: bool) -> Result<()> {
        self.objects.stream_mut(stream)?.set_compress(compress);
        Ok(())
    }

    // Pages

    /// Adds a page dictionary to the page list, at the back when `append`
    /// is true and at the front otherwise.
    ///
    /// The page is registered if needed and its `/Parent` is pointed at the
    /// page tree. Adding the same page twice is an error.
    pub fn add_page(&mut self, page: &Object, append: bool) -> Result<ObjectId> {
        self.objects.dictionary(page)?;
        let id = self.objects.register(page)?;
        if self.pages.contains(&id) {
            return Err(PdfError::InvalidStructure(format!(
                "page {id} is already in the page tree"
            )));
        }

        if self.get_key(page, "Type")?.is_none() {
            self.replace_key(page, "Type", Object::name("Page"))?;
        }
        let tree = self.page_tree.clone();
        self.replace_key(page, "Parent", tree)?;

        if append {
            self.pages.push(id);
        } else {
            self.pages.insert(0, id);
        }
        tracing::debug!(page = %id, count = self.pages.len(), append, "added page");
        Ok(id)
    }

    /// Takes a page out of the page list. The page object itself stays
    /// registered.
    pub fn remove_page(&mut self, id: ObjectId) -> Result<()> {
        let position = self
            .pages
            .iter()
            .position(|p| *p == id)
            .ok_or_else(|| PdfError::InvalidStructure(format!("page {id} is not in the page tree")))?;
        self.pages.remove(position);

        let page = self.resolve(id)?.clone();
        self.remove_key(&page, "Parent")?;
        Ok(())
    }

    /// Fills in everything derived from the page list and metadata.
    pub(crate) fn finalize(&mut self) -> Result<TrailerRefs> {
        let kids: Vec<Object> = self.pages.iter().copied().map(Object::Reference).collect();
        let count = kids.len() as i64;
        let kids = self.new_array_from(kids)?;
        let tree = self.page_tree.clone();
        self.replace_key(&tree, "Kids", kids)?;
        self.replace_key(&tree, "Count", count)?;

        let info = if self.metadata.is_empty() {
            None
        } else {
            let info = self.new_dictionary_from(self.metadata.to_dictionary())?;
            Some(self.make_indirect(&info)?)
        };

        let root = self.make_indirect(&self.catalog.clone())?;
        Ok(TrailerRefs { root, info })
    }

    // Output

    /// Writes the document into `writer`.
    ///
    /// On failure the output stops where the fault was found and carries no
    /// cross-reference table or trailer.
    pub fn write_to<W: Write>(self, writer: W, config: WriterConfig) -> Result<()> {
        let mut writer = PdfWriter::with_config(writer, config);
        writer.write_document(self)
    }

    /// Serializes the document into memory.
    pub fn to_bytes(self, config: WriterConfig) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, config)?;
        Ok(buffer)
    }

    /// Saves the document to a file.
    ///
    /// The file is written next to its destination under a temporary name
    /// and renamed only after the whole document was written, so a failed
    /// write leaves nothing at `path`.
    pub fn save(self, path: impl AsRef<Path>, config: WriterConfig) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        self.write_to(BufWriter::new(file.as_file_mut()), config)?;
        file.persist(path).map_err(|e| PdfError::Io(e.error))?;

        tracing::info!(path = %path.display(), "saved PDF");
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a DateTime as a PDF date string (D:YYYYMMDDHHmmSSOHH'mm)
pub(crate) fn format_pdf_date(date: DateTime<Utc>) -> String {
    let formatted = date.format("D:%Y%m%d%H%M%S");

    // For UTC, the offset is always +00'00
    format!("{formatted}+00'00")
}
