//! Node arena and indirect-object table of a document.

use crate::error::{PdfError, Result};
use crate::objects::primitive::normalize_name;
use crate::objects::{Array, Dictionary, Object, ObjectHandle, ObjectId, Stream, StreamContent};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_DOCUMENT_ID: AtomicU32 = AtomicU32::new(1);

/// Storage for container nodes.
#[derive(Debug, Clone)]
pub enum Node {
    Array(Array),
    Dictionary(Dictionary),
    Stream(Stream),
}

impl Node {
    fn type_name(&self) -> &'static str {
        match self {
            Node::Array(_) => "array",
            Node::Dictionary(_) => "dictionary",
            Node::Stream(_) => "stream",
        }
    }
}

/// A registered top-level object.
#[derive(Debug, Clone)]
pub struct IndirectEntry {
    pub id: ObjectId,
    pub object: Object,
}

/// Owns every container node of one document and the table of indirect
/// objects. Object numbers start at 1, grow by one per registration and are
/// never reused.
#[derive(Debug)]
pub struct ObjectRegistry {
    document: u32,
    nodes: Vec<Node>,
    entries: Vec<IndirectEntry>,
    by_node: HashMap<usize, ObjectId>,
    // Dictionaries owned by a stream; they are written inside that stream.
    stream_dicts: HashSet<usize>,
}

impl ObjectRegistry {
    pub(crate) fn new() -> Self {
        Self {
            document: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            entries: Vec::new(),
            by_node: HashMap::new(),
            stream_dicts: HashSet::new(),
        }
    }

    pub(crate) fn alloc(&mut self, node: Node) -> ObjectHandle {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        ObjectHandle::new(self.document, index)
    }

    pub(crate) fn new_dictionary(&mut self, dict: Dictionary) -> Object {
        Object::Dictionary(self.alloc(Node::Dictionary(dict)))
    }

    pub(crate) fn new_array(&mut self, array: Array) -> Object {
        Object::Array(self.alloc(Node::Array(array)))
    }

    /// Streams are always indirect, so the new stream is registered here.
    pub(crate) fn new_stream(&mut self, content: StreamContent) -> Result<Object> {
        let dict = self.alloc(Node::Dictionary(Dictionary::new()));
        self.stream_dicts.insert(dict.index());
        let stream = Object::Stream(self.alloc(Node::Stream(Stream::new(dict, content))));
        self.register(&stream)?;
        Ok(stream)
    }

    /// Registers `object` as an indirect object and returns its identity.
    ///
    /// Registering a container twice returns the identity it already has. A
    /// reference is returned unchanged if it resolves, otherwise it is
    /// reported as dangling. A stream's own dictionary cannot be registered.
    pub fn register(&mut self, object: &Object) -> Result<ObjectId> {
        if let Object::Reference(id) = object {
            return match self.get(*id) {
                Some(_) => Ok(*id),
                None => Err(PdfError::DanglingReference(id.number(), id.generation())),
            };
        }

        if let Some(handle) = object.handle() {
            self.check_handle(handle)?;
            if let Some(id) = self.by_node.get(&handle.index()) {
                return Ok(*id);
            }
            if self.stream_dicts.contains(&handle.index()) {
                return Err(PdfError::InvalidStructure(
                    "a stream dictionary cannot be an indirect object".to_string(),
                ));
            }
        }

        Ok(self.push_entry(object))
    }

    /// Appends a table entry under the next free number. Callers have
    /// already checked that `object` is local and not yet registered.
    pub(crate) fn push_entry(&mut self, object: &Object) -> ObjectId {
        let id = ObjectId::new(self.entries.len() as u32 + 1, 0);
        if let Some(handle) = object.handle() {
            self.by_node.insert(handle.index(), id);
        }
        self.entries.push(IndirectEntry {
            id,
            object: object.clone(),
        });
        tracing::trace!(object = %id, kind = object.type_name(), "registered indirect object");
        id
    }

    /// Looks up a registered object.
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        let index = (id.number() as usize).checked_sub(1)?;
        self.entries
            .get(index)
            .filter(|entry| entry.id == id)
            .map(|entry| &entry.object)
    }

    /// Identity of a registered container, if it has one.
    pub fn id_of(&self, handle: ObjectHandle) -> Option<ObjectId> {
        if handle.document() != self.document {
            return None;
        }
        self.by_node.get(&handle.index()).copied()
    }

    /// Registered objects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &IndirectEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn node(&self, handle: ObjectHandle) -> Result<&Node> {
        self.check_handle(handle)?;
        Ok(&self.nodes[handle.index()])
    }

    pub(crate) fn node_mut(&mut self, handle: ObjectHandle) -> Result<&mut Node> {
        self.check_handle(handle)?;
        Ok(&mut self.nodes[handle.index()])
    }

    pub(crate) fn dictionary(&self, object: &Object) -> Result<&Dictionary> {
        let handle = Self::expect_kind(object, "dictionary")?;
        match self.node(handle)? {
            Node::Dictionary(dict) => Ok(dict),
            other => Err(PdfError::TypeMismatch {
                expected: "dictionary",
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn dictionary_mut(&mut self, object: &Object) -> Result<&mut Dictionary> {
        let handle = Self::expect_kind(object, "dictionary")?;
        match self.node_mut(handle)? {
            Node::Dictionary(dict) => Ok(dict),
            other => Err(PdfError::TypeMismatch {
                expected: "dictionary",
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn array(&self, object: &Object) -> Result<&Array> {
        let handle = Self::expect_kind(object, "array")?;
        match self.node(handle)? {
            Node::Array(array) => Ok(array),
            other => Err(PdfError::TypeMismatch {
                expected: "array",
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn array_mut(&mut self, object: &Object) -> Result<&mut Array> {
        let handle = Self::expect_kind(object, "array")?;
        match self.node_mut(handle)? {
            Node::Array(array) => Ok(array),
            other => Err(PdfError::TypeMismatch {
                expected: "array",
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn stream(&self, object: &Object) -> Result<&Stream> {
        let handle = Self::expect_kind(object, "stream")?;
        match self.node(handle)? {
            Node::Stream(stream) => Ok(stream),
            other => Err(PdfError::TypeMismatch {
                expected: "stream",
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn stream_mut(&mut self, object: &Object) -> Result<&mut Stream> {
        let handle = Self::expect_kind(object, "stream")?;
        match self.node_mut(handle)? {
            Node::Stream(stream) => Ok(stream),
            other => Err(PdfError::TypeMismatch {
                expected: "stream",
                found: other.type_name(),
            }),
        }
    }

    pub(crate) fn replace_key(&mut self, dict: &Object, key: &str, value: Object) -> Result<()> {
        self.check_value(&value)?;
        self.dictionary_mut(dict)?
            .set(normalize_name(key), value);
        Ok(())
    }

    pub(crate) fn append_item(&mut self, array: &Object, value: Object) -> Result<()> {
        self.check_value(&value)?;
        self.array_mut(array)?.push(value);
        Ok(())
    }

    pub(crate) fn insert_item(&mut self, array: &Object, index: usize, value: Object) -> Result<()> {
        self.check_value(&value)?;
        let array = self.array_mut(array)?;
        if index > array.len() {
            return Err(PdfError::InvalidStructure(format!(
                "array index {index} out of bounds (len {})",
                array.len()
            )));
        }
        array.insert(index, value);
        Ok(())
    }

    /// Values stored into containers must belong to this document.
    pub(crate) fn check_value(&self, value: &Object) -> Result<()> {
        match value.handle() {
            Some(handle) => self.check_handle(handle),
            None => Ok(()),
        }
    }

    fn check_handle(&self, handle: ObjectHandle) -> Result<()> {
        if handle.document() != self.document || handle.index() >= self.nodes.len() {
            return Err(PdfError::ForeignObject);
        }
        Ok(())
    }

    /// The handle behind `object`, as long as the variant matches `expected`.
    /// The node itself is checked again when it is loaded.
    fn expect_kind(object: &Object, expected: &'static str) -> Result<ObjectHandle> {
        let handle = match (object, expected) {
            (Object::Dictionary(h), "dictionary")
            | (Object::Array(h), "array")
            | (Object::Stream(h), "stream") => *h,
            _ => {
                return Err(PdfError::TypeMismatch {
                    expected,
                    found: object.type_name(),
                })
            }
        };
        Ok(handle)
    }
}
