use std::fmt;

/// Identity of an indirect object: object number plus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    number: u32,
    generation: u16,
}

impl ObjectId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// Handle to a container node stored in a document's arena.
///
/// Handles are cheap to copy. Every copy addresses the same node, so a
/// dictionary embedded in two parents is one shared dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    document: u32,
    index: u32,
}

impl ObjectHandle {
    pub(crate) fn new(document: u32, index: u32) -> Self {
        Self { document, index }
    }

    pub(crate) fn document(&self) -> u32 {
        self.document
    }

    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }
}

/// A node of the document graph.
///
/// Scalars are plain values. Arrays, dictionaries and streams are handles
/// into the owning [`Document`](crate::Document); use the document to read
/// or mutate them.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    Name(String),
    Array(ObjectHandle),
    Dictionary(ObjectHandle),
    Stream(ObjectHandle),
    Reference(ObjectId),
}

impl Object {
    /// Creates a name object. A leading `/` is accepted and dropped.
    pub fn name(name: impl AsRef<str>) -> Self {
        Object::Name(normalize_name(name.as_ref()).to_string())
    }

    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Object::String(bytes.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn is_container(&self) -> bool {
        self.handle().is_some()
    }

    /// Arena handle for arrays, dictionaries and streams.
    pub fn handle(&self) -> Option<ObjectHandle> {
        match self {
            Object::Array(h) | Object::Dictionary(h) | Object::Stream(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(f) => Some(*f),
            Object::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Short lowercase kind name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::Real(_) => "real",
            Object::String(_) => "string",
            Object::Name(_) => "name",
            Object::Array(_) => "array",
            Object::Dictionary(_) => "dictionary",
            Object::Stream(_) => "stream",
            Object::Reference(_) => "reference",
        }
    }
}

pub(crate) fn normalize_name(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<i32> for Object {
    fn from(i: i32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(i)
    }
}

impl From<u32> for Object {
    fn from(i: u32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<f32> for Object {
    fn from(f: f32) -> Self {
        Object::Real(f as f64)
    }
}

impl From<f64> for Object {
    fn from(f: f64) -> Self {
        Object::Real(f)
    }
}

impl From<String> for Object {
    fn from(s: String) -> Self {
        Object::String(s.into_bytes())
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Object::String(s.as_bytes().to_vec())
    }
}

impl From<ObjectId> for Object {
    fn from(id: ObjectId) -> Self {
        Object::Reference(id)
    }
}

impl From<&Object> for Object {
    fn from(object: &Object) -> Self {
        object.clone()
    }
}
