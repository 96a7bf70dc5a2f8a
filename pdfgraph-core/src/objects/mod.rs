mod array;
mod dictionary;
mod primitive;
mod registry;
mod stream;

pub use array::Array;
pub use dictionary::Dictionary;
pub use primitive::{Object, ObjectHandle, ObjectId};
pub use registry::{IndirectEntry, Node, ObjectRegistry};
pub use stream::{Stream, StreamContent};
