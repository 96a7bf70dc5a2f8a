use crate::objects::Object;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
    elements: Vec<Object>,
}

impl Array {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn push(&mut self, object: impl Into<Object>) {
        self.elements.push(object.into());
    }

    pub fn insert(&mut self, index: usize, object: impl Into<Object>) {
        self.elements.insert(index, object.into());
    }

    pub fn get(&self, index: usize) -> Option<&Object> {
        self.elements.get(index)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.elements.iter()
    }
}

impl From<Vec<Object>> for Array {
    fn from(elements: Vec<Object>) -> Self {
        Self { elements }
    }
}

impl FromIterator<Object> for Array {
    fn from_iter<T: IntoIterator<Item = Object>>(iter: T) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}
