//! Decides which indirect objects are written and under which numbers.
//!
//! The walk also checks graph integrity before anything is emitted: every
//! reference must resolve and direct containers must not contain themselves.

use crate::error::{PdfError, Result};
use crate::objects::{Node, Object, ObjectId, ObjectRegistry};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub(crate) struct ObjectPlan {
    order: Vec<ObjectId>,
    numbers: HashMap<ObjectId, ObjectId>,
}

impl ObjectPlan {
    /// Keeps every registered object under its own number, or with `compact`
    /// only those reachable from `roots`, renumbered 1..n in registration
    /// order.
    pub(crate) fn build(registry: &ObjectRegistry, roots: &[ObjectId], compact: bool) -> Result<Self> {
        let mut walker = Walker {
            registry,
            stack: Vec::new(),
            pending: Vec::new(),
        };

        let reachable = if compact {
            let mut seen = HashSet::new();
            walker.pending.extend_from_slice(roots);
            while let Some(id) = walker.pending.pop() {
                if !seen.insert(id) {
                    continue;
                }
                walker.visit_entry(id)?;
            }
            Some(seen)
        } else {
            for entry in registry.iter() {
                walker.visit_entry(entry.id)?;
            }
            // Trailer roots must resolve too.
            for root in roots {
                walker.resolve(*root)?;
            }
            None
        };

        let order: Vec<ObjectId> = registry
            .iter()
            .map(|entry| entry.id)
            .filter(|id| reachable.as_ref().map_or(true, |seen| seen.contains(id)))
            .collect();

        let numbers = order
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let number = if compact { ObjectId::new(i as u32 + 1, 0) } else { *id };
                (*id, number)
            })
            .collect();

        Ok(Self { order, numbers })
    }

    /// Registered identities to emit, in output order.
    pub(crate) fn order(&self) -> &[ObjectId] {
        &self.order
    }

    /// The number `id` is written under.
    pub(crate) fn number_of(&self, id: ObjectId) -> Result<ObjectId> {
        self.numbers
            .get(&id)
            .copied()
            .ok_or(PdfError::DanglingReference(id.number(), id.generation()))
    }

    /// Value of the trailer's `/Size`.
    pub(crate) fn size(&self) -> u32 {
        self.numbers.values().map(|id| id.number()).max().unwrap_or(0) + 1
    }
}

struct Walker<'a> {
    registry: &'a ObjectRegistry,
    /// Direct containers currently being walked, by arena index.
    stack: Vec<usize>,
    /// Indirect objects found but not yet walked.
    pending: Vec<ObjectId>,
}

impl Walker<'_> {
    fn resolve(&self, id: ObjectId) -> Result<&Object> {
        self.registry
            .get(id)
            .ok_or(PdfError::DanglingReference(id.number(), id.generation()))
    }

    fn visit_entry(&mut self, id: ObjectId) -> Result<()> {
        let object = self.resolve(id)?.clone();
        self.visit(&object, true)
    }

    fn visit(&mut self, object: &Object, top_level: bool) -> Result<()> {
        if let Object::Reference(id) = object {
            self.resolve(*id)?;
            self.pending.push(*id);
            return Ok(());
        }

        let Some(handle) = object.handle() else {
            return Ok(());
        };
        if !top_level {
            if let Some(id) = self.registry.id_of(handle) {
                self.pending.push(id);
                return Ok(());
            }
        }

        if self.stack.contains(&handle.index()) {
            return Err(PdfError::InvalidStructure(format!(
                "direct {} contains itself",
                object.type_name()
            )));
        }

        self.stack.push(handle.index());
        let children: Vec<Object> = match self.registry.node(handle)? {
            Node::Array(array) => array.iter().cloned().collect(),
            Node::Dictionary(dict) => dict.values().cloned().collect(),
            Node::Stream(stream) => {
                // The stream dictionary is always written inline.
                let dict = Object::Dictionary(stream.dictionary());
                self.visit(&dict, true)?;
                Vec::new()
            }
        };
        for child in &children {
            self.visit(child, false)?;
        }
        self.stack.pop();
        Ok(())
    }
}
