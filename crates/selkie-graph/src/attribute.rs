//! Sparse id-keyed attribute stores.
//!
//! Attributes decorate an existing graph without touching its storage:
//! analyses allocate as many as they need and drop them independently. The
//! backing is a resizable array with a default fill value; reading an id past
//! the backing yields the default, writing grows the backing.

use crate::{EdgeId, Id, NodeId};

#[derive(Debug, Clone)]
pub struct Attribute<I: Id, T> {
    data: Vec<T>,
    default: T,
    _id: std::marker::PhantomData<I>,
}

pub type NodeAttribute<T> = Attribute<NodeId, T>;
pub type EdgeAttribute<T> = Attribute<EdgeId, T>;

impl<I: Id, T: Clone> Attribute<I, T> {
    pub fn new(len: usize, default: T) -> Self {
        Self {
            data: vec![default.clone(); len],
            default,
            _id: std::marker::PhantomData,
        }
    }

    pub fn get(&self, id: I) -> &T {
        self.data.get(id.index()).unwrap_or(&self.default)
    }

    pub fn get_mut(&mut self, id: I) -> &mut T {
        self.grow_for(id.index());
        &mut self.data[id.index()]
    }

    pub fn set(&mut self, id: I, value: T) {
        self.grow_for(id.index());
        self.data[id.index()] = value;
    }

    /// Number of slots currently backed.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn grow_for(&mut self, index: usize) {
        if index >= self.data.len() {
            self.data.resize(index + 1, self.default.clone());
        }
    }
}

impl<I: Id, T: Clone + Copy> Attribute<I, T> {
    /// Copy accessor, convenient for scalar attributes.
    pub fn value(&self, id: I) -> T {
        *self.get(id)
    }
}
