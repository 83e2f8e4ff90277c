//! The member cloning engine.
//!
//! Cloning duplicates a type-definition subgraph — nested types, fields, methods, and
//! method bodies — from a source [`crate::metadata::module::Module`] into a target one,
//! rewriting every cross-reference on the way. The moving parts:
//!
//! - [`ReferenceImporter`] - the baseline: turns a member of the source module into a
//!   minimal reference record valid in the target module
//! - [`CloningReferenceImporter`] - the baseline with a [`CloneMap`] consulted first, so
//!   references into the cloned subtree resolve to the clones instead of back to the
//!   source
//! - [`MemberCloner`] - orchestrates one full subtree clone via a three-phase protocol
//! - [`BodyCloner`] - duplicates one method body, re-targeting all intra-body references
//!
//! # Examples
//!
//! ```rust
//! use cilgraft::cloning::MemberCloner;
//! use cilgraft::metadata::{
//!     module::Module,
//!     typedef::{TypeAttributes, TypeDefinition},
//! };
//!
//! let mut source = Module::new("source.dll");
//! let widget = source.define_type(TypeDefinition::new("App", "Widget", TypeAttributes::PUBLIC));
//!
//! let mut target = Module::new("target.dll");
//! let clone = MemberCloner::new(&source, &mut target).clone_type(widget)?;
//!
//! assert_eq!(target.type_def(clone)?.full_name(), "App.Widget");
//! # Ok::<(), cilgraft::Error>(())
//! ```

mod body;
mod importer;
mod member;

use std::collections::HashMap;

use crate::metadata::module::{FieldId, MethodId, TypeDefId};

pub use body::BodyCloner;
pub use importer::{CloningReferenceImporter, ReferenceImporter};
pub use member::MemberCloner;

/// The identity map from original member handles to their clones.
///
/// Scoped to exactly one clone operation: [`MemberCloner::clone_type`] populates it stub
/// by stub and discards it when the operation ends. Keys are source-module handles,
/// values are target-module handles. Every member reachable from the clone root appears
/// here at most once, and is registered *before* any reference to it is resolved
/// elsewhere in the same operation.
#[derive(Debug, Default)]
pub struct CloneMap {
    types: HashMap<TypeDefId, TypeDefId>,
    fields: HashMap<FieldId, FieldId>,
    methods: HashMap<MethodId, MethodId>,
}

impl CloneMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        CloneMap::default()
    }

    /// Register a type clone. Later lookups of `original` resolve to `clone`.
    pub fn insert_type(&mut self, original: TypeDefId, clone: TypeDefId) {
        self.types.insert(original, clone);
    }

    /// Register a field clone.
    pub fn insert_field(&mut self, original: FieldId, clone: FieldId) {
        self.fields.insert(original, clone);
    }

    /// Register a method clone.
    pub fn insert_method(&mut self, original: MethodId, clone: MethodId) {
        self.methods.insert(original, clone);
    }

    /// The clone registered for a source type, if any.
    #[must_use]
    pub fn type_clone(&self, original: TypeDefId) -> Option<TypeDefId> {
        self.types.get(&original).copied()
    }

    /// The clone registered for a source field, if any.
    #[must_use]
    pub fn field_clone(&self, original: FieldId) -> Option<FieldId> {
        self.fields.get(&original).copied()
    }

    /// The clone registered for a source method, if any.
    #[must_use]
    pub fn method_clone(&self, original: MethodId) -> Option<MethodId> {
        self.methods.get(&original).copied()
    }

    /// Total number of registered clones across all member kinds.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.types.len() + self.fields.len() + self.methods.len()
    }
}
