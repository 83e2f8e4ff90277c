//! Type definitions and their attribute flags.
//!
//! A [`TypeDefinition`] is the root of the member subgraph the cloning engine operates
//! on: it owns ordered handle lists for nested types, fields, and methods. Identity is
//! per-object (the handle), never per-name; two definitions with identical names are
//! distinct entities.

use bitflags::bitflags;

use crate::metadata::module::{FieldId, MethodId, TypeDefId, TypeRefOrDef};

/// Bitmask for visibility extraction from raw type attributes
pub const TYPE_VISIBILITY_MASK: u32 = 0x0007;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Type attribute flags
    pub struct TypeAttributes: u32 {
        /// Class has no public scope
        const NOT_PUBLIC = 0x0000;
        /// Class has public scope
        const PUBLIC = 0x0001;
        /// Class is nested with public visibility
        const NESTED_PUBLIC = 0x0002;
        /// Class is nested with private visibility
        const NESTED_PRIVATE = 0x0003;
        /// Class is nested with family visibility
        const NESTED_FAMILY = 0x0004;
        /// Class is nested with assembly visibility
        const NESTED_ASSEMBLY = 0x0005;
        /// Class layout is sequential
        const SEQUENTIAL_LAYOUT = 0x0008;
        /// Class layout is explicit
        const EXPLICIT_LAYOUT = 0x0010;
        /// Type is an interface
        const INTERFACE = 0x0020;
        /// Class is abstract
        const ABSTRACT = 0x0080;
        /// Class cannot be extended
        const SEALED = 0x0100;
        /// Class name is special
        const SPECIAL_NAME = 0x0400;
        /// Class is serializable
        const SERIALIZABLE = 0x2000;
        /// Initialize the class before first static field access
        const BEFORE_FIELD_INIT = 0x0010_0000;
    }
}

impl TypeAttributes {
    /// Extract the visibility bits from raw type attributes
    #[must_use]
    pub fn visibility(flags: u32) -> Self {
        Self::from_bits_truncate(flags & TYPE_VISIBILITY_MASK)
    }
}

/// Describes one type hosted by a [`crate::metadata::module::Module`].
///
/// Nested types, fields, and methods are held as ordered handle lists; declaration order
/// is significant and preserved by every transformation in this library.
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    /// Namespace of the type. Empty for the global namespace and for nested types.
    pub namespace: String,
    /// Simple name of the type.
    pub name: String,
    /// Attribute flags.
    pub flags: TypeAttributes,
    /// The type this one extends, if any.
    pub base_type: Option<TypeRefOrDef>,

    pub(crate) nested_types: Vec<TypeDefId>,
    pub(crate) fields: Vec<FieldId>,
    pub(crate) methods: Vec<MethodId>,
    pub(crate) enclosing_type: Option<TypeDefId>,
}

impl TypeDefinition {
    /// Create a new, empty type definition.
    #[must_use]
    pub fn new(namespace: &str, name: &str, flags: TypeAttributes) -> Self {
        TypeDefinition {
            namespace: namespace.to_string(),
            name: name.to_string(),
            flags,
            base_type: None,
            nested_types: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            enclosing_type: None,
        }
    }

    /// Handles of the types nested inside this one, in declaration order.
    #[must_use]
    pub fn nested_types(&self) -> &[TypeDefId] {
        &self.nested_types
    }

    /// Handles of the fields of this type, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    /// Handles of the methods of this type, in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    /// The type this one is nested inside, if any.
    #[must_use]
    pub fn enclosing_type(&self) -> Option<TypeDefId> {
        self.enclosing_type
    }

    /// The namespace-qualified name of this type.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name() {
        let ty = TypeDefinition::new("System.Text", "StringBuilder", TypeAttributes::PUBLIC);
        assert_eq!(ty.full_name(), "System.Text.StringBuilder");

        let global = TypeDefinition::new("", "<Module>", TypeAttributes::NOT_PUBLIC);
        assert_eq!(global.full_name(), "<Module>");
    }

    #[test]
    fn visibility_extraction() {
        let raw = 0x0010_0102;
        assert_eq!(
            TypeAttributes::visibility(raw),
            TypeAttributes::NESTED_PUBLIC
        );
    }
}
