//! Type, method, field, and local-variable signatures.
//!
//! Signatures describe the shape of members independent of any instruction stream. They
//! embed [`TypeRefOrDef`] handles wherever a class or value type is named, which is why
//! importing a signature into another module is a real operation (every embedded handle
//! must be remapped) rather than a copy.
//!
//! This is deliberately the reduced signature surface the cloning engine and the
//! stack-depth verifier need; full signature-kind coverage (generics, function pointers,
//! custom modifiers) lives with the external metadata image.

use crate::metadata::module::TypeRefOrDef;

/// An element type as it appears inside a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    /// No value. Only valid as a return type.
    Void,
    /// Boolean
    Boolean,
    /// UTF-16 code unit
    Char,
    /// Signed 8-bit integer
    I1,
    /// Unsigned 8-bit integer
    U1,
    /// Signed 16-bit integer
    I2,
    /// Unsigned 16-bit integer
    U2,
    /// Signed 32-bit integer
    I4,
    /// Unsigned 32-bit integer
    U4,
    /// Signed 64-bit integer
    I8,
    /// Unsigned 64-bit integer
    U8,
    /// 32-bit float
    R4,
    /// 64-bit float
    R8,
    /// String reference
    String,
    /// Object reference
    Object,
    /// Native-sized integer
    IntPtr,
    /// A reference type named by a type handle
    Class(TypeRefOrDef),
    /// A value type named by a type handle
    ValueType(TypeRefOrDef),
    /// Single-dimensional, zero-based array of the element type
    SzArray(Box<TypeSignature>),
    /// Managed pointer to the element type
    ByRef(Box<TypeSignature>),
}

/// Signature of a method: calling convention, return type, and parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Whether the method takes a `this` pointer as hidden first argument.
    pub has_this: bool,
    /// The return type. [`TypeSignature::Void`] for void methods.
    pub return_type: TypeSignature,
    /// Parameter types, in order, not counting `this`.
    pub params: Vec<TypeSignature>,
}

impl MethodSignature {
    /// Create a new method signature.
    #[must_use]
    pub fn new(has_this: bool, return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        MethodSignature {
            has_this,
            return_type,
            params,
        }
    }

    /// Whether this method returns no value.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.return_type == TypeSignature::Void
    }

    /// Number of stack slots a call site pops for arguments, including a `this`
    /// pointer when the calling convention carries one.
    #[must_use]
    pub fn argument_slots(&self) -> usize {
        self.params.len() + usize::from(self.has_this)
    }
}

/// Signature of a field: its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSignature {
    /// The declared type of the field.
    pub field_type: TypeSignature,
}

impl FieldSignature {
    /// Create a new field signature.
    #[must_use]
    pub fn new(field_type: TypeSignature) -> Self {
        FieldSignature { field_type }
    }
}

/// One entry of a local-variables signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalVariable {
    /// Whether the variable is pinned for the duration of the method.
    pub is_pinned: bool,
    /// Whether the variable is a managed pointer.
    pub is_byref: bool,
    /// The declared type of the variable.
    pub var_type: TypeSignature,
}

/// The ordered local-variable types of one method body, stored standalone in the module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocalVariablesSignature {
    /// The local variables, in slot order.
    pub locals: Vec<LocalVariable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_slots_counts_this() {
        let static_sig = MethodSignature::new(false, TypeSignature::Void, vec![TypeSignature::I4]);
        assert_eq!(static_sig.argument_slots(), 1);
        assert!(static_sig.is_void());

        let instance_sig = MethodSignature::new(
            true,
            TypeSignature::I4,
            vec![TypeSignature::I4, TypeSignature::String],
        );
        assert_eq!(instance_sig.argument_slots(), 3);
        assert!(!instance_sig.is_void());
    }
}
