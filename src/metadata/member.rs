//! Field and method definitions, their attribute flags, and constant values.

use bitflags::bitflags;

use crate::metadata::{
    method::MethodBody,
    module::TypeDefId,
    signatures::{FieldSignature, MethodSignature},
};

/// Bitmask for access extraction from raw field attributes
pub const FIELD_ACCESS_MASK: u16 = 0x0007;
/// Bitmask for access extraction from raw method attributes
pub const METHOD_ACCESS_MASK: u16 = 0x0007;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Field attribute flags
    pub struct FieldAttributes: u16 {
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by anyone in the assembly
        const ASSEMBLY = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessible by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Field can only be initialized, not written after init
        const INIT_ONLY = 0x0020;
        /// Value is a compile-time constant
        const LITERAL = 0x0040;
        /// Field has a default value record
        const HAS_DEFAULT = 0x8000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method attribute flags
    pub struct MethodAttributes: u16 {
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by anyone in the assembly
        const ASSEMBLY = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessible by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// CLI provides 'special' behavior, depending upon the name of the method
        const RTSPECIAL_NAME = 0x1000;
    }
}

/// A typed compile-time literal attached to a field.
///
/// Cloning copies constants by value; there is no sharing between a source field and its
/// clone.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Boolean literal
    Boolean(bool),
    /// UTF-16 code unit literal
    Char(char),
    /// Signed 8-bit literal
    I1(i8),
    /// Unsigned 8-bit literal
    U1(u8),
    /// Signed 16-bit literal
    I2(i16),
    /// Unsigned 16-bit literal
    U2(u16),
    /// Signed 32-bit literal
    I4(i32),
    /// Unsigned 32-bit literal
    U4(u32),
    /// Signed 64-bit literal
    I8(i64),
    /// Unsigned 64-bit literal
    U8(u64),
    /// 32-bit float literal
    R4(f32),
    /// 64-bit float literal
    R8(f64),
    /// String literal blob
    String(String),
    /// Null reference literal
    Null,
}

/// Describes one field of a type.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Name of the field.
    pub name: String,
    /// Attribute flags.
    pub flags: FieldAttributes,
    /// The declared type of the field.
    pub signature: FieldSignature,
    /// Optional compile-time constant value.
    pub constant: Option<Constant>,

    pub(crate) declaring_type: Option<TypeDefId>,
}

impl FieldDefinition {
    /// Create a new field definition, not yet attached to a type.
    #[must_use]
    pub fn new(name: &str, flags: FieldAttributes, signature: FieldSignature) -> Self {
        FieldDefinition {
            name: name.to_string(),
            flags,
            signature,
            constant: None,
            declaring_type: None,
        }
    }

    /// The type this field is declared on, once attached.
    #[must_use]
    pub fn declaring_type(&self) -> Option<TypeDefId> {
        self.declaring_type
    }
}

/// One named parameter record of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Name of the parameter.
    pub name: String,
    /// 1-based position; 0 denotes the return parameter record.
    pub sequence: u16,
}

/// Describes one method of a type.
#[derive(Debug, Clone)]
pub struct MethodDefinition {
    /// Name of the method.
    pub name: String,
    /// Attribute flags.
    pub flags: MethodAttributes,
    /// Calling convention, return type, and parameter types.
    pub signature: MethodSignature,
    /// Named parameter records, in sequence order.
    pub parameters: Vec<Parameter>,
    /// The body, for methods that have one.
    pub body: Option<MethodBody>,

    pub(crate) declaring_type: Option<TypeDefId>,
}

impl MethodDefinition {
    /// Create a new bodiless method definition, not yet attached to a type.
    #[must_use]
    pub fn new(name: &str, flags: MethodAttributes, signature: MethodSignature) -> Self {
        MethodDefinition {
            name: name.to_string(),
            flags,
            signature,
            parameters: Vec::new(),
            body: None,
            declaring_type: None,
        }
    }

    /// The type this method is declared on, once attached.
    #[must_use]
    pub fn declaring_type(&self) -> Option<TypeDefId> {
        self.declaring_type
    }
}
