//! # cilgraft Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from the
//! cilgraft library. Import it to get quick access to the essential types for member
//! cloning and body verification.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cilgraft operations
pub use crate::Error;

/// The result type used throughout cilgraft
pub use crate::Result;

// ================================================================================================
// Metadata Model
// ================================================================================================

/// The hosting context and its member handles
pub use crate::metadata::module::{
    FieldId, FieldRefOrDef, MemberRef, MemberRefId, MemberReference, MemberSignature, MethodId,
    MethodRefOrDef, Module, ReferenceScope, SignatureId, TypeDefId, TypeRefId, TypeRefOrDef,
    TypeReference,
};

/// Type definitions and their attribute flags
pub use crate::metadata::typedef::{TypeAttributes, TypeDefinition};

/// Field and method definitions
pub use crate::metadata::member::{
    Constant, FieldAttributes, FieldDefinition, MethodAttributes, MethodDefinition, Parameter,
};

/// Method bodies, instructions, and exception handler regions
pub use crate::metadata::method::{
    ExceptionHandler, HandlerKind, Immediate, InstrId, Instruction, MethodBody, Operand,
};

/// Signatures
pub use crate::metadata::signatures::{
    FieldSignature, LocalVariable, LocalVariablesSignature, MethodSignature, TypeSignature,
};

// ================================================================================================
// Instructions
// ================================================================================================

/// The opcode table
pub use crate::instructions::{FlowType, Opcode, OpcodeInfo, OperandKind, PopKind};

// ================================================================================================
// Cloning and Analysis
// ================================================================================================

/// The cloning engine
pub use crate::cloning::{BodyCloner, CloneMap, CloningReferenceImporter, MemberCloner, ReferenceImporter};

/// Stack-depth verification
pub use crate::analysis::{compute_body_max_stack, compute_max_stack};
