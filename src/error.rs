use thiserror::Error;

use crate::metadata::module::{FieldId, MemberRefId, MethodId, SignatureId, TypeDefId, TypeRefId};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::Malformed`] - Inconsistent or invalid member/body structure
/// - [`Error::TypeNotFound`], [`Error::FieldNotFound`], [`Error::MethodNotFound`] - Dangling
///   definition handles
/// - [`Error::TypeRefNotFound`], [`Error::MemberRefNotFound`], [`Error::SignatureNotFound`] -
///   Dangling reference-record handles
///
/// ## Verification Errors
/// - [`Error::StackImbalance`] - The evaluation stack is unbalanced; carries the IL offset of
///   the instruction at which the violation was detected
/// - [`Error::StackUnderflow`] - An instruction pops more values than are on the stack
///
/// Verification errors are program-correctness defects in the input and are surfaced to the
/// caller unmodified; nothing in this library retries or suppresses them.
#[derive(Error, Debug)]
pub enum Error {
    /// The member graph or method body is structurally invalid.
    ///
    /// Raised for branch targets with no instruction at the referenced offset, exception
    /// handler boundaries that do not resolve, operand/opcode kind mismatches, overlapping
    /// handler regions, and similar structural defects. The error includes the source
    /// location where the malformation was detected for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The evaluation stack is unbalanced at the given IL offset.
    ///
    /// Detected during stack-depth verification: a join point reached at two different
    /// depths, a `ret` at the wrong depth for the method's return type, or a jump-transfer
    /// with a non-empty stack. The offset identifies the instruction at which the conflict
    /// was *detected* during traversal, which may lie downstream of the structural join.
    #[error("Stack imbalance detected at IL offset 0x{offset:04X}")]
    StackImbalance {
        /// IL offset of the offending instruction
        offset: u32,
    },

    /// An instruction pops more values than are present on the evaluation stack.
    #[error("Stack underflow at IL offset 0x{offset:04X}")]
    StackUnderflow {
        /// IL offset of the offending instruction
        offset: u32,
    },

    /// A type definition handle does not resolve in its module.
    #[error("Failed to find type definition - {0}")]
    TypeNotFound(TypeDefId),

    /// A field definition handle does not resolve in its module.
    #[error("Failed to find field definition - {0}")]
    FieldNotFound(FieldId),

    /// A method definition handle does not resolve in its module.
    #[error("Failed to find method definition - {0}")]
    MethodNotFound(MethodId),

    /// A type reference handle does not resolve in its module.
    #[error("Failed to find type reference - {0}")]
    TypeRefNotFound(TypeRefId),

    /// A member reference handle does not resolve in its module.
    #[error("Failed to find member reference - {0}")]
    MemberRefNotFound(MemberRefId),

    /// A standalone signature handle does not resolve in its module.
    #[error("Failed to find standalone signature - {0}")]
    SignatureNotFound(SignatureId),
}
