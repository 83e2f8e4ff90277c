//! Opcode metadata for the control-flow-relevant CIL instruction subset.
//!
//! For every [`Opcode`] the table supplies a fixed push count, a pop-count rule, the
//! operand-kind classification, and the flow classification. The stack-depth verifier in
//! [`crate::analysis`] and the body cloner in [`crate::cloning`] both depend on this
//! table but do not own it; extending the instruction set means extending [`Opcode::info`]
//! and nothing else.
//!
//! # Example
//! ```rust
//! use cilgraft::instructions::{FlowType, Opcode};
//!
//! let info = Opcode::Brtrue.info();
//! assert_eq!(info.mnemonic, "brtrue");
//! assert_eq!(info.flow, FlowType::ConditionalBranch);
//! ```

use strum::{EnumCount, EnumIter};

/// How an instruction affects control flow, determining its outgoing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Control falls through to the next instruction.
    Sequential,
    /// Calls a method and falls through; stack effect derives from the invoked signature.
    Call,
    /// Two outgoing edges: fall-through and the branch target.
    ConditionalBranch,
    /// One outgoing edge: the branch target.
    UnconditionalBranch,
    /// One edge per listed target, plus the untaken-case fall-through edge.
    Switch,
    /// Returns from the method; no outgoing edges.
    Return,
    /// Throw-like terminator; no outgoing edges, no stack contract at or beyond it.
    Throw,
    /// Transfers out of a protected region to its stated target, clearing the operand
    /// stack on the way.
    Leave,
    /// Unconditional jump-like transfer to another method; requires an empty stack and
    /// has no outgoing edges.
    Jump,
}

/// The operand kind an opcode carries, decided once at instruction-construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand.
    None,
    /// 32-bit integer literal.
    I32,
    /// 64-bit integer literal.
    I64,
    /// 64-bit float literal.
    F64,
    /// String literal.
    String,
    /// A member reference (field, method, or type).
    Member,
    /// A single branch-target instruction reference.
    Target,
    /// An ordered list of branch-target instruction references.
    TargetList,
    /// A local-variable index.
    Variable,
    /// An argument index.
    Argument,
}

/// The pop-count rule of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopKind {
    /// Pops a fixed number of values.
    Fixed(u8),
    /// Pop count derives from the operand signature (call-like opcodes and `ret`).
    VarPop,
}

/// Static metadata describing one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// Textual mnemonic.
    pub mnemonic: &'static str,
    /// The operand kind the opcode carries.
    pub operand: OperandKind,
    /// Flow classification.
    pub flow: FlowType,
    /// Fixed push count. Zero for call-like opcodes, whose pushes derive from the
    /// invoked signature's return type.
    pub pushes: u8,
    /// Pop-count rule.
    pub pops: PopKind,
}

/// The supported CIL opcodes.
///
/// This is the subset needed for structural body manipulation: every flow classification
/// is represented, plus the common data-movement and field/call opcodes whose operands
/// require member imports during cloning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter)]
pub enum Opcode {
    /// No operation
    Nop,
    /// Push a null reference
    Ldnull,
    /// Push a 32-bit integer constant
    LdcI4,
    /// Push a 64-bit integer constant
    LdcI8,
    /// Push a 64-bit float constant
    LdcR8,
    /// Push a string literal
    Ldstr,
    /// Duplicate the top of stack
    Dup,
    /// Discard the top of stack
    Pop,
    /// Add the two topmost values
    Add,
    /// Subtract the two topmost values
    Sub,
    /// Multiply the two topmost values
    Mul,
    /// Compare the two topmost values for equality
    Ceq,
    /// Load a local variable
    Ldloc,
    /// Store into a local variable
    Stloc,
    /// Load an argument
    Ldarg,
    /// Store into an argument
    Starg,
    /// Load an instance field
    Ldfld,
    /// Store into an instance field
    Stfld,
    /// Load a static field
    Ldsfld,
    /// Store into a static field
    Stsfld,
    /// Allocate an object and call its constructor
    Newobj,
    /// Call a method
    Call,
    /// Call a method with virtual dispatch
    Callvirt,
    /// Return from the current method
    Ret,
    /// Unconditional branch
    Br,
    /// Branch if the top of stack is non-zero
    Brtrue,
    /// Branch if the top of stack is zero
    Brfalse,
    /// Branch if the two topmost values are equal
    Beq,
    /// Multi-way branch over an ordered target list
    Switch,
    /// Exit a protected region towards the stated target
    Leave,
    /// Throw the exception on top of the stack
    Throw,
    /// Rethrow the exception being handled
    Rethrow,
    /// Terminate a finally or fault handler
    Endfinally,
    /// Terminate a filter clause
    Endfilter,
    /// Transfer control to another method with the current arguments
    Jmp,
    /// Push a runtime handle for a member
    Ldtoken,
    /// Box a value type
    Box,
    /// Test whether an object is an instance of a type
    Isinst,
    /// Cast an object to a type
    Castclass,
}

impl Opcode {
    /// Look up the static metadata for this opcode.
    #[must_use]
    pub fn info(self) -> &'static OpcodeInfo {
        use FlowType::*;
        use OperandKind as Op;
        use PopKind::*;

        macro_rules! info {
            ($mnemonic:literal, $operand:expr, $flow:expr, $pushes:literal, $pops:expr) => {
                &OpcodeInfo {
                    mnemonic: $mnemonic,
                    operand: $operand,
                    flow: $flow,
                    pushes: $pushes,
                    pops: $pops,
                }
            };
        }

        match self {
            Opcode::Nop => info!("nop", Op::None, Sequential, 0, Fixed(0)),
            Opcode::Ldnull => info!("ldnull", Op::None, Sequential, 1, Fixed(0)),
            Opcode::LdcI4 => info!("ldc.i4", Op::I32, Sequential, 1, Fixed(0)),
            Opcode::LdcI8 => info!("ldc.i8", Op::I64, Sequential, 1, Fixed(0)),
            Opcode::LdcR8 => info!("ldc.r8", Op::F64, Sequential, 1, Fixed(0)),
            Opcode::Ldstr => info!("ldstr", Op::String, Sequential, 1, Fixed(0)),
            Opcode::Dup => info!("dup", Op::None, Sequential, 2, Fixed(1)),
            Opcode::Pop => info!("pop", Op::None, Sequential, 0, Fixed(1)),
            Opcode::Add => info!("add", Op::None, Sequential, 1, Fixed(2)),
            Opcode::Sub => info!("sub", Op::None, Sequential, 1, Fixed(2)),
            Opcode::Mul => info!("mul", Op::None, Sequential, 1, Fixed(2)),
            Opcode::Ceq => info!("ceq", Op::None, Sequential, 1, Fixed(2)),
            Opcode::Ldloc => info!("ldloc", Op::Variable, Sequential, 1, Fixed(0)),
            Opcode::Stloc => info!("stloc", Op::Variable, Sequential, 0, Fixed(1)),
            Opcode::Ldarg => info!("ldarg", Op::Argument, Sequential, 1, Fixed(0)),
            Opcode::Starg => info!("starg", Op::Argument, Sequential, 0, Fixed(1)),
            Opcode::Ldfld => info!("ldfld", Op::Member, Sequential, 1, Fixed(1)),
            Opcode::Stfld => info!("stfld", Op::Member, Sequential, 0, Fixed(2)),
            Opcode::Ldsfld => info!("ldsfld", Op::Member, Sequential, 1, Fixed(0)),
            Opcode::Stsfld => info!("stsfld", Op::Member, Sequential, 0, Fixed(1)),
            Opcode::Newobj => info!("newobj", Op::Member, Call, 1, VarPop),
            Opcode::Call => info!("call", Op::Member, Call, 0, VarPop),
            Opcode::Callvirt => info!("callvirt", Op::Member, Call, 0, VarPop),
            Opcode::Ret => info!("ret", Op::None, Return, 0, VarPop),
            Opcode::Br => info!("br", Op::Target, UnconditionalBranch, 0, Fixed(0)),
            Opcode::Brtrue => info!("brtrue", Op::Target, ConditionalBranch, 0, Fixed(1)),
            Opcode::Brfalse => info!("brfalse", Op::Target, ConditionalBranch, 0, Fixed(1)),
            Opcode::Beq => info!("beq", Op::Target, ConditionalBranch, 0, Fixed(2)),
            Opcode::Switch => info!("switch", Op::TargetList, Switch, 0, Fixed(1)),
            Opcode::Leave => info!("leave", Op::Target, Leave, 0, Fixed(0)),
            Opcode::Throw => info!("throw", Op::None, Throw, 0, Fixed(1)),
            Opcode::Rethrow => info!("rethrow", Op::None, Throw, 0, Fixed(0)),
            Opcode::Endfinally => info!("endfinally", Op::None, Throw, 0, Fixed(0)),
            Opcode::Endfilter => info!("endfilter", Op::None, Throw, 0, Fixed(1)),
            Opcode::Jmp => info!("jmp", Op::Member, Jump, 0, Fixed(0)),
            Opcode::Ldtoken => info!("ldtoken", Op::Member, Sequential, 1, Fixed(0)),
            Opcode::Box => info!("box", Op::Member, Sequential, 1, Fixed(1)),
            Opcode::Isinst => info!("isinst", Op::Member, Sequential, 1, Fixed(1)),
            Opcode::Castclass => info!("castclass", Op::Member, Sequential, 1, Fixed(1)),
        }
    }

    /// Length in bytes of the encoded opcode itself, before any operand.
    ///
    /// The comparison, argument/local long forms, and handler terminators live in the
    /// two-byte 0xFE-prefixed opcode space.
    #[must_use]
    pub fn encoded_len(self) -> u32 {
        match self {
            Opcode::Ceq
            | Opcode::Ldloc
            | Opcode::Stloc
            | Opcode::Ldarg
            | Opcode::Starg
            | Opcode::Rethrow
            | Opcode::Endfilter => 2,
            _ => 1,
        }
    }
}
