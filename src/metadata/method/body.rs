//! Method bodies and their instruction streams.
//!
//! A [`MethodBody`] owns an ordered instruction sequence plus the body-level metadata a
//! transformation pass depends on: the init-locals flag, the declared max-stack, the
//! handle of the local-variable-types signature, and the exception handler table.
//!
//! Instructions are identified by a per-body [`InstrId`], allocated monotonically and
//! never reused. Branch operands and handler boundaries hold these ids, not offsets and
//! not positions, so an instruction keeps its identity while a pass rewrites the stream
//! around it. Offsets, by contrast, are stable *lookup keys*: once a body is constructed
//! they stay fixed for the duration of any transformation pass, which is what allows two
//! independent instruction sequences to be correlated offset-by-offset during cloning.
//!
//! # Examples
//!
//! ```rust
//! use cilgraft::instructions::Opcode;
//! use cilgraft::metadata::method::{Immediate, MethodBody, Operand};
//!
//! let mut body = MethodBody::new();
//! body.push(Opcode::LdcI4, Operand::Immediate(Immediate::I32(2)))?;
//! body.push(Opcode::LdcI4, Operand::Immediate(Immediate::I32(3)))?;
//! body.push(Opcode::Add, Operand::None)?;
//! body.push(Opcode::Ret, Operand::None)?;
//!
//! // ldc.i4 encodes as 1 opcode byte + 4 operand bytes
//! assert_eq!(body.instructions()[1].offset, 5);
//! # Ok::<(), cilgraft::Error>(())
//! ```

use std::fmt;

use crate::{
    instructions::{Opcode, OperandKind},
    metadata::{
        method::ExceptionHandler,
        module::{MemberRef, SignatureId},
    },
    Result,
};

/// Identity of one instruction within its owning [`MethodBody`].
///
/// Ids are unique per body and carry no meaning across bodies; in particular, a cloned
/// body allocates fresh ids for every instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrId(pub(crate) u32);

impl fmt::Display for InstrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL#{}", self.0)
    }
}

/// A primitive literal operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 64-bit float
    F64(f64),
}

/// The operand of an instruction, decided once at construction time.
///
/// Downstream passes match on the variant; there is no runtime re-inspection of operand
/// values against the opcode table after a body has been built.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand.
    None,
    /// A primitive literal.
    Immediate(Immediate),
    /// A string literal.
    String(String),
    /// A member reference, possibly requiring import when moved across modules.
    Member(MemberRef),
    /// A single branch target.
    Target(InstrId),
    /// An ordered list of branch targets.
    Switch(Vec<InstrId>),
    /// A local-variable index.
    Variable(u16),
    /// An argument index.
    Argument(u16),
}

impl Operand {
    fn matches(&self, kind: OperandKind) -> bool {
        matches!(
            (kind, self),
            (OperandKind::None, Operand::None)
                | (OperandKind::I32, Operand::Immediate(Immediate::I32(_)))
                | (OperandKind::I64, Operand::Immediate(Immediate::I64(_)))
                | (OperandKind::F64, Operand::Immediate(Immediate::F64(_)))
                | (OperandKind::String, Operand::String(_))
                | (OperandKind::Member, Operand::Member(_))
                | (OperandKind::Target, Operand::Target(_))
                | (OperandKind::TargetList, Operand::Switch(_))
                | (OperandKind::Variable, Operand::Variable(_))
                | (OperandKind::Argument, Operand::Argument(_))
        )
    }

    /// Encoded size of the operand in bytes.
    #[must_use]
    pub fn encoded_size(&self) -> u32 {
        match self {
            Operand::None => 0,
            Operand::Immediate(Immediate::I32(_)) => 4,
            Operand::Immediate(Immediate::I64(_) | Immediate::F64(_)) => 8,
            // String literals, member references and branch targets encode as 4-byte
            // tokens / displacements
            Operand::String(_) | Operand::Member(_) | Operand::Target(_) => 4,
            Operand::Switch(targets) => 4 + 4 * targets.len() as u32,
            Operand::Variable(_) | Operand::Argument(_) => 2,
        }
    }
}

/// One decoded instruction of a method body.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub(crate) id: InstrId,
    /// Byte offset of this instruction from the start of the body.
    pub offset: u32,
    /// The opcode.
    pub opcode: Opcode,
    /// The operand.
    pub operand: Operand,
}

impl Instruction {
    /// The identity of this instruction within its body.
    #[must_use]
    pub fn id(&self) -> InstrId {
        self.id
    }

    /// Encoded size of this instruction in bytes, opcode plus operand.
    #[must_use]
    pub fn encoded_size(&self) -> u32 {
        self.opcode.encoded_len() + self.operand.encoded_size()
    }
}

/// The instruction stream, handler table, and locals metadata of one method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodBody {
    /// Flag, indicating to call default constructor on all local variables.
    pub init_locals: bool,
    /// Declared maximum number of items on the operand stack, copied as a plain value
    /// during cloning. The verified value comes from
    /// [`crate::analysis::compute_body_max_stack`].
    pub max_stack: u16,
    /// Handle of the local-variable-types signature, if the method has locals.
    pub locals: Option<SignatureId>,

    instructions: Vec<Instruction>,
    exception_handlers: Vec<ExceptionHandler>,
    next_id: u32,
}

impl MethodBody {
    /// Create an empty method body.
    #[must_use]
    pub fn new() -> Self {
        MethodBody::default()
    }

    /// Append an instruction, assigning its offset from the running encoded size.
    ///
    /// # Errors
    /// Returns an error if the operand does not match the opcode's operand kind.
    pub fn push(&mut self, opcode: Opcode, operand: Operand) -> Result<InstrId> {
        let offset = match self.instructions.last() {
            Some(last) => last.offset + last.encoded_size(),
            None => 0,
        };
        self.push_with_offset(offset, opcode, operand)
    }

    /// Append an instruction at an explicit offset, used when replicating an existing
    /// stream whose offsets must be preserved verbatim.
    pub(crate) fn push_with_offset(
        &mut self,
        offset: u32,
        opcode: Opcode,
        operand: Operand,
    ) -> Result<InstrId> {
        if !operand.matches(opcode.info().operand) {
            return Err(malformed_error!(
                "Operand {:?} does not match operand kind of {}",
                operand,
                opcode.info().mnemonic
            ));
        }

        if let Some(last) = self.instructions.last() {
            if offset <= last.offset {
                return Err(malformed_error!(
                    "Instruction offsets must be strictly increasing - 0x{:04X} after 0x{:04X}",
                    offset,
                    last.offset
                ));
            }
        }

        let id = InstrId(self.next_id);
        self.next_id += 1;

        self.instructions.push(Instruction {
            id,
            offset,
            opcode,
            operand,
        });
        Ok(id)
    }

    /// Replace the operand of an existing instruction.
    ///
    /// The main use is patching forward branches: push the branch with a provisional
    /// target, then point it at the real one once that instruction exists. Changing a
    /// switch list's length invalidates downstream offsets; run [`MethodBody::relayout`]
    /// afterwards in that case.
    ///
    /// # Errors
    /// Returns an error if `id` is unknown or the operand kind does not match.
    pub fn set_operand(&mut self, id: InstrId, operand: Operand) -> Result<()> {
        let Some(ins) = self.instructions.iter_mut().find(|i| i.id == id) else {
            return Err(malformed_error!("No instruction with id {}", id));
        };

        if !operand.matches(ins.opcode.info().operand) {
            return Err(malformed_error!(
                "Operand {:?} does not match operand kind of {}",
                operand,
                ins.opcode.info().mnemonic
            ));
        }

        ins.operand = operand;
        Ok(())
    }

    /// Append an exception handler region.
    ///
    /// # Errors
    /// Returns an error if any boundary does not resolve into this body, or if the
    /// filter/catch-type fields are inconsistent with the handler kind.
    pub fn add_handler(&mut self, handler: ExceptionHandler) -> Result<()> {
        use crate::metadata::method::HandlerKind;

        for boundary in [
            handler.try_start,
            handler.try_end,
            handler.handler_start,
            handler.handler_end,
        ] {
            if self.instruction(boundary).is_none() {
                return Err(malformed_error!(
                    "Handler boundary {} does not resolve in this body",
                    boundary
                ));
            }
        }

        match handler.kind {
            HandlerKind::Filter => {
                let Some(filter_start) = handler.filter_start else {
                    return Err(malformed_error!("Filter handler without filter start"));
                };
                if self.instruction(filter_start).is_none() {
                    return Err(malformed_error!(
                        "Filter start {} does not resolve in this body",
                        filter_start
                    ));
                }
            }
            HandlerKind::Exception => {
                if handler.filter_start.is_some() {
                    return Err(malformed_error!("Exception handler with a filter start"));
                }
            }
            HandlerKind::Finally | HandlerKind::Fault => {
                if handler.filter_start.is_some() || handler.catch_type.is_some() {
                    return Err(malformed_error!(
                        "Finally/fault handlers carry neither filter nor catch type"
                    ));
                }
            }
        }

        self.exception_handlers.push(handler);
        Ok(())
    }

    /// The instructions of this body, in stream order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub(crate) fn instructions_mut(&mut self) -> &mut [Instruction] {
        &mut self.instructions
    }

    /// The exception handler regions of this body, in declaration order.
    #[must_use]
    pub fn handlers(&self) -> &[ExceptionHandler] {
        &self.exception_handlers
    }

    /// Resolve an instruction id within this body.
    #[must_use]
    pub fn instruction(&self, id: InstrId) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.id == id)
    }

    /// Look up the instruction located at the given byte offset.
    #[must_use]
    pub fn instruction_at_offset(&self, offset: u32) -> Option<&Instruction> {
        self.instructions
            .binary_search_by_key(&offset, |i| i.offset)
            .ok()
            .map(|idx| &self.instructions[idx])
    }

    /// The byte offset of the instruction with the given id.
    #[must_use]
    pub fn offset_of(&self, id: InstrId) -> Option<u32> {
        self.instruction(id).map(|i| i.offset)
    }

    /// The stream position of the instruction with the given id.
    #[must_use]
    pub fn index_of(&self, id: InstrId) -> Option<usize> {
        self.instructions.iter().position(|i| i.id == id)
    }

    /// Size of the encoded instruction stream in bytes.
    #[must_use]
    pub fn code_size(&self) -> u32 {
        match self.instructions.last() {
            Some(last) => last.offset + last.encoded_size(),
            None => 0,
        }
    }

    /// Recompute all offsets from the running encoded sizes.
    ///
    /// Needed after an operand mutation changed an instruction's encoded size. Handler
    /// boundaries and branch operands hold ids, so they survive relayout untouched.
    pub fn relayout(&mut self) {
        let mut offset = 0;
        for ins in &mut self.instructions {
            ins.offset = offset;
            offset += ins.encoded_size();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::method::{ExceptionHandler, HandlerKind};

    #[test]
    fn offsets_accumulate_encoded_sizes() {
        let mut body = MethodBody::new();
        let a = body.push(Opcode::Nop, Operand::None).unwrap();
        let b = body
            .push(Opcode::LdcI4, Operand::Immediate(Immediate::I32(7)))
            .unwrap();
        let c = body.push(Opcode::Ceq, Operand::None).unwrap();
        let d = body.push(Opcode::Ret, Operand::None).unwrap();

        assert_eq!(body.offset_of(a), Some(0));
        assert_eq!(body.offset_of(b), Some(1));
        // ceq lives in the two-byte opcode space
        assert_eq!(body.offset_of(c), Some(6));
        assert_eq!(body.offset_of(d), Some(8));
    }

    #[test]
    fn operand_kind_is_enforced() {
        let mut body = MethodBody::new();
        let result = body.push(Opcode::LdcI4, Operand::None);
        assert!(result.is_err());

        let result = body.push(Opcode::Nop, Operand::Variable(0));
        assert!(result.is_err());
    }

    #[test]
    fn offset_lookup() {
        let mut body = MethodBody::new();
        let a = body.push(Opcode::Nop, Operand::None).unwrap();
        let b = body
            .push(Opcode::LdcI4, Operand::Immediate(Immediate::I32(1)))
            .unwrap();
        let c = body.push(Opcode::Ret, Operand::None).unwrap();

        assert_eq!(body.offset_of(a), Some(0));
        assert_eq!(body.offset_of(b), Some(1));
        assert_eq!(body.offset_of(c), Some(6));
        assert_eq!(body.instruction_at_offset(6).map(Instruction::id), Some(c));
        assert_eq!(body.instruction_at_offset(3), None);
        assert_eq!(body.code_size(), 7);
    }

    #[test]
    fn forward_branch_patching() {
        let mut body = MethodBody::new();
        let entry = body.push(Opcode::Nop, Operand::None).unwrap();
        let br = body.push(Opcode::Br, Operand::Target(entry)).unwrap();
        let target = body.push(Opcode::Ret, Operand::None).unwrap();

        body.set_operand(br, Operand::Target(target)).unwrap();
        match body.instruction(br).unwrap().operand {
            Operand::Target(t) => assert_eq!(t, target),
            _ => panic!("expected a branch target"),
        }

        // Kind mismatch on patch is rejected.
        assert!(body.set_operand(br, Operand::None).is_err());
    }

    #[test]
    fn handler_validation() {
        let mut body = MethodBody::new();
        let start = body.push(Opcode::Nop, Operand::None).unwrap();
        let end = body.push(Opcode::Ret, Operand::None).unwrap();

        // Filter kind demands a filter start.
        let result = body.add_handler(ExceptionHandler {
            kind: HandlerKind::Filter,
            try_start: start,
            try_end: start,
            handler_start: end,
            handler_end: end,
            filter_start: None,
            catch_type: None,
        });
        assert!(result.is_err());

        body.add_handler(ExceptionHandler {
            kind: HandlerKind::Finally,
            try_start: start,
            try_end: start,
            handler_start: end,
            handler_end: end,
            filter_start: None,
            catch_type: None,
        })
        .unwrap();
        assert_eq!(body.handlers().len(), 1);
    }

    #[test]
    fn relayout_recomputes_offsets() {
        let mut body = MethodBody::new();
        let a = body.push(Opcode::Nop, Operand::None).unwrap();
        let sw = body.push(Opcode::Switch, Operand::Switch(vec![a])).unwrap();
        let tail = body.push(Opcode::Ret, Operand::None).unwrap();
        assert_eq!(body.offset_of(tail), Some(10));

        body.set_operand(sw, Operand::Switch(vec![a, a])).unwrap();
        body.relayout();
        assert_eq!(body.offset_of(tail), Some(14));
    }
}
