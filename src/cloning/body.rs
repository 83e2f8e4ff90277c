//! Two-pass method body cloning.

use std::collections::HashMap;

use crate::{
    cloning::{CloneMap, CloningReferenceImporter},
    metadata::{
        method::{ExceptionHandler, InstrId, MethodBody, Operand},
        module::Module,
    },
    Result,
};

/// Duplicates one method body, importing member operands and re-targeting every
/// intra-body reference.
///
/// Cloning is two-pass. Pass 1 replicates the instruction stream with fresh ids,
/// preserving offsets and opcodes verbatim; member-reference operands are rewritten
/// through the clone-aware importer, primitive and index operands are copied by value,
/// and branch operands keep their *source* ids for the moment. Pass 2 resolves each
/// queued branch operand to the new instruction at the same offset as its original
/// target, element-wise for switch lists. A single pass cannot do this, since a forward
/// branch points at an instruction that does not exist yet when the branch is cloned.
///
/// Exception handler regions are copied afterwards the same way, boundary by boundary,
/// preserving region order. The result carries no source ids anywhere.
#[derive(Debug, Clone, Copy)]
pub struct BodyCloner<'a> {
    importer: CloningReferenceImporter<'a>,
}

impl<'a> BodyCloner<'a> {
    /// Create a body cloner reading from `source` and substituting through `clones`.
    #[must_use]
    pub fn new(source: &'a Module, clones: &'a CloneMap) -> Self {
        BodyCloner {
            importer: CloningReferenceImporter::new(source, clones),
        }
    }

    /// Clone `body` into a fresh [`MethodBody`] whose references are valid in `target`.
    ///
    /// The init-locals flag and declared max-stack are copied as plain values; the
    /// local-variable-types signature, if present, is imported and re-registered in the
    /// target module.
    ///
    /// # Errors
    /// Returns an error if a branch target or handler boundary does not resolve in the
    /// source body, or if an operand import fails.
    pub fn clone_body(&self, target: &mut Module, body: &MethodBody) -> Result<MethodBody> {
        let mut clone = MethodBody::new();
        clone.init_locals = body.init_locals;
        clone.max_stack = body.max_stack;

        if let Some(locals) = body.locals {
            clone.locals = Some(self.importer.import_standalone_signature(target, locals)?);
        }

        // Pass 1. Branch operands still hold source ids afterwards; `fixups` records
        // which stream positions need re-targeting.
        let mut fixups = Vec::new();
        for (position, ins) in body.instructions().iter().enumerate() {
            let operand = match &ins.operand {
                Operand::Member(member) => {
                    Operand::Member(self.importer.import_reference(target, member)?)
                }
                Operand::Target(_) | Operand::Switch(_) => {
                    fixups.push(position);
                    ins.operand.clone()
                }
                other => other.clone(),
            };
            clone.push_with_offset(ins.offset, ins.opcode, operand)?;
        }

        let by_offset: HashMap<u32, InstrId> = clone
            .instructions()
            .iter()
            .map(|ins| (ins.offset, ins.id()))
            .collect();

        let resolve = |id: InstrId| -> Result<InstrId> {
            let offset = body.offset_of(id).ok_or_else(|| {
                malformed_error!("Branch target {} does not resolve in the source body", id)
            })?;
            by_offset.get(&offset).copied().ok_or_else(|| {
                malformed_error!("No cloned instruction at offset 0x{:04X}", offset)
            })
        };

        // Pass 2.
        for position in fixups {
            let ins = &mut clone.instructions_mut()[position];
            ins.operand = match &ins.operand {
                Operand::Target(target_id) => Operand::Target(resolve(*target_id)?),
                Operand::Switch(targets) => Operand::Switch(
                    targets
                        .iter()
                        .map(|t| resolve(*t))
                        .collect::<Result<Vec<_>>>()?,
                ),
                other => other.clone(),
            };
        }

        for handler in body.handlers() {
            let catch_type = match &handler.catch_type {
                Some(ty) => Some(self.importer.import_type(target, ty)?),
                None => None,
            };
            let filter_start = match handler.filter_start {
                Some(fs) => Some(resolve(fs)?),
                None => None,
            };

            clone.add_handler(ExceptionHandler {
                kind: handler.kind,
                try_start: resolve(handler.try_start)?,
                try_end: resolve(handler.try_end)?,
                handler_start: resolve(handler.handler_start)?,
                handler_end: resolve(handler.handler_end)?,
                filter_start,
                catch_type,
            })?;
        }

        Ok(clone)
    }
}
