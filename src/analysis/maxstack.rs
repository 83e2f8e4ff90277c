//! Exact maximum-stack-depth computation over a method body's control flow graph.

use crate::{
    instructions::{FlowType, Opcode, PopKind},
    metadata::{
        method::{Instruction, MethodBody, Operand},
        module::{MemberRef, MemberSignature, MethodId, MethodRefOrDef, Module},
        signatures::MethodSignature,
    },
    Error, Result,
};

/// Compute the maximum evaluation-stack depth of a method's body.
///
/// A method without a body has no evaluation stack; the result is 0.
///
/// # Errors
/// Returns [`Error::StackImbalance`] or [`Error::StackUnderflow`] carrying the offset of
/// the instruction at which the violation was detected, or a malformed-data error for
/// structural defects such as control flow running past the end of the body.
pub fn compute_max_stack(module: &Module, method: MethodId) -> Result<usize> {
    let def = module.method(method)?;
    match &def.body {
        Some(body) => compute_body_max_stack(module, &def.signature, body),
        None => Ok(0),
    }
}

/// Compute the maximum evaluation-stack depth of a detached body.
///
/// `signature` is the signature of the method owning the body; it decides the depth
/// `ret` must observe. `module` resolves the signatures of invoked methods, from which
/// call-like instructions derive their stack effect.
///
/// The walk tracks, per instruction, the depth at which it was first reached. Reaching
/// an instruction again at a different depth is an imbalance, attributed to the offset
/// where the conflict is detected during the walk, not necessarily to the structural
/// join point itself. Unreachable instructions are never visited and cannot fail.
///
/// # Errors
/// See [`compute_max_stack`].
pub fn compute_body_max_stack(
    module: &Module,
    signature: &MethodSignature,
    body: &MethodBody,
) -> Result<usize> {
    let instructions = body.instructions();
    if instructions.is_empty() {
        return Ok(0);
    }

    validate_handler_nesting(body)?;

    let mut recorded: Vec<Option<usize>> = vec![None; instructions.len()];
    let mut max_depth = 0;

    // Control can enter a handler without falling through from its try block, so every
    // handler start (and filter start) is an independent seed. The method entry is
    // pushed last and therefore walked first.
    let mut agenda: Vec<(usize, usize)> = Vec::new();
    for handler in body.handlers() {
        if let Some(filter_start) = handler.filter_start {
            agenda.push((index_of(body, filter_start)?, 1));
        }
        agenda.push((
            index_of(body, handler.handler_start)?,
            handler.kind.entry_depth(),
        ));
    }
    agenda.push((0, 0));

    while let Some((start, entry_depth)) = agenda.pop() {
        let mut index = start;
        let mut depth = entry_depth;

        loop {
            let Some(ins) = instructions.get(index) else {
                return Err(malformed_error!(
                    "Control flow runs past the end of the method body"
                ));
            };

            match recorded[index] {
                Some(previous) => {
                    if previous != depth {
                        return Err(Error::StackImbalance { offset: ins.offset });
                    }
                    // Everything from here on was already walked at this depth.
                    break;
                }
                None => recorded[index] = Some(depth),
            }
            max_depth = max_depth.max(depth);

            let info = ins.opcode.info();
            match info.flow {
                FlowType::Return => {
                    let required = usize::from(!signature.is_void());
                    if depth != required {
                        return Err(Error::StackImbalance { offset: ins.offset });
                    }
                    break;
                }
                // No balance contract holds at or beyond a throw-like terminator.
                FlowType::Throw => break,
                FlowType::Jump => {
                    if depth != 0 {
                        return Err(Error::StackImbalance { offset: ins.offset });
                    }
                    break;
                }
                _ => {}
            }

            let (pops, pushes) = stack_effect(module, ins, info.pops, info.pushes)?;
            if pops > depth {
                return Err(Error::StackUnderflow { offset: ins.offset });
            }
            depth = depth - pops + pushes;
            max_depth = max_depth.max(depth);

            match info.flow {
                FlowType::Sequential | FlowType::Call => index += 1,
                FlowType::ConditionalBranch => {
                    agenda.push((branch_target(body, ins)?, depth));
                    index += 1;
                }
                FlowType::UnconditionalBranch => index = branch_target(body, ins)?,
                FlowType::Switch => {
                    let Operand::Switch(targets) = &ins.operand else {
                        return Err(malformed_error!(
                            "switch at 0x{:04X} has no target list",
                            ins.offset
                        ));
                    };
                    for &target in targets {
                        agenda.push((index_of(body, target)?, depth));
                    }
                    index += 1;
                }
                FlowType::Leave => {
                    // The operand stack is cleared on a transfer out of a protected
                    // region; the depth up to here still counted towards the maximum.
                    agenda.push((branch_target(body, ins)?, 0));
                    break;
                }
                FlowType::Return | FlowType::Throw | FlowType::Jump => break,
            }
        }
    }

    Ok(max_depth)
}

/// Pop and push counts of one instruction, deriving call-like effects from the invoked
/// method's signature.
fn stack_effect(
    module: &Module,
    ins: &Instruction,
    pops: PopKind,
    pushes: u8,
) -> Result<(usize, usize)> {
    match pops {
        PopKind::Fixed(n) => Ok((n as usize, pushes as usize)),
        PopKind::VarPop => {
            let signature = invoked_signature(module, ins)?;
            match ins.opcode {
                // newobj pops the constructor arguments but not a `this`, and pushes
                // the new instance regardless of the (void) constructor return type.
                Opcode::Newobj => Ok((signature.params.len(), 1)),
                _ => Ok((
                    signature.argument_slots(),
                    usize::from(!signature.is_void()),
                )),
            }
        }
    }
}

fn invoked_signature<'m>(module: &'m Module, ins: &Instruction) -> Result<&'m MethodSignature> {
    let Operand::Member(MemberRef::Method(method)) = &ins.operand else {
        return Err(malformed_error!(
            "{} at 0x{:04X} must reference a method",
            ins.opcode.info().mnemonic,
            ins.offset
        ));
    };

    match *method {
        MethodRefOrDef::Def(id) => Ok(&module.method(id)?.signature),
        MethodRefOrDef::Ref(id) => match &module.member_ref(id)?.signature {
            MemberSignature::Method(sig) => Ok(sig),
            MemberSignature::Field(_) => Err(malformed_error!(
                "{} at 0x{:04X} references a field",
                ins.opcode.info().mnemonic,
                ins.offset
            )),
        },
    }
}

fn branch_target(body: &MethodBody, ins: &Instruction) -> Result<usize> {
    let Operand::Target(target) = ins.operand else {
        return Err(malformed_error!(
            "{} at 0x{:04X} has no branch target",
            ins.opcode.info().mnemonic,
            ins.offset
        ));
    };
    index_of(body, target)
}

fn index_of(body: &MethodBody, id: crate::metadata::method::InstrId) -> Result<usize> {
    body.index_of(id)
        .ok_or_else(|| malformed_error!("Instruction {} does not resolve in this body", id))
}

/// Handler regions must be pairwise disjoint or properly nested. Anything else has no
/// defined entry-depth semantics and is rejected up front.
fn validate_handler_nesting(body: &MethodBody) -> Result<()> {
    let mut intervals = Vec::new();
    for handler in body.handlers() {
        let try_range = (
            index_of(body, handler.try_start)?,
            index_of(body, handler.try_end)?,
        );
        let handler_range = (
            index_of(body, handler.handler_start)?,
            index_of(body, handler.handler_end)?,
        );
        if try_range.0 > try_range.1 || handler_range.0 > handler_range.1 {
            return Err(malformed_error!(
                "Handler region boundaries are inverted"
            ));
        }
        intervals.push(try_range);
        intervals.push(handler_range);
    }

    for i in 0..intervals.len() {
        for j in i + 1..intervals.len() {
            let (a, b) = (intervals[i], intervals[j]);
            let disjoint = a.1 < b.0 || b.1 < a.0;
            let nested = (b.0 <= a.0 && a.1 <= b.1) || (a.0 <= b.0 && b.1 <= a.1);
            if !disjoint && !nested {
                return Err(malformed_error!(
                    "Exception handler regions overlap without nesting"
                ));
            }
        }
    }
    Ok(())
}
