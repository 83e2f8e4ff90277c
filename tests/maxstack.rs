//! Integration tests for the stack-depth verifier.

use cilgraft::prelude::*;

fn void_sig() -> MethodSignature {
    MethodSignature::new(false, TypeSignature::Void, Vec::new())
}

fn value_sig() -> MethodSignature {
    MethodSignature::new(false, TypeSignature::I4, Vec::new())
}

fn push(body: &mut MethodBody, opcode: Opcode, operand: Operand) -> InstrId {
    body.push(opcode, operand).unwrap()
}

#[test]
fn straight_line_depth_is_max_prefix_sum() {
    let module = Module::new("demo.dll");

    // Deltas: +1 +1 +1 -1 -1 -1; running prefix sums peak at 3.
    let mut body = MethodBody::new();
    push(&mut body, Opcode::Ldnull, Operand::None);
    push(&mut body, Opcode::Ldnull, Operand::None);
    push(&mut body, Opcode::Ldnull, Operand::None);
    push(&mut body, Opcode::Pop, Operand::None);
    push(&mut body, Opcode::Pop, Operand::None);
    push(&mut body, Opcode::Pop, Operand::None);
    push(&mut body, Opcode::Ret, Operand::None);

    assert_eq!(
        compute_body_max_stack(&module, &void_sig(), &body).unwrap(),
        3
    );
}

#[test]
fn nonvoid_return_on_empty_stack_fails_at_return() {
    let module = Module::new("demo.dll");
    let mut body = MethodBody::new();
    let ret = push(&mut body, Opcode::Ret, Operand::None);
    let ret_offset = body.offset_of(ret).unwrap();

    let err = compute_body_max_stack(&module, &value_sig(), &body).unwrap_err();
    assert!(matches!(err, Error::StackImbalance { offset } if offset == ret_offset));
}

#[test]
fn nonvoid_return_with_one_value_succeeds() {
    let module = Module::new("demo.dll");
    let mut body = MethodBody::new();
    push(&mut body, Opcode::Ldnull, Operand::None);
    push(&mut body, Opcode::Ret, Operand::None);

    assert_eq!(
        compute_body_max_stack(&module, &value_sig(), &body).unwrap(),
        1
    );
}

#[test]
fn void_return_with_leftover_value_fails_at_return() {
    let module = Module::new("demo.dll");
    let mut body = MethodBody::new();
    push(&mut body, Opcode::Ldnull, Operand::None);
    let ret = push(&mut body, Opcode::Ret, Operand::None);
    let ret_offset = body.offset_of(ret).unwrap();

    let err = compute_body_max_stack(&module, &void_sig(), &body).unwrap_err();
    assert!(matches!(err, Error::StackImbalance { offset } if offset == ret_offset));
}

/// Both paths of a conditional push exactly one value before converging.
#[test]
fn converging_paths_with_equal_depth_succeed() {
    let module = Module::new("demo.dll");
    let mut body = MethodBody::new();

    let entry = push(
        &mut body,
        Opcode::LdcI4,
        Operand::Immediate(Immediate::I32(1)),
    );
    // Branches point backwards provisionally and are patched once the targets exist.
    let brtrue = push(&mut body, Opcode::Brtrue, Operand::Target(entry));
    push(&mut body, Opcode::Ldnull, Operand::None);
    let br = push(&mut body, Opcode::Br, Operand::Target(entry));
    let taken = push(&mut body, Opcode::Ldnull, Operand::None);
    let join = push(&mut body, Opcode::Nop, Operand::None);
    push(&mut body, Opcode::Ret, Operand::None);

    body.set_operand(brtrue, Operand::Target(taken)).unwrap();
    body.set_operand(br, Operand::Target(join)).unwrap();

    assert_eq!(
        compute_body_max_stack(&module, &value_sig(), &body).unwrap(),
        1
    );
}

/// One path pushes two values, the other one. The walk takes the fall-through path
/// first and only notices the imbalance at the depth check of `ret`, downstream of the
/// structural join.
#[test]
fn converging_paths_with_unequal_depth_fail_where_detected() {
    let module = Module::new("demo.dll");
    let mut body = MethodBody::new();

    let entry = push(
        &mut body,
        Opcode::LdcI4,
        Operand::Immediate(Immediate::I32(1)),
    );
    let brtrue = push(&mut body, Opcode::Brtrue, Operand::Target(entry));
    push(&mut body, Opcode::Ldnull, Operand::None);
    push(&mut body, Opcode::Dup, Operand::None);
    let br = push(&mut body, Opcode::Br, Operand::Target(entry));
    let taken = push(&mut body, Opcode::Ldnull, Operand::None);
    let join = push(&mut body, Opcode::Nop, Operand::None);
    let ret = push(&mut body, Opcode::Ret, Operand::None);

    body.set_operand(brtrue, Operand::Target(taken)).unwrap();
    body.set_operand(br, Operand::Target(join)).unwrap();
    let ret_offset = body.offset_of(ret).unwrap();

    let err = compute_body_max_stack(&module, &value_sig(), &body).unwrap_err();
    assert!(matches!(err, Error::StackImbalance { offset } if offset == ret_offset));
}

/// Same shape, but the first walked path satisfies the return contract; the second
/// arrival then conflicts at the join instruction itself.
#[test]
fn converging_paths_with_unequal_depth_fail_at_join_on_revisit() {
    let module = Module::new("demo.dll");
    let mut body = MethodBody::new();

    let entry = push(
        &mut body,
        Opcode::LdcI4,
        Operand::Immediate(Immediate::I32(1)),
    );
    let brtrue = push(&mut body, Opcode::Brtrue, Operand::Target(entry));
    push(&mut body, Opcode::Ldnull, Operand::None);
    let br = push(&mut body, Opcode::Br, Operand::Target(entry));
    let taken = push(&mut body, Opcode::Ldnull, Operand::None);
    push(&mut body, Opcode::Dup, Operand::None);
    let join = push(&mut body, Opcode::Nop, Operand::None);
    push(&mut body, Opcode::Ret, Operand::None);

    body.set_operand(brtrue, Operand::Target(taken)).unwrap();
    body.set_operand(br, Operand::Target(join)).unwrap();
    let join_offset = body.offset_of(join).unwrap();

    let err = compute_body_max_stack(&module, &value_sig(), &body).unwrap_err();
    assert!(matches!(err, Error::StackImbalance { offset } if offset == join_offset));
}

#[test]
fn code_after_throw_is_dead_and_ignored() {
    let module = Module::new("demo.dll");
    let mut body = MethodBody::new();
    push(&mut body, Opcode::Ldnull, Operand::None);
    push(&mut body, Opcode::Throw, Operand::None);
    // Unreachable junk; would underflow if it were walked.
    push(&mut body, Opcode::Pop, Operand::None);

    assert_eq!(
        compute_body_max_stack(&module, &void_sig(), &body).unwrap(),
        1
    );
}

#[test]
fn catch_handler_is_seeded_at_depth_one() {
    let mut module = Module::new("demo.dll");
    let exception_ty = module.get_or_add_type_ref(TypeReference {
        scope: ReferenceScope::Module("corelib.dll".to_string()),
        namespace: "System".to_string(),
        name: "Exception".to_string(),
    });

    let mut body = MethodBody::new();
    let try_start = push(&mut body, Opcode::Nop, Operand::None);
    let try_leave = push(&mut body, Opcode::Leave, Operand::Target(try_start));
    let handler_start = push(&mut body, Opcode::Pop, Operand::None);
    let handler_leave = push(&mut body, Opcode::Leave, Operand::Target(try_start));
    let end = push(&mut body, Opcode::Ret, Operand::None);

    body.set_operand(try_leave, Operand::Target(end)).unwrap();
    body.set_operand(handler_leave, Operand::Target(end)).unwrap();
    body.add_handler(ExceptionHandler {
        kind: HandlerKind::Exception,
        try_start,
        try_end: try_leave,
        handler_start,
        handler_end: handler_leave,
        filter_start: None,
        catch_type: Some(TypeRefOrDef::Ref(exception_ty)),
    })
    .unwrap();

    assert_eq!(
        compute_body_max_stack(&module, &void_sig(), &body).unwrap(),
        1
    );
}

#[test]
fn finally_handler_is_seeded_at_depth_zero() {
    let module = Module::new("demo.dll");
    let mut body = MethodBody::new();
    let try_start = push(&mut body, Opcode::Nop, Operand::None);
    let try_leave = push(&mut body, Opcode::Leave, Operand::Target(try_start));
    let handler_start = push(&mut body, Opcode::Nop, Operand::None);
    let handler_end = push(&mut body, Opcode::Endfinally, Operand::None);
    let end = push(&mut body, Opcode::Ret, Operand::None);

    body.set_operand(try_leave, Operand::Target(end)).unwrap();
    body.add_handler(ExceptionHandler {
        kind: HandlerKind::Finally,
        try_start,
        try_end: try_leave,
        handler_start,
        handler_end,
        filter_start: None,
        catch_type: None,
    })
    .unwrap();

    assert_eq!(
        compute_body_max_stack(&module, &void_sig(), &body).unwrap(),
        0
    );
}

/// The depth reached inside the handler counts towards the overall maximum even though
/// `leave` resets the depth it carries onward to zero.
#[test]
fn junk_depth_before_leave_counts_towards_maximum() {
    let module = Module::new("demo.dll");
    let mut body = MethodBody::new();
    let try_start = push(&mut body, Opcode::Nop, Operand::None);
    let try_leave = push(&mut body, Opcode::Leave, Operand::Target(try_start));
    let handler_start = push(&mut body, Opcode::Ldnull, Operand::None);
    push(&mut body, Opcode::Ldnull, Operand::None);
    push(&mut body, Opcode::Ldnull, Operand::None);
    let handler_leave = push(&mut body, Opcode::Leave, Operand::Target(try_start));
    let end = push(&mut body, Opcode::Ret, Operand::None);

    body.set_operand(try_leave, Operand::Target(end)).unwrap();
    body.set_operand(handler_leave, Operand::Target(end)).unwrap();
    body.add_handler(ExceptionHandler {
        kind: HandlerKind::Finally,
        try_start,
        try_end: try_leave,
        handler_start,
        handler_end: handler_leave,
        filter_start: None,
        catch_type: None,
    })
    .unwrap();

    assert_eq!(
        compute_body_max_stack(&module, &void_sig(), &body).unwrap(),
        3
    );
}

#[test]
fn filter_start_is_seeded_at_depth_one() {
    let module = Module::new("demo.dll");

    let mut body = MethodBody::new();
    let try_start = push(&mut body, Opcode::Nop, Operand::None);
    let try_leave = push(&mut body, Opcode::Leave, Operand::Target(try_start));
    let filter_start = push(&mut body, Opcode::Endfilter, Operand::None);
    let handler_start = push(&mut body, Opcode::Pop, Operand::None);
    let handler_leave = push(&mut body, Opcode::Leave, Operand::Target(try_start));
    let end = push(&mut body, Opcode::Ret, Operand::None);

    body.set_operand(try_leave, Operand::Target(end)).unwrap();
    body.set_operand(handler_leave, Operand::Target(end)).unwrap();
    body.add_handler(ExceptionHandler {
        kind: HandlerKind::Filter,
        try_start,
        try_end: try_leave,
        handler_start,
        handler_end: handler_leave,
        filter_start: Some(filter_start),
        catch_type: None,
    })
    .unwrap();

    // Depth 1 is observed at the filter start and at the handler start.
    assert_eq!(
        compute_body_max_stack(&module, &void_sig(), &body).unwrap(),
        1
    );
}

#[test]
fn jump_transfer_with_empty_stack_succeeds_and_stops() {
    let mut module = Module::new("demo.dll");
    let ty = module.define_type(TypeDefinition::new("App", "Target", TypeAttributes::PUBLIC));
    let callee = module
        .add_method(
            ty,
            MethodDefinition::new("Run", MethodAttributes::PUBLIC, void_sig()),
        )
        .unwrap();

    let mut body = MethodBody::new();
    push(
        &mut body,
        Opcode::Jmp,
        Operand::Member(MemberRef::Method(MethodRefOrDef::Def(callee))),
    );
    // Present but never visited; would underflow otherwise.
    push(&mut body, Opcode::Pop, Operand::None);

    assert_eq!(
        compute_body_max_stack(&module, &void_sig(), &body).unwrap(),
        0
    );
}

#[test]
fn jump_transfer_with_nonempty_stack_fails_at_jump() {
    let mut module = Module::new("demo.dll");
    let ty = module.define_type(TypeDefinition::new("App", "Target", TypeAttributes::PUBLIC));
    let callee = module
        .add_method(
            ty,
            MethodDefinition::new("Run", MethodAttributes::PUBLIC, void_sig()),
        )
        .unwrap();

    let mut body = MethodBody::new();
    push(&mut body, Opcode::Ldnull, Operand::None);
    let jmp = push(
        &mut body,
        Opcode::Jmp,
        Operand::Member(MemberRef::Method(MethodRefOrDef::Def(callee))),
    );
    let jmp_offset = body.offset_of(jmp).unwrap();

    let err = compute_body_max_stack(&module, &void_sig(), &body).unwrap_err();
    assert!(matches!(err, Error::StackImbalance { offset } if offset == jmp_offset));
}

#[test]
fn switch_visits_every_target_and_the_fallthrough() {
    let module = Module::new("demo.dll");
    let mut body = MethodBody::new();

    let entry = push(
        &mut body,
        Opcode::LdcI4,
        Operand::Immediate(Immediate::I32(0)),
    );
    let switch = push(&mut body, Opcode::Switch, Operand::Switch(vec![entry]));
    let fallthrough = push(&mut body, Opcode::Nop, Operand::None);
    let br = push(&mut body, Opcode::Br, Operand::Target(fallthrough));
    let case_a = push(&mut body, Opcode::Nop, Operand::None);
    let case_b = push(&mut body, Opcode::Nop, Operand::None);
    let end = push(&mut body, Opcode::Ret, Operand::None);

    body.set_operand(switch, Operand::Switch(vec![case_a, case_b]))
        .unwrap();
    body.set_operand(br, Operand::Target(end)).unwrap();
    // The switch list grew, so downstream offsets moved.
    body.relayout();

    assert_eq!(
        compute_body_max_stack(&module, &void_sig(), &body).unwrap(),
        1
    );
}

#[test]
fn call_effects_derive_from_the_invoked_signature() {
    let mut module = Module::new("demo.dll");
    let ty = module.define_type(TypeDefinition::new("App", "Math", TypeAttributes::PUBLIC));
    let sum = module
        .add_method(
            ty,
            MethodDefinition::new(
                "Sum",
                MethodAttributes::PUBLIC | MethodAttributes::STATIC,
                MethodSignature::new(
                    false,
                    TypeSignature::I4,
                    vec![TypeSignature::I4, TypeSignature::I4],
                ),
            ),
        )
        .unwrap();

    let mut body = MethodBody::new();
    push(
        &mut body,
        Opcode::LdcI4,
        Operand::Immediate(Immediate::I32(2)),
    );
    push(
        &mut body,
        Opcode::LdcI4,
        Operand::Immediate(Immediate::I32(3)),
    );
    push(
        &mut body,
        Opcode::Call,
        Operand::Member(MemberRef::Method(MethodRefOrDef::Def(sum))),
    );
    push(&mut body, Opcode::Ret, Operand::None);

    // Two arguments popped, one return value pushed.
    assert_eq!(
        compute_body_max_stack(&module, &value_sig(), &body).unwrap(),
        2
    );
}

#[test]
fn instance_calls_pop_the_receiver_too() {
    let mut module = Module::new("demo.dll");
    let ty = module.define_type(TypeDefinition::new("App", "Widget", TypeAttributes::PUBLIC));
    let method = module
        .add_method(
            ty,
            MethodDefinition::new(
                "Update",
                MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL,
                MethodSignature::new(true, TypeSignature::Void, vec![TypeSignature::I4]),
            ),
        )
        .unwrap();

    let mut body = MethodBody::new();
    push(&mut body, Opcode::Ldnull, Operand::None);
    push(
        &mut body,
        Opcode::LdcI4,
        Operand::Immediate(Immediate::I32(5)),
    );
    push(
        &mut body,
        Opcode::Callvirt,
        Operand::Member(MemberRef::Method(MethodRefOrDef::Def(method))),
    );
    push(&mut body, Opcode::Ret, Operand::None);

    assert_eq!(
        compute_body_max_stack(&module, &void_sig(), &body).unwrap(),
        2
    );
}

#[test]
fn newobj_pops_arguments_and_pushes_the_instance() {
    let mut module = Module::new("demo.dll");
    let ty = module.define_type(TypeDefinition::new("App", "Widget", TypeAttributes::PUBLIC));
    let ctor = module
        .add_method(
            ty,
            MethodDefinition::new(
                ".ctor",
                MethodAttributes::PUBLIC | MethodAttributes::SPECIAL_NAME,
                MethodSignature::new(true, TypeSignature::Void, vec![TypeSignature::I4]),
            ),
        )
        .unwrap();

    let mut body = MethodBody::new();
    push(
        &mut body,
        Opcode::LdcI4,
        Operand::Immediate(Immediate::I32(5)),
    );
    push(
        &mut body,
        Opcode::Newobj,
        Operand::Member(MemberRef::Method(MethodRefOrDef::Def(ctor))),
    );
    push(&mut body, Opcode::Ret, Operand::None);

    assert_eq!(
        compute_body_max_stack(&module, &value_sig(), &body).unwrap(),
        1
    );
}

#[test]
fn method_level_entry_point() {
    let mut module = Module::new("demo.dll");
    let ty = module.define_type(TypeDefinition::new("App", "Widget", TypeAttributes::PUBLIC));

    let bodiless = module
        .add_method(
            ty,
            MethodDefinition::new("Abstract", MethodAttributes::ABSTRACT, void_sig()),
        )
        .unwrap();
    assert_eq!(compute_max_stack(&module, bodiless).unwrap(), 0);

    let mut body = MethodBody::new();
    push(&mut body, Opcode::Ldnull, Operand::None);
    push(&mut body, Opcode::Pop, Operand::None);
    push(&mut body, Opcode::Ret, Operand::None);
    let mut def = MethodDefinition::new("Run", MethodAttributes::PUBLIC, void_sig());
    def.body = Some(body);
    let with_body = module.add_method(ty, def).unwrap();

    assert_eq!(compute_max_stack(&module, with_body).unwrap(), 1);
}
