//! Benchmarks for member cloning and stack-depth verification.
//!
//! Builds a synthetic source module with a type subtree of configurable width, then
//! measures cloning the subtree into a fresh target and verifying every cloned body.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cilgraft::prelude::*;

/// A source module holding one type with `methods` self-calling methods, each with a
/// small branching body, plus a nested type with a field per method.
fn build_source(methods: usize) -> (Module, TypeDefId) {
    let mut source = Module::new("source.dll");
    let root = source.define_type(TypeDefinition::new("Bench", "Root", TypeAttributes::PUBLIC));
    let inner = source.define_type(TypeDefinition::new(
        "",
        "Inner",
        TypeAttributes::NESTED_PUBLIC,
    ));
    source.add_nested_type(root, inner).unwrap();

    for i in 0..methods {
        let method = source
            .add_method(
                root,
                MethodDefinition::new(
                    &format!("Method{i}"),
                    MethodAttributes::PUBLIC,
                    MethodSignature::new(true, TypeSignature::Void, Vec::new()),
                ),
            )
            .unwrap();
        source
            .add_field(
                inner,
                FieldDefinition::new(
                    &format!("field{i}"),
                    FieldAttributes::PRIVATE,
                    FieldSignature::new(TypeSignature::Class(TypeRefOrDef::Def(root))),
                ),
            )
            .unwrap();

        let mut body = MethodBody::new();
        let entry = body.push(Opcode::Ldarg, Operand::Argument(0)).unwrap();
        body.push(
            Opcode::Call,
            Operand::Member(MemberRef::Method(MethodRefOrDef::Def(method))),
        )
        .unwrap();
        body.push(Opcode::LdcI4, Operand::Immediate(Immediate::I32(i as i32)))
            .unwrap();
        let brtrue = body.push(Opcode::Brtrue, Operand::Target(entry)).unwrap();
        body.push(Opcode::Nop, Operand::None).unwrap();
        let end = body.push(Opcode::Ret, Operand::None).unwrap();
        body.set_operand(brtrue, Operand::Target(end)).unwrap();

        source.method_mut(method).unwrap().body = Some(body);
    }

    (source, root)
}

fn bench_clone_type(c: &mut Criterion) {
    let mut group = c.benchmark_group("clone_type");
    for methods in [4usize, 32, 256] {
        let (source, root) = build_source(methods);
        group.throughput(Throughput::Elements(methods as u64));
        group.bench_with_input(BenchmarkId::from_parameter(methods), &methods, |b, _| {
            b.iter(|| {
                let mut target = Module::new("target.dll");
                let clone = MemberCloner::new(&source, &mut target)
                    .clone_type(black_box(root))
                    .unwrap();
                black_box((target, clone))
            });
        });
    }
    group.finish();
}

fn bench_clone_and_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("clone_and_verify");
    for methods in [4usize, 32, 256] {
        let (source, root) = build_source(methods);
        group.throughput(Throughput::Elements(methods as u64));
        group.bench_with_input(BenchmarkId::from_parameter(methods), &methods, |b, _| {
            b.iter(|| {
                let mut target = Module::new("target.dll");
                let clone = MemberCloner::new(&source, &mut target)
                    .clone_type(black_box(root))
                    .unwrap();
                let methods: Vec<MethodId> =
                    target.type_def(clone).unwrap().methods().to_vec();
                let mut max = 0;
                for method in methods {
                    max = max.max(compute_max_stack(&target, method).unwrap());
                }
                black_box(max)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_clone_type, bench_clone_and_verify);
criterion_main!(benches);
