//! Method body analysis passes.
//!
//! Currently one pass lives here: the stack-depth verifier, which walks a body's control
//! flow graph and computes the exact maximum evaluation-stack depth, or reports the
//! offset at which the stack is provably imbalanced. Use it to recompute
//! [`crate::metadata::method::MethodBody::max_stack`] after a transformation instead of
//! trusting the declared value.
//!
//! # Examples
//!
//! ```rust
//! use cilgraft::analysis::compute_body_max_stack;
//! use cilgraft::instructions::Opcode;
//! use cilgraft::metadata::method::{Immediate, MethodBody, Operand};
//! use cilgraft::metadata::module::Module;
//! use cilgraft::metadata::signatures::{MethodSignature, TypeSignature};
//!
//! let module = Module::new("demo.dll");
//! let signature = MethodSignature::new(false, TypeSignature::I4, Vec::new());
//!
//! let mut body = MethodBody::new();
//! body.push(Opcode::LdcI4, Operand::Immediate(Immediate::I32(2)))?;
//! body.push(Opcode::LdcI4, Operand::Immediate(Immediate::I32(3)))?;
//! body.push(Opcode::Add, Operand::None)?;
//! body.push(Opcode::Ret, Operand::None)?;
//!
//! assert_eq!(compute_body_max_stack(&module, &signature, &body)?, 2);
//! # Ok::<(), cilgraft::Error>(())
//! ```

mod maxstack;

pub use maxstack::{compute_body_max_stack, compute_max_stack};
