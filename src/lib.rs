// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # cilgraft
//!
//! Structural manipulation of CIL member graphs: clone type-definition subtrees across
//! module boundaries, and verify the evaluation-stack discipline of the resulting method
//! bodies. Built in pure Rust, `cilgraft` operates on an in-memory metadata model and
//! leaves container-format reading and writing to its callers.
//!
//! ## Features
//!
//! - **Member cloning** - Duplicate a type with its nested types, fields, methods, and
//!   bodies into another module, with every intra-subtree reference rewritten to the
//!   clones and every outward reference imported as a minimal reference record
//! - **Reference importing** - Find-or-create reference records for foreign members,
//!   usable standalone or as the substitution layer inside a clone operation
//! - **Stack-depth verification** - Compute the exact maximum evaluation-stack depth of
//!   a method body, or pinpoint the offset where the stack is provably imbalanced
//! - **Handle-based model** - Members are arena handles, so cyclic and self-referential
//!   member graphs need no reference counting and no interior mutability
//!
//! ## Quick Start
//!
//! ```rust
//! use cilgraft::prelude::*;
//!
//! let mut source = Module::new("source.dll");
//! let widget = source.define_type(TypeDefinition::new("App", "Widget", TypeAttributes::PUBLIC));
//!
//! let mut target = Module::new("target.dll");
//! let clone = MemberCloner::new(&source, &mut target).clone_type(widget)?;
//!
//! assert_eq!(target.type_def(clone)?.full_name(), "App.Widget");
//! # Ok::<(), cilgraft::Error>(())
//! ```
//!
//! ### Verifying stack depth
//!
//! ```rust
//! use cilgraft::prelude::*;
//!
//! let module = Module::new("demo.dll");
//! let signature = MethodSignature::new(false, TypeSignature::I4, Vec::new());
//!
//! let mut body = MethodBody::new();
//! body.push(Opcode::LdcI4, Operand::Immediate(Immediate::I32(21)))?;
//! body.push(Opcode::Dup, Operand::None)?;
//! body.push(Opcode::Add, Operand::None)?;
//! body.push(Opcode::Ret, Operand::None)?;
//!
//! assert_eq!(compute_body_max_stack(&module, &signature, &body)?, 2);
//! # Ok::<(), cilgraft::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - The hosting model: modules, type/field/method definitions, method
//!   bodies, signatures, and reference records
//! - [`instructions`] - The opcode metadata table for the control-flow-relevant CIL
//!   instruction subset
//! - [`cloning`] - Reference importers and the three-phase member cloner
//! - [`analysis`] - The stack-depth verifier
//! - [`Error`] and [`Result`] - Error handling across the crate
//!
//! ## Standards Compliance
//!
//! The member model, stack-depth rules, and exception-handler entry contracts follow
//! the **ECMA-335 specification** (6th edition) for the Common Language Infrastructure.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Verification failures carry the
//! IL offset of the offending instruction as structured data:
//!
//! ```rust
//! use cilgraft::{compute_body_max_stack, Error};
//! # use cilgraft::instructions::Opcode;
//! # use cilgraft::metadata::method::{MethodBody, Operand};
//! # use cilgraft::metadata::module::Module;
//! # use cilgraft::metadata::signatures::{MethodSignature, TypeSignature};
//!
//! # let module = Module::new("demo.dll");
//! # let signature = MethodSignature::new(false, TypeSignature::I4, Vec::new());
//! # let mut body = MethodBody::new();
//! # body.push(Opcode::Ret, Operand::None)?;
//! match compute_body_max_stack(&module, &signature, &body) {
//!     Ok(depth) => println!("max stack: {depth}"),
//!     Err(Error::StackImbalance { offset }) => println!("imbalance at 0x{offset:04X}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! # Ok::<(), cilgraft::Error>(())
//! ```

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use cilgraft::prelude::*;
///
/// let mut module = Module::new("demo.dll");
/// let ty = module.define_type(TypeDefinition::new("App", "Widget", TypeAttributes::PUBLIC));
/// assert_eq!(module.type_def(ty)?.name, "Widget");
/// # Ok::<(), cilgraft::Error>(())
/// ```
pub mod prelude;

/// Opcode metadata for the supported CIL instruction subset.
pub mod instructions;

/// The metadata model: modules, definitions, bodies, signatures, and references.
pub mod metadata;

/// Reference importers and the member cloning engine.
pub mod cloning;

/// Method body analysis passes.
pub mod analysis;

pub use crate::analysis::{compute_body_max_stack, compute_max_stack};
pub use crate::error::Error;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
