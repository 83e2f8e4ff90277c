//! Method bodies, instructions, and exception handler regions.
//!
//! # Key Types
//! - [`MethodBody`] - One method's instruction stream plus handler table and locals metadata
//! - [`Instruction`], [`Operand`], [`InstrId`] - The instruction model
//! - [`ExceptionHandler`], [`HandlerKind`] - Try/handler regions and their entry-stack contracts

mod body;
mod exceptions;

pub use body::{Immediate, InstrId, Instruction, MethodBody, Operand};
pub use exceptions::{ExceptionHandler, HandlerKind};
