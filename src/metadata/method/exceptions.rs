//! Exception handler regions of a method body.

use crate::metadata::{method::InstrId, module::TypeRefOrDef};

/// The kind of an exception handler region, governing its entry-stack contract.
///
/// Entering an [`HandlerKind::Exception`] or [`HandlerKind::Filter`] handler places
/// exactly one value (the exception) on an otherwise empty stack; a
/// [`HandlerKind::Finally`] or [`HandlerKind::Fault`] handler starts on an empty stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// A typed exception clause.
    Exception,
    /// An exception filter and handler clause.
    Filter,
    /// A finally clause, executed during normal execution and exception handling.
    Finally,
    /// A fault clause, executed only when an exception is thrown.
    Fault,
}

impl HandlerKind {
    /// The stack depth logically present when control enters the handler.
    #[must_use]
    pub fn entry_depth(self) -> usize {
        match self {
            HandlerKind::Exception | HandlerKind::Filter => 1,
            HandlerKind::Finally | HandlerKind::Fault => 0,
        }
    }
}

/// One try/handler region of a method body.
///
/// All boundaries are instruction references into the owning body. Boundary ranges are
/// inclusive on both ends: `try_start..=try_end` covers the protected instructions and
/// `handler_start..=handler_end` the handling ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// The kind of this region.
    pub kind: HandlerKind,
    /// First protected instruction.
    pub try_start: InstrId,
    /// Last protected instruction.
    pub try_end: InstrId,
    /// First instruction of the handler.
    pub handler_start: InstrId,
    /// Last instruction of the handler.
    pub handler_end: InstrId,
    /// First instruction of the filter clause. [`HandlerKind::Filter`] only.
    pub filter_start: Option<InstrId>,
    /// The caught exception type. [`HandlerKind::Exception`] and [`HandlerKind::Filter`]
    /// only; `None` catches everything.
    pub catch_type: Option<TypeRefOrDef>,
}
