//! The structural data model: modules, type/member definitions, signatures, and method
//! bodies.
//!
//! Everything here is plain owned data behind arena handles; the algorithms that operate
//! on it live in [`crate::cloning`] and [`crate::analysis`].

pub mod member;
pub mod method;
pub mod module;
pub mod signatures;
pub mod typedef;
