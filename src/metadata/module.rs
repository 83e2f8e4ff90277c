//! The [`Module`] hosting context and its member arenas.
//!
//! A module owns every definition and reference record via index arenas, and hands out
//! stable typed handles ([`TypeDefId`], [`FieldId`], [`MethodId`], ...) instead of direct
//! object references. Handle indirection is what lets the member graph contain self and
//! mutual references without ownership cycles: a method can reference its own declaring
//! type by handle, and the cloning engine can remap handles through an identity map.
//!
//! Handles are only meaningful within the module that issued them. Cross-module references
//! go through reference records ([`TypeReference`], [`MemberReference`]) created by the
//! import machinery in [`crate::cloning`].

use std::fmt;

use crate::{
    metadata::{
        member::{FieldDefinition, MethodDefinition},
        signatures::LocalVariablesSignature,
        typedef::TypeDefinition,
    },
    Result,
};

macro_rules! arena_handle {
    ($(#[$doc:meta])* $name:ident, $display:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// The raw arena index behind this handle.
            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($display, "[{}]"), self.0)
            }
        }
    };
}

arena_handle!(
    /// Handle to a [`TypeDefinition`] in a [`Module`].
    TypeDefId,
    "TypeDef"
);
arena_handle!(
    /// Handle to a [`FieldDefinition`] in a [`Module`].
    FieldId,
    "Field"
);
arena_handle!(
    /// Handle to a [`MethodDefinition`] in a [`Module`].
    MethodId,
    "Method"
);
arena_handle!(
    /// Handle to a [`TypeReference`] record in a [`Module`].
    TypeRefId,
    "TypeRef"
);
arena_handle!(
    /// Handle to a [`MemberReference`] record in a [`Module`].
    MemberRefId,
    "MemberRef"
);
arena_handle!(
    /// Handle to a standalone [`LocalVariablesSignature`] in a [`Module`].
    SignatureId,
    "StandAloneSig"
);

/// A type that is either defined in the current module or referenced from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRefOrDef {
    /// A type defined in the current module.
    Def(TypeDefId),
    /// A reference record pointing at a type in a foreign module.
    Ref(TypeRefId),
}

/// A method that is either defined in the current module or referenced from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodRefOrDef {
    /// A method defined in the current module.
    Def(MethodId),
    /// A reference record pointing at a method in a foreign module.
    Ref(MemberRefId),
}

/// A field that is either defined in the current module or referenced from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRefOrDef {
    /// A field defined in the current module.
    Def(FieldId),
    /// A reference record pointing at a field in a foreign module.
    Ref(MemberRefId),
}

/// A member reference of any kind, used as the generic operand form of instructions.
///
/// The kind is decided once when the operand is constructed; downstream consumers match
/// on the variant instead of performing runtime type tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRef {
    /// A type member reference.
    Type(TypeRefOrDef),
    /// A method member reference.
    Method(MethodRefOrDef),
    /// A field member reference.
    Field(FieldRefOrDef),
}

/// The resolution scope of a [`TypeReference`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceScope {
    /// The type lives at the top level of the named foreign module.
    Module(String),
    /// The type is nested inside another referenced type.
    Nested(TypeRefId),
}

/// A minimal record referencing a type defined in a foreign module.
///
/// Two records with identical scope, namespace and name are interchangeable; the module
/// deduplicates them on creation (see [`Module::get_or_add_type_ref`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeReference {
    /// Where the referenced type is resolved from.
    pub scope: ReferenceScope,
    /// Namespace of the referenced type. Empty for the global namespace and nested types.
    pub namespace: String,
    /// Name of the referenced type.
    pub name: String,
}

/// The signature half of a [`MemberReference`], discriminating methods from fields.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberSignature {
    /// Signature of a referenced method.
    Method(crate::metadata::signatures::MethodSignature),
    /// Signature of a referenced field.
    Field(crate::metadata::signatures::FieldSignature),
}

/// A minimal record referencing a field or method of a foreign type.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberReference {
    /// The type that declares the referenced member.
    pub parent: TypeRefOrDef,
    /// Name of the referenced member.
    pub name: String,
    /// Signature of the referenced member, as seen from this module.
    pub signature: MemberSignature,
}

/// A metadata image capable of hosting newly created definitions.
///
/// The module is the unit of handle validity: every [`TypeDefId`], [`FieldId`], and so on
/// is an index into one of its arenas. Definitions are appended and never removed, so a
/// handle stays valid for the lifetime of the module. Registration of clones into any
/// higher-level structural tables (exports, layouts, ...) is the caller's responsibility.
///
/// # Examples
///
/// ```rust
/// use cilgraft::metadata::{module::Module, typedef::{TypeAttributes, TypeDefinition}};
///
/// let mut module = Module::new("Library.dll");
/// let ty = module.define_type(TypeDefinition::new("My.Namespace", "Widget", TypeAttributes::PUBLIC));
/// assert_eq!(module.type_def(ty)?.name, "Widget");
/// # Ok::<(), cilgraft::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Module {
    /// Name of the module, used as the resolution scope of references into it.
    pub name: String,

    types: Vec<TypeDefinition>,
    fields: Vec<FieldDefinition>,
    methods: Vec<MethodDefinition>,
    type_refs: Vec<TypeReference>,
    member_refs: Vec<MemberReference>,
    signatures: Vec<LocalVariablesSignature>,
}

impl Module {
    /// Create an empty module with the given name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Append a new top-level type definition, returning its handle.
    ///
    /// The definition is hosted but not nested anywhere; use [`Module::add_nested_type`]
    /// to attach it under an enclosing type.
    pub fn define_type(&mut self, ty: TypeDefinition) -> TypeDefId {
        self.types.push(ty);
        TypeDefId(self.types.len() as u32 - 1)
    }

    /// Resolve a type definition handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if the handle is dangling.
    pub fn type_def(&self, id: TypeDefId) -> Result<&TypeDefinition> {
        self.types.get(id.index()).ok_or(crate::Error::TypeNotFound(id))
    }

    /// Resolve a type definition handle mutably.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if the handle is dangling.
    pub fn type_def_mut(&mut self, id: TypeDefId) -> Result<&mut TypeDefinition> {
        self.types
            .get_mut(id.index())
            .ok_or(crate::Error::TypeNotFound(id))
    }

    /// Resolve a field definition handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::FieldNotFound`] if the handle is dangling.
    pub fn field(&self, id: FieldId) -> Result<&FieldDefinition> {
        self.fields.get(id.index()).ok_or(crate::Error::FieldNotFound(id))
    }

    /// Resolve a method definition handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::MethodNotFound`] if the handle is dangling.
    pub fn method(&self, id: MethodId) -> Result<&MethodDefinition> {
        self.methods
            .get(id.index())
            .ok_or(crate::Error::MethodNotFound(id))
    }

    /// Resolve a method definition handle mutably.
    ///
    /// # Errors
    /// Returns [`crate::Error::MethodNotFound`] if the handle is dangling.
    pub fn method_mut(&mut self, id: MethodId) -> Result<&mut MethodDefinition> {
        self.methods
            .get_mut(id.index())
            .ok_or(crate::Error::MethodNotFound(id))
    }

    /// Resolve a type reference handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeRefNotFound`] if the handle is dangling.
    pub fn type_ref(&self, id: TypeRefId) -> Result<&TypeReference> {
        self.type_refs
            .get(id.index())
            .ok_or(crate::Error::TypeRefNotFound(id))
    }

    /// Resolve a member reference handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::MemberRefNotFound`] if the handle is dangling.
    pub fn member_ref(&self, id: MemberRefId) -> Result<&MemberReference> {
        self.member_refs
            .get(id.index())
            .ok_or(crate::Error::MemberRefNotFound(id))
    }

    /// Resolve a standalone signature handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::SignatureNotFound`] if the handle is dangling.
    pub fn signature(&self, id: SignatureId) -> Result<&LocalVariablesSignature> {
        self.signatures
            .get(id.index())
            .ok_or(crate::Error::SignatureNotFound(id))
    }

    /// Register a standalone local-variables signature, returning its handle.
    pub fn push_signature(&mut self, sig: LocalVariablesSignature) -> SignatureId {
        self.signatures.push(sig);
        SignatureId(self.signatures.len() as u32 - 1)
    }

    /// Attach an already-defined type as a nested type of `parent`, preserving
    /// declaration order.
    ///
    /// # Errors
    /// Returns an error if either handle is dangling, or if `child` is already nested.
    pub fn add_nested_type(&mut self, parent: TypeDefId, child: TypeDefId) -> Result<()> {
        if self.type_def(child)?.enclosing_type.is_some() {
            return Err(malformed_error!(
                "{} is already nested inside another type",
                child
            ));
        }

        self.type_def_mut(parent)?.nested_types.push(child);
        self.type_def_mut(child)?.enclosing_type = Some(parent);
        Ok(())
    }

    /// Append a field definition to `owner`, wiring the declaring-type back-link and
    /// preserving declaration order.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if `owner` is dangling.
    pub fn add_field(&mut self, owner: TypeDefId, mut field: FieldDefinition) -> Result<FieldId> {
        self.type_def(owner)?;

        field.declaring_type = Some(owner);
        self.fields.push(field);

        let id = FieldId(self.fields.len() as u32 - 1);
        self.type_def_mut(owner)?.fields.push(id);
        Ok(id)
    }

    /// Append a method definition to `owner`, wiring the declaring-type back-link and
    /// preserving declaration order.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if `owner` is dangling.
    pub fn add_method(
        &mut self,
        owner: TypeDefId,
        mut method: MethodDefinition,
    ) -> Result<MethodId> {
        self.type_def(owner)?;

        method.declaring_type = Some(owner);
        self.methods.push(method);

        let id = MethodId(self.methods.len() as u32 - 1);
        self.type_def_mut(owner)?.methods.push(id);
        Ok(id)
    }

    /// Find an identical type reference record, or create a minimal new one.
    pub fn get_or_add_type_ref(&mut self, record: TypeReference) -> TypeRefId {
        if let Some(pos) = self.type_refs.iter().position(|r| *r == record) {
            return TypeRefId(pos as u32);
        }

        self.type_refs.push(record);
        TypeRefId(self.type_refs.len() as u32 - 1)
    }

    /// Find an identical member reference record, or create a minimal new one.
    pub fn get_or_add_member_ref(&mut self, record: MemberReference) -> MemberRefId {
        if let Some(pos) = self.member_refs.iter().position(|r| *r == record) {
            return MemberRefId(pos as u32);
        }

        self.member_refs.push(record);
        MemberRefId(self.member_refs.len() as u32 - 1)
    }

    /// Number of type definitions hosted by this module.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of type reference records in this module.
    #[must_use]
    pub fn type_ref_count(&self) -> usize {
        self.type_refs.len()
    }

    /// Number of member reference records in this module.
    #[must_use]
    pub fn member_ref_count(&self) -> usize {
        self.member_refs.len()
    }
}
