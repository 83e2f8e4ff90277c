//! Reference importers.
//!
//! An importer translates members of one module into reference records valid in another.
//! [`ReferenceImporter`] is the baseline: every definition of the source module becomes a
//! minimal find-or-create reference record in the target, and existing reference records
//! are copied structurally. [`CloningReferenceImporter`] layers a [`CloneMap`] lookup on
//! top, composed by construction rather than by inheritance, so that during a clone
//! operation references into the cloned subtree resolve to the freshly created
//! definitions instead of pointing back at the source module.

use crate::{
    cloning::CloneMap,
    metadata::{
        module::{
            FieldRefOrDef, MemberRef, MemberRefId, MemberReference, MemberSignature,
            MethodRefOrDef, Module, ReferenceScope, SignatureId, TypeRefId, TypeRefOrDef,
            TypeReference,
        },
        signatures::{
            FieldSignature, LocalVariable, LocalVariablesSignature, MethodSignature,
            TypeSignature,
        },
    },
    Result,
};

/// Imports members of a source module into a target module as reference records.
///
/// The importer never copies definitions. A definition of the source module is imported
/// as a [`TypeReference`] or [`MemberReference`] whose resolution scope names the source
/// module, and identical records are deduplicated by the target (see
/// [`Module::get_or_add_type_ref`]). The importer holds the source immutably; the target
/// is passed per call so one importer can feed several targets.
///
/// # Examples
///
/// ```rust
/// use cilgraft::cloning::ReferenceImporter;
/// use cilgraft::metadata::module::{Module, TypeRefOrDef};
/// use cilgraft::metadata::typedef::{TypeAttributes, TypeDefinition};
///
/// let mut source = Module::new("lib.dll");
/// let ty = source.define_type(TypeDefinition::new("Lib", "Point", TypeAttributes::PUBLIC));
///
/// let mut target = Module::new("app.dll");
/// let imported = ReferenceImporter::new(&source).import_type(&mut target, &TypeRefOrDef::Def(ty))?;
///
/// assert!(matches!(imported, TypeRefOrDef::Ref(_)));
/// assert_eq!(target.type_ref_count(), 1);
/// # Ok::<(), cilgraft::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ReferenceImporter<'a> {
    source: &'a Module,
}

impl<'a> ReferenceImporter<'a> {
    /// Create an importer reading from `source`.
    #[must_use]
    pub fn new(source: &'a Module) -> Self {
        ReferenceImporter { source }
    }

    /// Import a type into `target`.
    ///
    /// A definition becomes a reference record scoped to the source module, or to the
    /// imported enclosing type for nested definitions. A reference record is copied
    /// structurally, including its scope chain.
    ///
    /// # Errors
    /// Returns an error if a handle does not resolve in the source module.
    pub fn import_type(&self, target: &mut Module, ty: &TypeRefOrDef) -> Result<TypeRefOrDef> {
        match *ty {
            TypeRefOrDef::Def(id) => {
                let src = self.source.type_def(id)?;

                let scope = match src.enclosing_type() {
                    Some(parent) => {
                        match self.import_type(target, &TypeRefOrDef::Def(parent))? {
                            TypeRefOrDef::Ref(parent_ref) => ReferenceScope::Nested(parent_ref),
                            TypeRefOrDef::Def(local) => {
                                return Err(malformed_error!(
                                    "Enclosing type of {} imported as local definition {}",
                                    id,
                                    local
                                ))
                            }
                        }
                    }
                    None => ReferenceScope::Module(self.source.name.clone()),
                };

                Ok(TypeRefOrDef::Ref(target.get_or_add_type_ref(TypeReference {
                    scope,
                    namespace: src.namespace.clone(),
                    name: src.name.clone(),
                })))
            }
            TypeRefOrDef::Ref(id) => Ok(TypeRefOrDef::Ref(self.copy_type_ref(target, id)?)),
        }
    }

    /// Import a method into `target`.
    ///
    /// # Errors
    /// Returns an error if a handle does not resolve in the source module, if a
    /// definition is not attached to a declaring type, or if a reference record turns
    /// out not to describe a method.
    pub fn import_method(
        &self,
        target: &mut Module,
        method: &MethodRefOrDef,
    ) -> Result<MethodRefOrDef> {
        match *method {
            MethodRefOrDef::Def(id) => {
                let src = self.source.method(id)?;
                let Some(declaring) = src.declaring_type() else {
                    return Err(malformed_error!("Cannot import detached method {}", id));
                };

                let parent = self.import_type(target, &TypeRefOrDef::Def(declaring))?;
                let signature = self.import_method_signature(target, &src.signature)?;

                Ok(MethodRefOrDef::Ref(target.get_or_add_member_ref(
                    MemberReference {
                        parent,
                        name: src.name.clone(),
                        signature: MemberSignature::Method(signature),
                    },
                )))
            }
            MethodRefOrDef::Ref(id) => {
                let record = self.source.member_ref(id)?;
                if !matches!(record.signature, MemberSignature::Method(_)) {
                    return Err(malformed_error!(
                        "Member reference {} does not describe a method",
                        id
                    ));
                }
                Ok(MethodRefOrDef::Ref(self.copy_member_ref(target, id)?))
            }
        }
    }

    /// Import a field into `target`.
    ///
    /// # Errors
    /// Returns an error if a handle does not resolve in the source module, if a
    /// definition is not attached to a declaring type, or if a reference record turns
    /// out not to describe a field.
    pub fn import_field(
        &self,
        target: &mut Module,
        field: &FieldRefOrDef,
    ) -> Result<FieldRefOrDef> {
        match *field {
            FieldRefOrDef::Def(id) => {
                let src = self.source.field(id)?;
                let Some(declaring) = src.declaring_type() else {
                    return Err(malformed_error!("Cannot import detached field {}", id));
                };

                let parent = self.import_type(target, &TypeRefOrDef::Def(declaring))?;
                let signature = self.import_field_signature(target, &src.signature)?;

                Ok(FieldRefOrDef::Ref(target.get_or_add_member_ref(
                    MemberReference {
                        parent,
                        name: src.name.clone(),
                        signature: MemberSignature::Field(signature),
                    },
                )))
            }
            FieldRefOrDef::Ref(id) => {
                let record = self.source.member_ref(id)?;
                if !matches!(record.signature, MemberSignature::Field(_)) {
                    return Err(malformed_error!(
                        "Member reference {} does not describe a field",
                        id
                    ));
                }
                Ok(FieldRefOrDef::Ref(self.copy_member_ref(target, id)?))
            }
        }
    }

    /// Import a member reference of any kind, dispatching on its variant.
    ///
    /// # Errors
    /// Propagates the errors of the kind-specific import.
    pub fn import_reference(&self, target: &mut Module, member: &MemberRef) -> Result<MemberRef> {
        Ok(match member {
            MemberRef::Type(ty) => MemberRef::Type(self.import_type(target, ty)?),
            MemberRef::Method(m) => MemberRef::Method(self.import_method(target, m)?),
            MemberRef::Field(f) => MemberRef::Field(self.import_field(target, f)?),
        })
    }

    /// Import a type signature, rewriting every embedded type reference.
    ///
    /// # Errors
    /// Propagates errors from importing embedded types.
    pub fn import_type_signature(
        &self,
        target: &mut Module,
        sig: &TypeSignature,
    ) -> Result<TypeSignature> {
        Ok(match sig {
            TypeSignature::Class(ty) => TypeSignature::Class(self.import_type(target, ty)?),
            TypeSignature::ValueType(ty) => {
                TypeSignature::ValueType(self.import_type(target, ty)?)
            }
            TypeSignature::SzArray(element) => {
                TypeSignature::SzArray(Box::new(self.import_type_signature(target, element)?))
            }
            TypeSignature::ByRef(inner) => {
                TypeSignature::ByRef(Box::new(self.import_type_signature(target, inner)?))
            }
            primitive => primitive.clone(),
        })
    }

    /// Import a method signature, rewriting the return type and every parameter type.
    ///
    /// # Errors
    /// Propagates errors from importing embedded types.
    pub fn import_method_signature(
        &self,
        target: &mut Module,
        sig: &MethodSignature,
    ) -> Result<MethodSignature> {
        let return_type = self.import_type_signature(target, &sig.return_type)?;
        let params = sig
            .params
            .iter()
            .map(|p| self.import_type_signature(target, p))
            .collect::<Result<Vec<_>>>()?;

        Ok(MethodSignature::new(sig.has_this, return_type, params))
    }

    /// Import a field signature.
    ///
    /// # Errors
    /// Propagates errors from importing embedded types.
    pub fn import_field_signature(
        &self,
        target: &mut Module,
        sig: &FieldSignature,
    ) -> Result<FieldSignature> {
        Ok(FieldSignature::new(
            self.import_type_signature(target, &sig.field_type)?,
        ))
    }

    /// Import a standalone local-variables signature, registering the rewritten copy in
    /// the target and returning its new handle.
    ///
    /// # Errors
    /// Returns an error if the handle does not resolve in the source module.
    pub fn import_standalone_signature(
        &self,
        target: &mut Module,
        id: SignatureId,
    ) -> Result<SignatureId> {
        let src = self.source.signature(id)?;
        let locals = src
            .locals
            .iter()
            .map(|local| {
                Ok(LocalVariable {
                    is_pinned: local.is_pinned,
                    is_byref: local.is_byref,
                    var_type: self.import_type_signature(target, &local.var_type)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(target.push_signature(LocalVariablesSignature { locals }))
    }

    fn copy_type_ref(&self, target: &mut Module, id: TypeRefId) -> Result<TypeRefId> {
        let record = self.source.type_ref(id)?;
        let scope = match &record.scope {
            ReferenceScope::Module(name) => ReferenceScope::Module(name.clone()),
            ReferenceScope::Nested(parent) => {
                ReferenceScope::Nested(self.copy_type_ref(target, *parent)?)
            }
        };

        let (namespace, name) = (record.namespace.clone(), record.name.clone());
        Ok(target.get_or_add_type_ref(TypeReference {
            scope,
            namespace,
            name,
        }))
    }

    fn copy_member_ref(&self, target: &mut Module, id: MemberRefId) -> Result<MemberRefId> {
        let record = self.source.member_ref(id)?;
        let parent = self.import_type(target, &record.parent)?;
        let signature = match &record.signature {
            MemberSignature::Method(sig) => {
                MemberSignature::Method(self.import_method_signature(target, sig)?)
            }
            MemberSignature::Field(sig) => {
                MemberSignature::Field(self.import_field_signature(target, sig)?)
            }
        };

        Ok(target.get_or_add_member_ref(MemberReference {
            parent,
            name: record.name.clone(),
            signature,
        }))
    }
}

/// A [`ReferenceImporter`] that resolves members of a cloned subtree to their clones.
///
/// Exactly one specialization point exists: when a *definition* of the source module is
/// imported, the clone map is consulted first, and a hit yields the registered clone as
/// a local definition instead of a cross-module reference. On a miss the call falls
/// through to the baseline. Signature imports never participate in clone substitution
/// and always delegate unchanged.
#[derive(Debug, Clone, Copy)]
pub struct CloningReferenceImporter<'a> {
    base: ReferenceImporter<'a>,
    clones: &'a CloneMap,
}

impl<'a> CloningReferenceImporter<'a> {
    /// Create an importer reading from `source` and substituting through `clones`.
    #[must_use]
    pub fn new(source: &'a Module, clones: &'a CloneMap) -> Self {
        CloningReferenceImporter {
            base: ReferenceImporter::new(source),
            clones,
        }
    }

    /// Import a type, resolving cloned definitions to their clones.
    ///
    /// # Errors
    /// Propagates the baseline import errors.
    pub fn import_type(&self, target: &mut Module, ty: &TypeRefOrDef) -> Result<TypeRefOrDef> {
        if let TypeRefOrDef::Def(id) = ty {
            if let Some(clone) = self.clones.type_clone(*id) {
                return Ok(TypeRefOrDef::Def(clone));
            }
        }
        self.base.import_type(target, ty)
    }

    /// Import a method, resolving cloned definitions to their clones.
    ///
    /// # Errors
    /// Propagates the baseline import errors.
    pub fn import_method(
        &self,
        target: &mut Module,
        method: &MethodRefOrDef,
    ) -> Result<MethodRefOrDef> {
        if let MethodRefOrDef::Def(id) = method {
            if let Some(clone) = self.clones.method_clone(*id) {
                return Ok(MethodRefOrDef::Def(clone));
            }
        }
        self.base.import_method(target, method)
    }

    /// Import a field, resolving cloned definitions to their clones.
    ///
    /// # Errors
    /// Propagates the baseline import errors.
    pub fn import_field(
        &self,
        target: &mut Module,
        field: &FieldRefOrDef,
    ) -> Result<FieldRefOrDef> {
        if let FieldRefOrDef::Def(id) = field {
            if let Some(clone) = self.clones.field_clone(*id) {
                return Ok(FieldRefOrDef::Def(clone));
            }
        }
        self.base.import_field(target, field)
    }

    /// Import a member reference of any kind, with clone substitution per kind.
    ///
    /// # Errors
    /// Propagates the baseline import errors.
    pub fn import_reference(&self, target: &mut Module, member: &MemberRef) -> Result<MemberRef> {
        Ok(match member {
            MemberRef::Type(ty) => MemberRef::Type(self.import_type(target, ty)?),
            MemberRef::Method(m) => MemberRef::Method(self.import_method(target, m)?),
            MemberRef::Field(f) => MemberRef::Field(self.import_field(target, f)?),
        })
    }

    /// Import a method signature. Delegates to the baseline; signatures do not
    /// participate in clone substitution.
    ///
    /// # Errors
    /// Propagates the baseline import errors.
    pub fn import_method_signature(
        &self,
        target: &mut Module,
        sig: &MethodSignature,
    ) -> Result<MethodSignature> {
        self.base.import_method_signature(target, sig)
    }

    /// Import a field signature. Delegates to the baseline.
    ///
    /// # Errors
    /// Propagates the baseline import errors.
    pub fn import_field_signature(
        &self,
        target: &mut Module,
        sig: &FieldSignature,
    ) -> Result<FieldSignature> {
        self.base.import_field_signature(target, sig)
    }

    /// Import a standalone local-variables signature. Delegates to the baseline.
    ///
    /// # Errors
    /// Propagates the baseline import errors.
    pub fn import_standalone_signature(
        &self,
        target: &mut Module,
        id: SignatureId,
    ) -> Result<SignatureId> {
        self.base.import_standalone_signature(target, id)
    }
}
