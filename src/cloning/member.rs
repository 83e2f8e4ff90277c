//! The three-phase member cloner.

use crate::{
    cloning::{BodyCloner, CloneMap, CloningReferenceImporter, ReferenceImporter},
    metadata::{
        member::{FieldDefinition, MethodDefinition},
        module::{Module, TypeDefId},
        typedef::TypeDefinition,
    },
    Result,
};

/// Clones a type-definition subtree from a source module into a target module.
///
/// The cloned subtree is fully independent of the source: fresh definitions, fresh
/// instruction ids, and every intra-subtree reference rewritten to point at the clones.
/// References leaving the subtree become ordinary cross-module reference records scoped
/// to the source module. The source is never mutated.
///
/// Cloning runs in three phases over the subtree, because a member of the subtree may
/// reference a sibling that has not been cloned yet, or the subtree itself:
///
/// 1. *Stubs* - empty type definitions for the root and all nested types, each
///    registered in the identity map before its children are visited
/// 2. *Declaration* - fields and bodiless method stubs, signatures imported, constants
///    and parameter records copied by value, again registered as created
/// 3. *Finalization* - base-type references resolved through the clone-aware importer
///    and method bodies cloned, now that every subtree member has a registered clone
///
/// A cloner is scoped to exactly one operation: [`MemberCloner::clone_type`] consumes
/// it together with its identity map. On failure the operation aborts; definitions
/// already appended to the target stay behind as unreferenced garbage for the caller to
/// discard, there is no rollback.
#[derive(Debug)]
pub struct MemberCloner<'a> {
    source: &'a Module,
    target: &'a mut Module,
    map: CloneMap,
}

impl<'a> MemberCloner<'a> {
    /// Create a cloner copying out of `source` into `target`.
    #[must_use]
    pub fn new(source: &'a Module, target: &'a mut Module) -> Self {
        MemberCloner {
            source,
            target,
            map: CloneMap::new(),
        }
    }

    /// Clone the subtree rooted at `root` into the target module, returning the handle
    /// of the cloned root type.
    ///
    /// # Errors
    /// Returns an error if any handle of the subtree does not resolve in the source
    /// module, or if any reference import fails.
    pub fn clone_type(mut self, root: TypeDefId) -> Result<TypeDefId> {
        let clone = self.create_stubs(root)?;
        self.declare_members(root)?;
        self.finalize_type(root)?;
        Ok(clone)
    }

    fn create_stubs(&mut self, ty: TypeDefId) -> Result<TypeDefId> {
        let src = self.source.type_def(ty)?;

        let clone = self.target.define_type(TypeDefinition::new(
            &src.namespace,
            &src.name,
            src.flags,
        ));
        // Registered before descending, so children referencing the parent hit the map.
        self.map.insert_type(ty, clone);

        for &child in src.nested_types() {
            let child_clone = self.create_stubs(child)?;
            self.target.add_nested_type(clone, child_clone)?;
        }
        Ok(clone)
    }

    fn declare_members(&mut self, ty: TypeDefId) -> Result<()> {
        let src = self.source.type_def(ty)?;
        let clone = self.clone_of(ty)?;

        for &field in src.fields() {
            let original = self.source.field(field)?;
            let signature = ReferenceImporter::new(self.source)
                .import_field_signature(self.target, &original.signature)?;

            let mut def = FieldDefinition::new(&original.name, original.flags, signature);
            def.constant = original.constant.clone();

            let id = self.target.add_field(clone, def)?;
            self.map.insert_field(field, id);
        }

        for &method in src.methods() {
            let original = self.source.method(method)?;
            let signature = ReferenceImporter::new(self.source)
                .import_method_signature(self.target, &original.signature)?;

            let mut def = MethodDefinition::new(&original.name, original.flags, signature);
            def.parameters = original.parameters.clone();

            let id = self.target.add_method(clone, def)?;
            self.map.insert_method(method, id);
        }

        for &child in src.nested_types() {
            self.declare_members(child)?;
        }
        Ok(())
    }

    fn finalize_type(&mut self, ty: TypeDefId) -> Result<()> {
        let src = self.source.type_def(ty)?;
        let clone = self.clone_of(ty)?;

        if let Some(base) = &src.base_type {
            let imported = CloningReferenceImporter::new(self.source, &self.map)
                .import_type(self.target, base)?;
            self.target.type_def_mut(clone)?.base_type = Some(imported);
        }

        for &method in src.methods() {
            let original = self.source.method(method)?;
            let Some(body) = &original.body else {
                continue;
            };

            let cloned = BodyCloner::new(self.source, &self.map).clone_body(self.target, body)?;

            let Some(clone_method) = self.map.method_clone(method) else {
                return Err(malformed_error!("No clone registered for {}", method));
            };
            self.target.method_mut(clone_method)?.body = Some(cloned);
        }

        for &child in src.nested_types() {
            self.finalize_type(child)?;
        }
        Ok(())
    }

    fn clone_of(&self, ty: TypeDefId) -> Result<TypeDefId> {
        self.map
            .type_clone(ty)
            .ok_or_else(|| malformed_error!("No clone registered for {}", ty))
    }
}
