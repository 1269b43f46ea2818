//! Turning a declared type and its modifiers into a [`TypeDescriptor`].

use crate::descriptor::TypeDescriptor;
use crate::diagnostics::{Diagnostics, Location};
use crate::host::{Modifiers, TypeRef};
use crate::resolve::is_nullable;

/// Describe `ty` with `modifiers` applied.
///
/// A modifier that does not fit the type is reported against `location` and
/// skipped; the remaining rewrites still apply.
pub fn describe(ty: &TypeRef, modifiers: &Modifiers, location: &Location, diagnostics: &mut Diagnostics) -> TypeDescriptor {
    let mut descriptor = canonical(ty);

    if modifiers.nullable_element {
        match descriptor.with_nullable_element() {
            Ok(rewritten) => descriptor = rewritten,
            Err(error) => diagnostics.error(error.to_string(), location.clone()),
        }
    }

    if modifiers.mutable_collection {
        match descriptor.as_mutable_collection() {
            Ok(rewritten) => descriptor = rewritten,
            Err(error) => diagnostics.error(error.to_string(), location.clone()),
        }
    }

    descriptor
}

/// The canonical descriptor of `ty`, before any modifier.
///
/// `Option<T>` becomes the nullable descriptor of `T`; an `Option` nested
/// directly inside it stays a named type.
#[must_use]
pub fn canonical(ty: &TypeRef) -> TypeDescriptor {
    match ty {
        TypeRef::Path { path, args } if is_nullable(ty) => {
            args.first()
                .map_or_else(|| TypeDescriptor::named(path.clone(), Vec::new()), structural)
                .as_nullable()
        },
        _ => structural(ty),
    }
}

fn structural(ty: &TypeRef) -> TypeDescriptor {
    match ty {
        TypeRef::Primitive(name) => TypeDescriptor::primitive(name.clone()),
        TypeRef::Array { element, len } => TypeDescriptor::array(canonical(element), len.clone()),
        TypeRef::Slice(element) => TypeDescriptor::slice(canonical(element)),
        TypeRef::Path { path, args } => TypeDescriptor::named(path.clone(), args.iter().map(canonical).collect()),
        TypeRef::Reference {
            lifetime,
            mutable,
            referent,
        } => TypeDescriptor::reference(lifetime.as_deref(), *mutable, canonical(referent)),
        TypeRef::Lifetime(name) => TypeDescriptor::lifetime(name.clone()),
        TypeRef::ImplTrait(text) | TypeRef::Opaque(text) => TypeDescriptor::opaque(text.clone()),
    }
}
