//! Lowering of `syn` types into [`TypeRef`]s.

use quote::ToTokens;
use syn::{GenericArgument, PathArguments, Type};

use super::TypeRef;

const PRIMITIVES: [&str; 17] = [
    "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128", "isize",
    "f32", "f64",
];

/// Lower a parsed type into the host's type reference model.
pub(super) fn lower(ty: &Type) -> TypeRef {
    match ty {
        Type::Group(group) => lower(&group.elem),
        Type::Array(array) => TypeRef::Array {
            element: Box::new(lower(&array.elem)),
            len:     array.len.to_token_stream().to_string(),
        },
        Type::Slice(slice) => TypeRef::Slice(Box::new(lower(&slice.elem))),
        Type::Reference(reference) => TypeRef::Reference {
            lifetime: reference.lifetime.as_ref().map(ToString::to_string),
            mutable:  reference.mutability.is_some(),
            referent: Box::new(lower(&reference.elem)),
        },
        Type::ImplTrait(_) => TypeRef::ImplTrait(source_text(ty)),
        Type::Path(path) if path.qself.is_none() => lower_path(&path.path).unwrap_or_else(|| TypeRef::Opaque(source_text(ty))),
        _ => TypeRef::Opaque(source_text(ty)),
    }
}

/// Lower a path whose generic arguments, if any, sit on the final segment.
fn lower_path(path: &syn::Path) -> Option<TypeRef> {
    let segments: Vec<_> = path.segments.iter().collect();
    let (last, leading) = segments.split_last()?;
    if leading.iter().any(|segment| !segment.arguments.is_none()) {
        return None;
    }

    let name = path
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::");
    let name = if path.leading_colon.is_some() {
        format!("::{name}")
    } else {
        name
    };

    match &last.arguments {
        PathArguments::None if path.segments.len() == 1 && PRIMITIVES.contains(&name.as_str()) => {
            Some(TypeRef::Primitive(name))
        },
        PathArguments::None => Some(TypeRef::path(name)),
        PathArguments::AngleBracketed(arguments) => {
            let args = arguments
                .args
                .iter()
                .map(|argument| match argument {
                    GenericArgument::Type(ty) => Some(lower(ty)),
                    GenericArgument::Lifetime(lifetime) => Some(TypeRef::Lifetime(lifetime.to_string())),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            Some(TypeRef::generic(name, args))
        },
        PathArguments::Parenthesized(_) => None,
    }
}

fn source_text(tokens: &impl ToTokens) -> String { tokens.to_token_stream().to_string() }
