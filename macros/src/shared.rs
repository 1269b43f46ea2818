//! Helpers shared by the directive macros

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Fields, FnArg, Ident, Signature};

/// Suffix used when `builder_of` does not name one.
pub const DEFAULT_SUFFIX: &str = "Builder";

/// `::buildergen::include_builder!(#unit);`
pub fn include(unit: &Ident) -> TokenStream {
    quote! {
        ::buildergen::include_builder!(#unit);
    }
}

/// Whether `attr` is a `#[builder(..)]` modifier.
pub fn is_modifier(attr: &Attribute) -> bool { attr.path().is_ident("builder") }

/// Remove `#[builder(..)]` modifiers from struct fields.
pub fn strip_field_modifiers(fields: &mut Fields) {
    for field in fields.iter_mut() {
        field.attrs.retain(|attr| !is_modifier(attr));
    }
}

/// Remove `#[builder(..)]` modifiers from function parameters.
pub fn strip_parameter_modifiers(sig: &mut Signature) {
    for input in &mut sig.inputs {
        if let FnArg::Typed(parameter) = input {
            parameter.attrs.retain(|attr| !is_modifier(attr));
        }
    }
}

/// The builder name for `target` with `suffix`.
pub fn unit_name(target: &Ident, suffix: &str) -> syn::Result<Ident> {
    let unit = format!("{target}{suffix}");
    syn::parse_str::<Ident>(&unit)
        .map(|mut ident| {
            ident.set_span(target.span());
            ident
        })
        .map_err(|_| syn::Error::new(target.span(), format!("`{unit}` is not a valid builder name")))
}
