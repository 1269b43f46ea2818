//! `#[derive(Builder)]`, `#[builder]` and `#[constructor]`

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Item, parse_macro_input};

use crate::shared::{DEFAULT_SUFFIX, include, strip_field_modifiers, strip_parameter_modifiers, unit_name};

/// Includes `<Name>Builder` for a struct with named fields.
pub fn derive_builder_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let Data::Struct(data) = &input.data else {
        return misplaced(&input.ident, "an enum or union");
    };
    if !matches!(data.fields, Fields::Named(_)) {
        return misplaced(&input.ident, "a struct without named fields");
    }

    match unit_name(&input.ident, DEFAULT_SUFFIX) {
        Ok(unit) => include(&unit).into(),
        Err(error) => error.to_compile_error().into(),
    }
}

/// Struct: strip field modifiers and include the builder.
/// Associated function: strip parameter modifiers; the user includes the builder.
pub fn builder_impl(args: TokenStream, item: TokenStream) -> TokenStream {
    if !args.is_empty() {
        let args = proc_macro2::TokenStream::from(args);
        return syn::Error::new_spanned(args, "`builder` takes no arguments")
            .to_compile_error()
            .into();
    }

    match parse_macro_input!(item as Item) {
        Item::Struct(mut item) => {
            let named = matches!(item.fields, Fields::Named(_));
            strip_field_modifiers(&mut item.fields);
            if !named {
                let error = syn::Error::new(
                    item.ident.span(),
                    "builder directives belong on structs with named fields or on associated constructors",
                )
                .to_compile_error();
                return quote! { #item #error }.into();
            }
            let included = match unit_name(&item.ident, DEFAULT_SUFFIX) {
                Ok(unit) => include(&unit),
                Err(error) => error.to_compile_error(),
            };
            quote! { #item #included }.into()
        },
        Item::Fn(mut item) => {
            strip_parameter_modifiers(&mut item.sig);
            quote! { #item }.into()
        },
        item => {
            let error = syn::Error::new_spanned(
                &item,
                "builder directives belong on structs with named fields or on associated constructors",
            )
            .to_compile_error();
            quote! { #item #error }.into()
        },
    }
}

/// Strip parameter modifiers from a constructor that is not itself a directive.
pub fn constructor_impl(args: TokenStream, item: TokenStream) -> TokenStream {
    if !args.is_empty() {
        let args = proc_macro2::TokenStream::from(args);
        return syn::Error::new_spanned(args, "`constructor` takes no arguments")
            .to_compile_error()
            .into();
    }

    let mut item = parse_macro_input!(item as syn::ImplItemFn);
    strip_parameter_modifiers(&mut item.sig);
    quote! { #item }.into()
}

fn misplaced(ident: &syn::Ident, what: &str) -> TokenStream {
    syn::Error::new(
        ident.span(),
        format!("builder directives belong on structs with named fields or on associated constructors, not on {what}"),
    )
    .to_compile_error()
    .into()
}
