//! `#[builder_of(..)]` on marker items

use proc_macro::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::parse::Parser;
use syn::{LitBool, LitStr, Path};

use crate::shared::{DEFAULT_SUFFIX, include, unit_name};

/// Arguments of a `builder_of` attribute.
#[derive(Default)]
struct Arguments {
    target: Option<Path>,
    suffix: Option<LitStr>,
}

impl Arguments {
    fn parse(&mut self, meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("target") {
            self.target = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("suffix") {
            self.suffix = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("use_constructors") {
            // Only the build-script pass needs the value.
            let _: LitBool = meta.value()?.parse()?;
            Ok(())
        } else {
            Err(meta.error("unknown builder_of argument"))
        }
    }
}

/// Passes the marker item through and includes the builder named after the target.
pub fn builder_of_impl(args: TokenStream, item: TokenStream) -> TokenStream {
    let item = proc_macro2::TokenStream::from(item);

    let mut arguments = Arguments::default();
    let parser = syn::meta::parser(|meta| arguments.parse(&meta));
    if let Err(error) = parser.parse(args) {
        let error = error.to_compile_error();
        return quote! { #item #error }.into();
    }

    let Some(target) = arguments.target else {
        let error = syn::Error::new(
            proc_macro2::Span::call_site(),
            "builder_of requires `target = path::to::Type`",
        )
        .to_compile_error();
        return quote! { #item #error }.into();
    };
    let Some(last) = target.segments.last() else {
        return quote! { #item }.into();
    };

    let suffix = arguments
        .suffix
        .as_ref()
        .map_or_else(|| DEFAULT_SUFFIX.to_string(), LitStr::value);
    let included = match unit_name(&last.ident, &suffix) {
        Ok(unit) => include(&unit),
        Err(error) => error.to_compile_error(),
    };
    quote! { #item #included }.into()
}
