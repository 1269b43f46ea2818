//! Rendering a [`BuilderPlan`] into Rust tokens with `quote`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Expr, Generics, Ident, Path, Type, WhereClause};

use crate::host::AccessorKind;
use crate::plan::{BuilderPlan, Construction, PlannedField};

/// First line of every generated file.
pub const HEADER: &str = "// @generated by buildergen. Do not edit.";

/// Render `plan` as the source text of one builder file.
///
/// # Errors
///
/// A message naming the part of the plan that is not valid Rust.
pub fn render_source(plan: &BuilderPlan) -> Result<String, String> {
    let tokens = render(plan)?;
    Ok(format!("{HEADER}\n{tokens}\n"))
}

/// Render `plan` as tokens.
///
/// # Errors
///
/// A message naming the part of the plan that is not valid Rust.
pub fn render(plan: &BuilderPlan) -> Result<TokenStream, String> {
    let parts = Parts::parse(plan)?;
    let Parts {
        unit,
        visibility,
        generics,
        target,
        fields,
    } = &parts;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let unit_name = &plan.unit;
    let target_name = &plan.target.name;
    let allow = allow();

    let slot_names: Vec<&Ident> = fields.iter().map(|field| &field.ident).collect();
    let slot_types: Vec<&Type> = fields.iter().map(|field| &field.slot).collect();
    let marker = (!generics.params.is_empty()).then(|| {
        quote! { __buildergen_target: ::core::marker::PhantomData<fn() -> #target #ty_generics>, }
    });
    let marker_init = marker
        .as_ref()
        .map(|_| quote! { __buildergen_target: ::core::marker::PhantomData, });

    let struct_doc = format!(" Builder for `{target_name}`.");
    let builder_struct = quote! {
        #[doc = #struct_doc]
        #allow
        #visibility struct #unit #generics #where_clause {
            #( #slot_names: #slot_types, )*
            #marker
        }
    };

    let initial_values = fields.iter().map(Field::initial_value);
    let setters = fields.iter().map(Field::setter);
    let checks = fields.iter().filter(|field| field.planned.required).map(|field| {
        let ident = &field.ident;
        let name = &field.planned.name;
        quote! {
            if self.#ident.is_none() {
                return ::core::result::Result::Err(::buildergen::BuildError::missing_field(#unit_name, #name));
            }
        }
    });
    let unpack = fields.iter().filter(|field| field.planned.required).map(|field| {
        let ident = &field.ident;
        let name = &field.planned.name;
        quote! {
            let #ident = #ident.ok_or_else(|| ::buildergen::BuildError::missing_field(#unit_name, #name))?;
        }
    });
    let rest = marker.as_ref().map(|_| quote! { .. });
    let construct = construction(plan, target, fields)?;

    let new_doc = format!(" A `{unit_name}` with only default values set.");
    let build_doc = format!(
        " Build the `{target_name}`.\n\n # Errors\n\n [`::buildergen::BuildError::MissingField`] naming the first required field that was not set."
    );
    let inherent = quote! {
        #allow
        impl #impl_generics #unit #ty_generics #where_clause {
            #[doc = #new_doc]
            #[must_use]
            pub fn new() -> Self {
                Self {
                    #( #slot_names: #initial_values, )*
                    #marker_init
                }
            }

            #( #setters )*

            fn check_required_fields(&self) -> ::core::result::Result<(), ::buildergen::BuildError> {
                #( #checks )*
                ::core::result::Result::Ok(())
            }

            #[doc = #build_doc]
            pub fn build(self) -> ::core::result::Result<#target #ty_generics, ::buildergen::BuildError> {
                self.check_required_fields()?;
                let Self { #( #slot_names, )* #rest } = self;
                #( #unpack )*
                ::core::result::Result::Ok(#construct)
            }
        }
    };

    let default_impl = quote! {
        #allow
        impl #impl_generics ::core::default::Default for #unit #ty_generics #where_clause {
            fn default() -> Self {
                Self::new()
            }
        }
    };

    let from_impl = copy_conversion(&parts, marker_init.as_ref())?;

    let entry_point = plan.entry_point.then(|| {
        let doc = format!(" Start building a `{target_name}`.");
        quote! {
            #allow
            impl #impl_generics #target #ty_generics #where_clause {
                #[doc = #doc]
                #[must_use]
                #visibility fn builder() -> #unit #ty_generics {
                    #unit::new()
                }
            }
        }
    });

    Ok(quote! {
        #builder_struct
        #inherent
        #default_impl
        #from_impl
        #entry_point
    })
}

/// The parsed pieces of a plan.
struct Parts<'p> {
    unit:       Ident,
    visibility: syn::Visibility,
    generics:   Generics,
    target:     Path,
    fields:     Vec<Field<'p>>,
}

/// One planned field with its tokens.
struct Field<'p> {
    planned: &'p PlannedField,
    ident:   Ident,
    /// The setter's parameter type: the descriptor itself.
    value:   Type,
    /// `Option` around the non-null type.
    slot:    Type,
    default: Option<Expr>,
}

impl<'p> Parts<'p> {
    fn parse(plan: &'p BuilderPlan) -> Result<Self, String> {
        let mut generics: Generics = match &plan.target.generics {
            Some(text) => parse(text, "generic parameters")?,
            None => Generics::default(),
        };
        if let Some(text) = &plan.target.where_clause {
            generics.where_clause = Some(parse::<WhereClause>(text, "where clause")?);
        }

        let fields = plan
            .fields
            .iter()
            .map(|planned| {
                Ok(Field {
                    planned,
                    ident: parse(&planned.name, "field name")?,
                    value: parse(&planned.descriptor.to_string(), "field type")?,
                    slot: parse(&planned.descriptor.as_nullable().to_string(), "field type")?,
                    default: planned
                        .default
                        .as_deref()
                        .map(|text| parse(text, "default value"))
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(Self {
            unit: parse(&plan.unit, "builder name")?,
            visibility: parse(plan.visibility.as_source(), "visibility")?,
            generics,
            target: parse(&plan.target.path, "target path")?,
            fields,
        })
    }
}

impl Field<'_> {
    fn initial_value(&self) -> TokenStream {
        match &self.default {
            Some(expr) if self.planned.descriptor.as_non_null().is_string_like() => {
                quote! { ::core::option::Option::Some(::core::convert::Into::into(#expr)) }
            },
            Some(expr) => quote! { ::core::option::Option::Some(#expr) },
            None => quote! { ::core::option::Option::None },
        }
    }

    fn setter(&self) -> TokenStream {
        let ident = &self.ident;
        let value = &self.value;
        let doc = format!(" Set `{}`.", self.planned.name);
        let assign = if self.planned.descriptor.nullable {
            quote! { self.#ident = value; }
        } else {
            quote! { self.#ident = ::core::option::Option::Some(value); }
        };
        quote! {
            #[doc = #doc]
            #[must_use]
            pub fn #ident(mut self, value: #value) -> Self {
                #assign
                self
            }
        }
    }
}

fn construction(plan: &BuilderPlan, target: &Path, fields: &[Field<'_>]) -> Result<TokenStream, String> {
    match &plan.construction {
        Construction::Literal => {
            let idents = fields.iter().map(|field| &field.ident);
            Ok(quote! { #target { #( #idents ),* } })
        },
        Construction::Constructor { name, arguments } => {
            let function: Ident = parse(name, "constructor name")?;
            let arguments = arguments
                .iter()
                .map(|argument| parse::<Ident>(argument, "constructor argument"))
                .collect::<Result<Vec<_>, String>>()?;
            Ok(quote! { #target::#function( #( #arguments ),* ) })
        },
    }
}

/// `impl From<Target> for Builder`.
///
/// Getters run before any field is moved out of the source.
fn copy_conversion(parts: &Parts<'_>, marker_init: Option<&TokenStream>) -> Result<TokenStream, String> {
    let Parts {
        unit,
        generics,
        target,
        fields,
        ..
    } = parts;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let allow = allow();

    let copied: Vec<&Field<'_>> = fields.iter().filter(|field| field.planned.copy.is_some()).collect();
    if copied.is_empty() {
        return Ok(quote! {
            #allow
            impl #impl_generics ::core::convert::From<#target #ty_generics> for #unit #ty_generics #where_clause {
                fn from(_source: #target #ty_generics) -> Self {
                    Self::new()
                }
            }
        });
    }

    let getters_first = copied
        .iter()
        .filter(|field| matches!(field.planned.copy, Some(AccessorKind::Getter(_))))
        .chain(copied.iter().filter(|field| matches!(field.planned.copy, Some(AccessorKind::Field))));
    let assignments = getters_first
        .map(|field| {
            let ident = &field.ident;
            let read = match &field.planned.copy {
                Some(AccessorKind::Getter(method)) => {
                    let method: Ident = parse(method, "getter name")?;
                    quote! { source.#method() }
                },
                _ => quote! { source.#ident },
            };
            Ok(if field.planned.descriptor.nullable {
                quote! { #ident: #read, }
            } else {
                quote! { #ident: ::core::option::Option::Some(#read), }
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    let rest = if copied.len() < fields.len() {
        Some(quote! { ..Self::new() })
    } else {
        marker_init.cloned()
    };

    Ok(quote! {
        #allow
        impl #impl_generics ::core::convert::From<#target #ty_generics> for #unit #ty_generics #where_clause {
            fn from(source: #target #ty_generics) -> Self {
                Self {
                    #( #assignments )*
                    #rest
                }
            }
        }
    })
}

fn allow() -> TokenStream {
    quote! {
        #[allow(dead_code, clippy::all, clippy::pedantic, clippy::nursery, reason = "generated builder")]
    }
}

fn parse<T: syn::parse::Parse>(text: &str, what: &str) -> Result<T, String> {
    syn::parse_str(text).map_err(|error| format!("invalid {what} `{text}`: {error}"))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::descriptor::TypeDescriptor;
    use crate::diagnostics::Location;
    use crate::host::{ModulePath, Visibility};
    use crate::plan::Target;

    fn plan(fields: Vec<PlannedField>, construction: Construction) -> BuilderPlan {
        BuilderPlan {
            unit: "PairBuilder".to_string(),
            target: Target {
                name:         "Pair".to_string(),
                path:         "Pair".to_string(),
                generics:     None,
                where_clause: None,
            },
            visibility: Visibility::Public,
            fields,
            construction,
            entry_point: true,
            module: ModulePath::default(),
            location: Location {
                file:   PathBuf::from("lib.rs"),
                line:   1,
                column: 1,
            },
        }
    }

    fn field(name: &str, descriptor: TypeDescriptor, copy: Option<AccessorKind>) -> PlannedField {
        PlannedField {
            name: name.to_string(),
            required: !descriptor.nullable,
            descriptor,
            default: None,
            copy,
        }
    }

    fn string() -> TypeDescriptor { TypeDescriptor::named("String", Vec::new()) }

    fn compact(tokens: &TokenStream) -> String { tokens.to_string().replace(' ', "") }

    fn rendered(plan: &BuilderPlan) -> String {
        match render(plan) {
            Ok(tokens) => compact(&tokens),
            Err(message) => message,
        }
    }

    #[test]
    fn nullable_fields_take_options_and_are_not_checked() {
        let plan = plan(
            vec![
                field("a", string(), Some(AccessorKind::Field)),
                field("b", string().as_nullable(), Some(AccessorKind::Field)),
            ],
            Construction::Literal,
        );
        let code = rendered(&plan);

        assert!(code.contains("pubstructPairBuilder{a:Option<String>,b:Option<String>,}"));
        assert!(code.contains("pubfna(mutself,value:String)->Self{self.a=::core::option::Option::Some(value);self}"));
        assert!(code.contains("pubfnb(mutself,value:Option<String>)->Self{self.b=value;self}"));
        assert!(code.contains("ifself.a.is_none()"));
        assert!(!code.contains("ifself.b.is_none()"));
        assert!(code.contains("::core::result::Result::Ok(Pair{a,b})"));
        assert!(code.contains("pubfnbuilder()->PairBuilder"));
    }

    #[test]
    fn constructor_call_is_positional() {
        let plan = plan(
            vec![field("a", string(), None), field("b", TypeDescriptor::primitive("u8"), None)],
            Construction::Constructor {
                name:      "new".to_string(),
                arguments: vec!["b".to_string(), "a".to_string()],
            },
        );
        let code = rendered(&plan);
        assert!(code.contains("::core::result::Result::Ok(Pair::new(b,a))"));
        assert!(code.contains("fnfrom(_source:Pair)->Self{Self::new()}"));
    }

    #[test]
    fn getters_are_read_before_fields_move() {
        let plan = plan(
            vec![
                field("a", string(), Some(AccessorKind::Field)),
                field("b", string(), Some(AccessorKind::Getter("get_b".to_string()))),
                field("c", string(), None),
            ],
            Construction::Literal,
        );
        let code = rendered(&plan);
        assert!(code.contains(
            "Self{b:::core::option::Option::Some(source.get_b()),a:::core::option::Option::Some(source.a),..Self::new()}"
        ));
    }

    #[test]
    fn string_defaults_convert_with_into() {
        let mut name = field("name", string(), None);
        name.default = Some("\"Anonymous\"".to_string());
        let mut count = field("count", TypeDescriptor::primitive("u32"), None);
        count.default = Some("42".to_string());
        let code = rendered(&plan(vec![name, count], Construction::Literal));

        assert!(code.contains("name:::core::option::Option::Some(::core::convert::Into::into(\"Anonymous\"))"));
        assert!(code.contains("count:::core::option::Option::Some(42)"));
    }

    #[test]
    fn generic_targets_carry_a_marker() {
        let mut generic = plan(
            vec![field("value", TypeDescriptor::named("T", Vec::new()), Some(AccessorKind::Field))],
            Construction::Literal,
        );
        generic.target.generics = Some("<T: Clone>".to_string());
        generic.target.where_clause = Some("where T: Default".to_string());
        let code = rendered(&generic);

        assert!(code.contains("pubstructPairBuilder<T:Clone>whereT:Default{value:Option<T>,__buildergen_target:::core::marker::PhantomData<fn()->Pair<T>>,}"));
        assert!(code.contains("impl<T:Clone>PairBuilder<T>whereT:Default"));
        assert!(code.contains("let Self{value,..}=self;".replace(' ', "").as_str()));
        assert!(code.contains("value:::core::option::Option::Some(source.value),__buildergen_target:::core::marker::PhantomData,"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let plan = plan(vec![field("a", string(), Some(AccessorKind::Field))], Construction::Literal);
        assert_eq!(render_source(&plan), render_source(&plan));
        assert!(render_source(&plan).is_ok_and(|source| source.starts_with(HEADER)));
    }

    #[test]
    fn invalid_pieces_are_reported() {
        let mut broken = plan(vec![field("a", TypeDescriptor::opaque("Vec<"), None)], Construction::Literal);
        broken.entry_point = false;
        assert!(render(&broken).is_err_and(|message| message.starts_with("invalid field type `Vec<`")));
    }
}
