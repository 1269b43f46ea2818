//! Procedural macros for buildergen
//!
//! The macros mark directives and include the builders that the
//! `buildergen_codegen` build-script pass writes to `$OUT_DIR`. They do not
//! synthesize anything themselves.

mod builder;
mod builder_of;
mod shared;

use proc_macro::TokenStream;

/// Requests a builder for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// #[derive(buildergen::Builder)]
/// pub struct Settings {
///     #[builder(default = "localhost")]
///     pub host: String,
///     pub port: Option<u16>,
/// }
/// ```
///
/// This includes the generated `SettingsBuilder` and `Settings::builder()`.
/// A default on an `Option` field may be written as `"3"` or `"Some(3)"`.
#[proc_macro_derive(Builder, attributes(builder))]
pub fn derive_builder(input: TokenStream) -> TokenStream { builder::derive_builder_impl(input) }

/// Requests a builder for a struct, or for the associated constructor it sits on.
///
/// On a struct this behaves like `#[derive(Builder)]`. On an associated
/// function the builder is named after the `Self` type; include it next to
/// the type with `buildergen::include_builder!(TypeBuilder)`.
///
/// # Example
///
/// ```ignore
/// impl Account {
///     #[buildergen::builder]
///     pub fn open(owner: String, #[builder(default = "0")] id: u64) -> Self { .. }
/// }
///
/// buildergen::include_builder!(AccountBuilder);
/// ```
#[proc_macro_attribute]
pub fn builder(args: TokenStream, item: TokenStream) -> TokenStream { builder::builder_impl(args, item) }

/// Requests a builder for a type declared elsewhere, from a marker item.
///
/// Arguments:
/// - `target = path::to::Type` (required)
/// - `suffix = "Maker"`, appended to the type name (default `"Builder"`)
/// - `use_constructors = true`, to take fields from the type's first
///   accessible constructor instead of its eligible fields
///
/// # Example
///
/// ```ignore
/// #[buildergen::builder_of(target = crate::pair::Pair, suffix = "Maker")]
/// pub struct ForPair;
/// ```
#[proc_macro_attribute]
pub fn builder_of(args: TokenStream, item: TokenStream) -> TokenStream { builder_of::builder_of_impl(args, item) }

/// Lets an associated constructor carry `#[builder(..)]` modifiers on its parameters.
///
/// The modifiers apply to the like-named fields of builders for the `Self`
/// type. This attribute only removes them so the function compiles.
#[proc_macro_attribute]
pub fn constructor(args: TokenStream, item: TokenStream) -> TokenStream { builder::constructor_impl(args, item) }
