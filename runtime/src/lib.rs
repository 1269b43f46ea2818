//! Builders generated at compile time.
//!
//! Mark a struct with `#[derive(Builder)]` (or `#[buildergen::builder]`), an
//! associated constructor with `#[buildergen::builder]`, or a marker struct
//! with `#[buildergen::builder_of(target = path::To::Type)]`, and call
//! `buildergen_codegen::generate()` from the crate's build script:
//!
//! ```ignore
//! #[derive(buildergen::Builder)]
//! pub struct Pair {
//!     pub a: String,
//!     pub b: Option<String>,
//! }
//!
//! let pair = Pair::builder().a("x".to_string()).build()?;
//! assert_eq!(pair.b, None);
//!
//! let copy = PairBuilder::from(pair).b(Some("y".to_string())).build()?;
//! ```
//!
//! Fields whose type is not an `Option` are required: `build()` reports the
//! first one left unset as a [`BuildError`].

use thiserror::Error;

pub use buildergen_macros::{Builder, builder, builder_of, constructor};

/// Failure of a generated `build()`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildError {
    /// A required field was never set.
    #[error("{builder}: required field `{field}` was not set")]
    MissingField {
        /// Name of the builder type.
        builder: &'static str,
        /// Name of the field.
        field:   &'static str,
    },
}

impl BuildError {
    /// A [`BuildError::MissingField`] for `field` of `builder`.
    #[must_use]
    pub const fn missing_field(builder: &'static str, field: &'static str) -> Self { Self::MissingField { builder, field } }

    /// Name of the field that was not set.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field, .. } => *field,
        }
    }
}

/// Include the generated builder `$unit` in the current module.
///
/// The attribute macros expand to this; write it by hand next to the target
/// type when the directive sits on an associated constructor, since an
/// attribute inside an `impl` block cannot add items outside it.
///
/// ```ignore
/// impl Account {
///     #[buildergen::builder]
///     pub fn open(owner: String, id: u64) -> Self { todo!() }
/// }
///
/// buildergen::include_builder!(AccountBuilder);
/// ```
#[macro_export]
macro_rules! include_builder {
    ($unit:ident) => {
        include!(concat!(env!("OUT_DIR"), "/buildergen/", stringify!($unit), ".rs"));
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_builder_and_field() {
        let error = BuildError::missing_field("PairBuilder", "a");
        assert_eq!(error.to_string(), "PairBuilder: required field `a` was not set");
        assert_eq!(error.field(), "a");
    }
}
