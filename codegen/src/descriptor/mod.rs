//! Type descriptors: the builder's view of a field's target type.
//!
//! A [`TypeDescriptor`] is a plain value. The two modifier rewrites,
//! [`TypeDescriptor::with_nullable_element`] and
//! [`TypeDescriptor::as_mutable_collection`], return new descriptors and never
//! touch the one they were called on. [`fmt::Display`] renders the descriptor
//! as Rust type syntax, which is what the emitter parses back into tokens.

mod collections;

use std::fmt;

pub use collections::CollectionKind;
use collections::Recognized;
use itertools::Itertools;
use strum::IntoEnumIterator;
use thiserror::Error;

/// The tagged base of a [`TypeDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Base {
    /// A scalar primitive such as `u32`, `bool` or `str`.
    Primitive(String),
    /// `[T; N]`. The element is the only argument.
    Array {
        /// Length expression as written.
        len: String,
    },
    /// `[T]`. The element is the only argument.
    Slice,
    /// A named type path; parameterized when the descriptor has arguments.
    Named(String),
    /// `&'a T` or `&'a mut T`. The referent is the only argument.
    Reference {
        /// Lifetime as written, including the leading quote.
        lifetime: Option<String>,
        /// Whether the reference was declared `&mut`.
        mutable:  bool,
    },
    /// A lifetime in generic argument position.
    Lifetime(String),
    /// Anything else, kept verbatim.
    Opaque(String),
}

/// Faithful description of a field's target type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// Tagged base type.
    pub base:               Base,
    /// Generic arguments in declaration order, lifetimes included.
    pub args:               Vec<Self>,
    /// Whether the type is wrapped in `Option`.
    pub nullable:           bool,
    /// Whether the mutable-collection rewrite was applied.
    pub mutable_collection: bool,
}

/// A modifier that could not be applied to a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// `nullable_element` on a type without a generic type argument.
    #[error("`nullable_element` needs a type with a generic type argument, found `{found}`")]
    NoTypeArgument {
        /// Rendered descriptor the modifier was applied to.
        found: String,
    },
    /// `mutable` on something that is not a read-only collection.
    #[error("`mutable` applies only to read-only collections ({}), found `{found}`", CollectionKind::iter().join(", "))]
    NotACollection {
        /// Rendered descriptor the modifier was applied to.
        found: String,
    },
}

impl TypeDescriptor {
    const fn with_base(base: Base, args: Vec<Self>) -> Self {
        Self {
            base,
            args,
            nullable: false,
            mutable_collection: false,
        }
    }

    /// A primitive such as `u32`.
    #[must_use]
    pub fn primitive(name: impl Into<String>) -> Self { Self::with_base(Base::Primitive(name.into()), Vec::new()) }

    /// A named path with the given arguments.
    #[must_use]
    pub fn named(path: impl Into<String>, args: Vec<Self>) -> Self { Self::with_base(Base::Named(path.into()), args) }

    /// `[element; len]`
    #[must_use]
    pub fn array(element: Self, len: impl Into<String>) -> Self {
        Self::with_base(Base::Array { len: len.into() }, vec![element])
    }

    /// `[element]`
    #[must_use]
    pub fn slice(element: Self) -> Self { Self::with_base(Base::Slice, vec![element]) }

    /// `&'lifetime referent`, optionally `mut`.
    #[must_use]
    pub fn reference(lifetime: Option<&str>, mutable: bool, referent: Self) -> Self {
        Self::with_base(
            Base::Reference {
                lifetime: lifetime.map(str::to_string),
                mutable,
            },
            vec![referent],
        )
    }

    /// A lifetime argument such as `'a`.
    #[must_use]
    pub fn lifetime(name: impl Into<String>) -> Self { Self::with_base(Base::Lifetime(name.into()), Vec::new()) }

    /// A type kept verbatim.
    #[must_use]
    pub fn opaque(text: impl Into<String>) -> Self { Self::with_base(Base::Opaque(text.into()), Vec::new()) }

    /// A copy of this descriptor wrapped in `Option`.
    #[must_use]
    pub fn as_nullable(&self) -> Self {
        Self {
            nullable: true,
            ..self.clone()
        }
    }

    /// A copy of this descriptor without the `Option` wrapper.
    #[must_use]
    pub fn as_non_null(&self) -> Self {
        Self {
            nullable: false,
            ..self.clone()
        }
    }

    /// Generic type arguments, skipping lifetimes.
    pub fn type_arguments(&self) -> impl Iterator<Item = &Self> {
        self.args.iter().filter(|arg| !matches!(arg.base, Base::Lifetime(_)))
    }

    /// The collection family this descriptor belongs to, if any.
    #[must_use]
    pub fn collection_kind(&self) -> Option<CollectionKind> {
        collections::recognize(self).map(|recognized| recognized.kind())
    }

    /// Whether a `&str` literal converts into this type with `Into`.
    ///
    /// Covers `String`, `&str`, and `Box`, `Rc`, `Arc` or `Cow` around `str`.
    #[must_use]
    pub fn is_string_like(&self) -> bool {
        match &self.base {
            Base::Named(path) => match last_segment(path) {
                "String" => self.args.is_empty(),
                "Box" | "Rc" | "Arc" | "Cow" => self.type_arguments().exactly_one().is_ok_and(Self::is_str),
                _ => false,
            },
            Base::Reference { .. } => self.args.first().is_some_and(Self::is_str),
            _ => false,
        }
    }

    fn is_str(&self) -> bool { !self.nullable && matches!(&self.base, Base::Primitive(name) if name == "str") }

    /// Replace the last generic type argument with its nullable form.
    ///
    /// A reference rewrites its referent, and the element of an array or
    /// slice counts as its argument. Applying the rewrite twice yields the
    /// same descriptor as applying it once.
    ///
    /// # Errors
    ///
    /// [`TransformError::NoTypeArgument`] when there is no type argument to rewrite.
    pub fn with_nullable_element(&self) -> Result<Self, TransformError> {
        if matches!(self.base, Base::Reference { .. }) {
            let Some(referent) = self.args.first() else {
                return Err(self.no_type_argument());
            };
            let referent = referent
                .with_nullable_element()
                .map_err(|_| self.no_type_argument())?;
            return Ok(Self {
                args: vec![referent],
                ..self.clone()
            });
        }

        let Some(index) = self
            .args
            .iter()
            .rposition(|arg| !matches!(arg.base, Base::Lifetime(_)))
        else {
            return Err(self.no_type_argument());
        };

        let mut rewritten = self.clone();
        rewritten.args[index] = self.args[index].as_nullable();
        Ok(rewritten)
    }

    fn no_type_argument(&self) -> TransformError {
        TransformError::NoTypeArgument {
            found: self.to_string(),
        }
    }

    /// Substitute the mutable counterpart of a read-only collection.
    ///
    /// Arguments and top-level nullability are preserved. A collection that
    /// is already mutable is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`TransformError::NotACollection`] when the descriptor is not in the
    /// collection table.
    pub fn as_mutable_collection(&self) -> Result<Self, TransformError> {
        match collections::recognize(self) {
            None => Err(TransformError::NotACollection {
                found: self.to_string(),
            }),
            Some(Recognized::Reference { mutable: true, .. } | Recognized::MutableIterator) => Ok(self.clone()),
            Some(Recognized::Reference { mutable: false, .. }) => Ok(Self {
                mutable_collection: true,
                ..self.clone()
            }),
            Some(Recognized::ReadOnlyIterator { counterpart }) => Ok(Self {
                base: Base::Named(counterpart),
                mutable_collection: true,
                ..self.clone()
            }),
        }
    }

    fn fmt_non_null(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            Base::Primitive(text) | Base::Lifetime(text) | Base::Opaque(text) => f.write_str(text),
            Base::Named(path) => {
                f.write_str(path)?;
                if self.args.is_empty() {
                    Ok(())
                } else {
                    write!(f, "<{}>", self.args.iter().join(", "))
                }
            },
            Base::Array { len } => {
                f.write_str("[")?;
                self.fmt_element(f)?;
                write!(f, "; {len}]")
            },
            Base::Slice => {
                f.write_str("[")?;
                self.fmt_element(f)?;
                f.write_str("]")
            },
            Base::Reference { lifetime, mutable } => {
                f.write_str("&")?;
                if let Some(lifetime) = lifetime {
                    write!(f, "{lifetime} ")?;
                }
                if *mutable || self.mutable_collection {
                    f.write_str("mut ")?;
                }
                self.fmt_element(f)
            },
        }
    }

    fn fmt_element(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.args.first() {
            Some(element) => write!(f, "{element}"),
            None => f.write_str("_"),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            f.write_str("Option<")?;
            self.fmt_non_null(f)?;
            f.write_str(">")
        } else {
            self.fmt_non_null(f)
        }
    }
}

fn last_segment(path: &str) -> &str { path.rsplit("::").next().unwrap_or(path) }
