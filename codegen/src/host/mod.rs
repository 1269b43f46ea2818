//! The declaration model and the narrow introspection interface the pipeline reads it through.
//!
//! Everything here is read-only to the rest of the crate. [`SourceTree`]
//! builds the model by scanning Rust sources with `syn`; tests may implement
//! [`Introspect`] over hand-made declarations instead.

mod discover;
mod lower;
mod source;

use std::fmt;

pub use discover::{SourceRoot, dependency_root, source_files};
pub use source::SourceTree;

use crate::diagnostics::{Diagnostic, Location};

/// A module inside one scanned crate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ModulePath {
    /// Index of the source root the module belongs to.
    pub root:     usize,
    /// Segments below the crate root.
    pub segments: Vec<String>,
}

impl ModulePath {
    /// The root module of source root `root`.
    #[must_use]
    pub const fn crate_root(root: usize) -> Self {
        Self {
            root,
            segments: Vec::new(),
        }
    }

    /// The child module `name`.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self {
            root: self.root,
            segments,
        }
    }

    /// Whether `self` is `other` or nested inside it.
    #[must_use]
    pub fn is_within(&self, other: &Self) -> bool {
        self.root == other.root && self.segments.starts_with(&other.segments)
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("crate")?;
        for segment in &self.segments {
            write!(f, "::{segment}")?;
        }
        Ok(())
    }
}

/// Declared visibility of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// `pub`
    Public,
    /// `pub(crate)`, `pub(super)`, `pub(in path)`; kept verbatim.
    Restricted(String),
    /// No visibility keyword.
    #[default]
    Private,
}

impl Visibility {
    /// Whether an item declared in `owner` with this visibility can be named from `from`.
    ///
    /// Restricted visibilities are treated as crate-wide.
    #[must_use]
    pub fn is_visible(&self, owner: &ModulePath, from: &ModulePath) -> bool {
        match self {
            Self::Public => true,
            Self::Restricted(_) => owner.root == from.root,
            Self::Private => from.is_within(owner),
        }
    }

    /// Rust source text, empty for private items.
    #[must_use]
    pub fn as_source(&self) -> &str {
        match self {
            Self::Public => "pub",
            Self::Restricted(text) => text,
            Self::Private => "",
        }
    }
}

/// A type as written in a declaration, before it becomes a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A primitive such as `u32` or `str`.
    Primitive(String),
    /// `[element; len]`
    Array {
        /// Element type.
        element: Box<Self>,
        /// Length expression as written.
        len:     String,
    },
    /// `[element]`
    Slice(Box<Self>),
    /// A path type with its generic arguments of the final segment.
    Path {
        /// Segments joined with `::`.
        path: String,
        /// Generic arguments, lifetimes included.
        args: Vec<Self>,
    },
    /// `&'a T` / `&'a mut T`
    Reference {
        /// Lifetime as written.
        lifetime: Option<String>,
        /// Whether declared `&mut`.
        mutable:  bool,
        /// The referenced type.
        referent: Box<Self>,
    },
    /// A lifetime generic argument.
    Lifetime(String),
    /// `impl Trait` in type position.
    ImplTrait(String),
    /// Anything else, as source text.
    Opaque(String),
}

impl TypeRef {
    /// A path type without arguments.
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path {
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// A path type with arguments.
    #[must_use]
    pub fn generic(path: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Path {
            path: path.into(),
            args,
        }
    }

    /// Whether the type mentions a reference or a lifetime anywhere.
    #[must_use]
    pub fn borrows(&self) -> bool {
        match self {
            Self::Reference { .. } | Self::Lifetime(_) => true,
            Self::Array { element, .. } | Self::Slice(element) => element.borrows(),
            Self::Path { args, .. } => args.iter().any(Self::borrows),
            Self::Primitive(_) | Self::ImplTrait(_) | Self::Opaque(_) => false,
        }
    }
}

/// The modifiers attached to a field or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// `#[builder(nullable_element)]`
    pub nullable_element:   bool,
    /// `#[builder(mutable)]`
    pub mutable_collection: bool,
    /// `#[builder(default = "...")]`
    pub default_value:      Option<String>,
}

impl Modifiers {
    /// Whether no modifier is present.
    #[must_use]
    pub fn is_empty(&self) -> bool { *self == Self::default() }

    /// Union with the modifiers of a like-named parameter.
    ///
    /// A default value on the parameter wins over the one on `self`.
    #[must_use]
    pub fn united_with(&self, parameter: &Self) -> Self {
        Self {
            nullable_element:   self.nullable_element || parameter.nullable_element,
            mutable_collection: self.mutable_collection || parameter.mutable_collection,
            default_value:      parameter
                .default_value
                .clone()
                .or_else(|| self.default_value.clone()),
        }
    }
}

/// A named field of a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name.
    pub name:       String,
    /// Declared type.
    pub ty:         TypeRef,
    /// Modifiers written on the field.
    pub modifiers:  Modifiers,
    /// Declared visibility.
    pub visibility: Visibility,
    /// Position of the field name.
    pub location:   Location,
}

/// A parameter of a constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Binding name.
    pub name:      String,
    /// Declared type.
    pub ty:        TypeRef,
    /// Modifiers written on the parameter.
    pub modifiers: Modifiers,
    /// Position of the binding.
    pub location:  Location,
}

/// How a constructor is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstructorKind {
    /// An associated function, called as `Type::name(..)`.
    Function(String),
    /// The struct literal, available when no explicit constructor exists.
    Memberwise,
}

/// A way to create an instance of a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    /// Function or struct literal.
    pub kind:       ConstructorKind,
    /// Parameters in declaration order.
    pub parameters: Vec<Parameter>,
    /// Who may call it.
    pub visibility: Visibility,
    /// Module of the declaring `impl` block or struct.
    pub module:     ModulePath,
    /// Position of the constructor name or struct name.
    pub location:   Location,
}

impl Constructor {
    /// Parameter names in declaration order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> { self.parameters.iter().map(|p| p.name.as_str()) }

    /// Whether the constructor can be called from `from`.
    #[must_use]
    pub fn is_accessible_from(&self, from: &ModulePath) -> bool { self.visibility.is_visible(&self.module, from) }
}

/// How the value of a property can be read from an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    /// Direct field access, moving the value out.
    Field,
    /// A `&self` method returning an owned value.
    Getter(String),
}

/// A readable property of a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    /// Property name; the field name, or the getter name without `get_`.
    pub property: String,
    /// How to read it.
    pub kind:     AccessorKind,
    /// Type of the value read.
    pub ty:       TypeRef,
}

/// Field layout of a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Shape {
    /// `struct S { .. }`
    #[strum(to_string = "struct with named fields")]
    Named,
    /// `struct S(..);`
    #[strum(to_string = "tuple struct")]
    Tuple,
    /// `struct S;`
    #[strum(to_string = "unit struct")]
    Unit,
}

/// A struct declaration found in the scanned sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    /// Type name.
    pub name:         String,
    /// Declaring module.
    pub module:       ModulePath,
    /// Declared visibility.
    pub visibility:   Visibility,
    /// Generic parameter list as written, including the angle brackets.
    pub generics:     Option<String>,
    /// Where clause as written.
    pub where_clause: Option<String>,
    /// Field layout.
    pub shape:        Shape,
    /// Named fields in declaration order; empty for tuple and unit structs.
    pub fields:       Vec<FieldDecl>,
    /// Position of the type name.
    pub location:     Location,
}

/// What a directive asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `#[derive(Builder)]` or `#[buildergen::builder]` on a struct.
    Type {
        /// Name of the annotated struct.
        name: String,
    },
    /// `#[buildergen::builder]` on an associated constructor.
    Constructor {
        /// Name of the `impl` self type.
        type_name:   String,
        /// Name of the annotated function.
        constructor: String,
    },
    /// `#[buildergen::builder_of(..)]` on a marker item.
    External {
        /// Target type path as written.
        target:           String,
        /// Requested suffix, `Builder` when absent.
        suffix:           Option<String>,
        /// Whether to use the primary constructor's parameters verbatim.
        use_constructors: bool,
        /// Visibility of the marker item.
        visibility:       Visibility,
    },
    /// A builder directive on an item that cannot carry one.
    Misplaced {
        /// Description of the item, such as ``enum `Color` ``.
        item: String,
    },
}

/// A directive together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// What is requested.
    pub kind:     DirectiveKind,
    /// Module containing the annotated item.
    pub module:   ModulePath,
    /// Position of the attribute.
    pub location: Location,
}

impl Directive {
    /// Whether the directive annotates the type it builds.
    #[must_use]
    pub const fn is_external(&self) -> bool { matches!(self.kind, DirectiveKind::External { .. }) }
}

/// Read-only access to declarations, as the pipeline needs them.
pub trait Introspect {
    /// Every directive in source order.
    fn directives(&self) -> &[Directive];

    /// Resolve a type path as written in module `from`.
    fn find_type(&self, path: &str, from: &ModulePath) -> Option<&DeclaredType>;

    /// Named fields of `ty` in declaration order.
    fn resolve_fields<'a>(&'a self, ty: &'a DeclaredType) -> &'a [FieldDecl] { &ty.fields }

    /// Constructors of `ty` in declaration order.
    ///
    /// A struct with named fields and no associated constructor has exactly
    /// one memberwise constructor whose parameters are its fields.
    fn resolve_constructors(&self, ty: &DeclaredType) -> Vec<Constructor>;

    /// Properties of `ty` readable from module `from`.
    fn resolve_accessors(&self, ty: &DeclaredType, from: &ModulePath) -> Vec<Accessor>;

    /// Problems found while reading declarations.
    fn diagnostics(&self) -> &[Diagnostic] { &[] }
}

/// The memberwise constructor of a struct with named fields.
#[must_use]
pub fn memberwise_constructor(ty: &DeclaredType) -> Constructor {
    let narrowest = ty
        .fields
        .iter()
        .map(|field| &field.visibility)
        .fold(&ty.visibility, |narrowest, field| match (narrowest, field) {
            (Visibility::Private, _) | (_, Visibility::Public) => narrowest,
            _ => field,
        });
    Constructor {
        kind:       ConstructorKind::Memberwise,
        parameters: ty
            .fields
            .iter()
            .map(|field| Parameter {
                name:      field.name.clone(),
                ty:        field.ty.clone(),
                modifiers: field.modifiers.clone(),
                location:  field.location.clone(),
            })
            .collect(),
        visibility: narrowest.clone(),
        module:     ty.module.clone(),
        location:   ty.location.clone(),
    }
}

/// Fields of `ty` that can be read directly from module `from`.
pub fn field_accessors<'a>(ty: &'a DeclaredType, from: &'a ModulePath) -> impl Iterator<Item = Accessor> + 'a {
    ty.fields
        .iter()
        .filter(move |field| field.visibility.is_visible(&ty.module, from))
        .map(|field| Accessor {
            property: field.name.clone(),
            kind:     AccessorKind::Field,
            ty:       field.ty.clone(),
        })
}
