//! [`Introspect`] over Rust sources parsed with `syn`.

use std::path::{Path, PathBuf};

use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Fields, FnArg, ImplItem, ImplItemFn, Item, ItemImpl, ItemStruct, Pat, ReturnType, Token, Type};
use tracing::{debug, info};

use super::discover::{SourceRoot, module_segments, source_files};
use super::lower::lower;
use super::{
    Accessor, AccessorKind, Constructor, ConstructorKind, DeclaredType, Directive, DirectiveKind, FieldDecl, Introspect,
    Modifiers, ModulePath, Parameter, Shape, TypeRef, Visibility, field_accessors, memberwise_constructor,
};
use crate::diagnostics::{Diagnostic, Diagnostics, Location};
use crate::error::Result;

/// Getter method found in an inherent `impl` block.
#[derive(Debug, Clone)]
struct Getter {
    property:   String,
    method:     String,
    visibility: Visibility,
    ty:         TypeRef,
}

/// Constructors and getters of one inherent `impl` block.
#[derive(Debug, Clone)]
struct ImplRecord {
    type_name:    String,
    module:       ModulePath,
    constructors: Vec<Constructor>,
    getters:      Vec<Getter>,
}

/// Declarations of every scanned source file.
#[derive(Debug, Default)]
pub struct SourceTree {
    roots:       Vec<SourceRoot>,
    files:       Vec<PathBuf>,
    types:       Vec<DeclaredType>,
    impls:       Vec<ImplRecord>,
    directives:  Vec<Directive>,
    diagnostics: Diagnostics,
}

impl SourceTree {
    /// Scan every `.rs` file below each root.
    ///
    /// Files that cannot be read or parsed are reported and skipped.
    ///
    /// # Errors
    ///
    /// [`crate::Error::SourceRoot`] when a root directory cannot be read.
    pub fn load(roots: &[SourceRoot]) -> Result<Self> {
        let mut tree = Self {
            roots: roots.to_vec(),
            ..Self::default()
        };

        for (index, root) in roots.iter().enumerate() {
            let files = source_files(&root.dir)?;
            info!("Scanning {} source files of '{}'", files.len(), root.label);
            for file in files {
                match std::fs::read_to_string(&file) {
                    Ok(text) => tree.ingest(index, &root.dir, &file, &text),
                    Err(e) => tree
                        .diagnostics
                        .error(format!("cannot read {}: {e}", file.display()), None),
                }
                tree.files.push(file);
            }
        }
        Ok(tree)
    }

    /// Scan in-memory sources of a single crate, keyed by path relative to its source root.
    #[must_use]
    pub fn from_sources<P, S>(sources: impl IntoIterator<Item = (P, S)>) -> Self
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let root = SourceRoot::new("");
        let mut tree = Self {
            roots: vec![root.clone()],
            ..Self::default()
        };
        for (path, text) in sources {
            let path = path.as_ref();
            tree.ingest(0, &root.dir, path, text.as_ref());
            tree.files.push(path.to_path_buf());
        }
        tree
    }

    /// Every file that was scanned, in scan order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] { &self.files }

    /// Every struct declaration, in source order.
    #[must_use]
    pub fn types(&self) -> &[DeclaredType] { &self.types }

    fn ingest(&mut self, root: usize, root_dir: &Path, file: &Path, text: &str) {
        let parsed = match syn::parse_file(text) {
            Ok(parsed) => parsed,
            Err(error) => {
                self.diagnostics.error(
                    format!("cannot parse source file: {error}"),
                    Location::from_span(file, error.span()),
                );
                return;
            },
        };

        let module = ModulePath {
            root,
            segments: module_segments(root_dir, file),
        };
        debug!("Scanning {} as {module}", file.display());
        Scanner { tree: self, file }.items(&parsed.items, &module);
    }

    fn root_name(&self, root: usize) -> Option<String> {
        self.roots
            .get(root)
            .map(|root| root.label.replace('-', "_"))
    }

    /// Whether a path's qualifying segments agree with `module`.
    ///
    /// A leading segment that does not fit inside `module` must name the crate.
    fn module_matches(&self, module: &ModulePath, qualifiers: &[&str]) -> bool {
        let segments = &module.segments;
        if qualifiers.len() > segments.len() + 1 {
            return false;
        }
        let (crate_part, module_part) = if qualifiers.len() > segments.len() {
            qualifiers.split_at(1)
        } else {
            (&[][..], qualifiers)
        };

        let module_ok = segments
            .iter()
            .rev()
            .zip(module_part.iter().rev())
            .all(|(segment, qualifier)| segment == qualifier);
        let crate_ok = crate_part
            .first()
            .is_none_or(|name| self.root_name(module.root).as_deref() == Some(*name));
        module_ok && crate_ok
    }

    /// `impl` blocks that belong to `ty`.
    ///
    /// An `impl` in another module of the same crate counts unless that
    /// module declares a type of the same name itself.
    fn impls_of<'a>(&'a self, ty: &'a DeclaredType) -> impl Iterator<Item = &'a ImplRecord> + 'a {
        self.impls.iter().filter(move |record| {
            record.type_name == ty.name
                && record.module.root == ty.module.root
                && (record.module == ty.module
                    || !self
                        .types
                        .iter()
                        .any(|other| other.name == ty.name && other.module == record.module))
        })
    }
}

impl Introspect for SourceTree {
    fn directives(&self) -> &[Directive] { &self.directives }

    fn find_type(&self, path: &str, from: &ModulePath) -> Option<&DeclaredType> {
        let segments: Vec<&str> = path
            .split("::")
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect();
        let (name, qualifiers) = segments.split_last()?;
        let qualifiers: Vec<&str> = qualifiers
            .iter()
            .copied()
            .filter(|segment| !matches!(*segment, "crate" | "self" | "super"))
            .collect();

        self.types
            .iter()
            .filter(|ty| ty.name == *name && self.module_matches(&ty.module, &qualifiers))
            .min_by_key(|ty| (ty.module.root != from.root, ty.module != *from))
    }

    fn resolve_constructors(&self, ty: &DeclaredType) -> Vec<Constructor> {
        let explicit: Vec<Constructor> = self
            .impls_of(ty)
            .flat_map(|record| record.constructors.iter().cloned())
            .collect();
        if explicit.is_empty() && ty.shape == Shape::Named {
            vec![memberwise_constructor(ty)]
        } else {
            explicit
        }
    }

    fn resolve_accessors(&self, ty: &DeclaredType, from: &ModulePath) -> Vec<Accessor> {
        let mut accessors: Vec<Accessor> = field_accessors(ty, from).collect();
        for record in self.impls_of(ty) {
            for getter in &record.getters {
                if getter.visibility.is_visible(&record.module, from)
                    && !accessors.iter().any(|accessor| accessor.property == getter.property)
                {
                    accessors.push(Accessor {
                        property: getter.property.clone(),
                        kind:     AccessorKind::Getter(getter.method.clone()),
                        ty:       getter.ty.clone(),
                    });
                }
            }
        }
        accessors
    }

    fn diagnostics(&self) -> &[Diagnostic] { self.diagnostics.as_slice() }
}

/// What an associated function turned out to be.
enum Candidate {
    Constructor(Constructor),
    /// Looks like a constructor but cannot be called by a builder.
    Unusable(String),
    NotConstructor,
}

/// Walks the items of one file.
struct Scanner<'a> {
    tree: &'a mut SourceTree,
    file: &'a Path,
}

impl Scanner<'_> {
    fn location(&self, span: proc_macro2::Span) -> Location { Location::from_span(self.file, span) }

    fn directive(&mut self, kind: DirectiveKind, module: &ModulePath, attr: &Attribute) {
        let location = self.location(attr.span());
        debug!("Found directive {kind:?} at {location}");
        self.tree.directives.push(Directive {
            kind,
            module: module.clone(),
            location,
        });
    }

    fn items(&mut self, items: &[Item], module: &ModulePath) {
        for item in items {
            match item {
                Item::Struct(item) => self.declare_struct(item, module),
                Item::Impl(item) => {
                    self.item_directives("impl block".to_string(), &item.attrs, None, module);
                    self.scan_impl(item, module);
                },
                Item::Mod(item) => {
                    self.item_directives(format!("module `{}`", item.ident), &item.attrs, Some(&item.vis), module);
                    if let Some((_, content)) = &item.content {
                        self.items(content, &module.child(item.ident.to_string()));
                    }
                },
                Item::Enum(item) => {
                    self.item_directives(format!("enum `{}`", item.ident), &item.attrs, Some(&item.vis), module);
                },
                Item::Union(item) => {
                    self.item_directives(format!("union `{}`", item.ident), &item.attrs, Some(&item.vis), module);
                },
                Item::Trait(item) => {
                    self.item_directives(format!("trait `{}`", item.ident), &item.attrs, Some(&item.vis), module);
                },
                Item::Fn(item) => {
                    let description = format!("function `{}`", item.sig.ident);
                    self.item_directives(description, &item.attrs, Some(&item.vis), module);
                },
                Item::Const(item) => {
                    self.item_directives(format!("const `{}`", item.ident), &item.attrs, Some(&item.vis), module);
                },
                Item::Static(item) => {
                    self.item_directives(format!("static `{}`", item.ident), &item.attrs, Some(&item.vis), module);
                },
                Item::Type(item) => {
                    self.item_directives(format!("type alias `{}`", item.ident), &item.attrs, Some(&item.vis), module);
                },
                _ => {},
            }
        }
    }

    /// Directives on an item that is not a struct.
    ///
    /// Any item may carry `builder_of`; the other directives are misplaced here.
    fn item_directives(
        &mut self,
        description: String,
        attrs: &[Attribute],
        vis: Option<&syn::Visibility>,
        module: &ModulePath,
    ) {
        for attr in attrs {
            if is_builder_of(attr) {
                self.external(attr, vis, module);
            } else if is_builder(attr) || derives_builder(attr) {
                let item = description.clone();
                self.directive(DirectiveKind::Misplaced { item }, module, attr);
            }
        }
    }

    fn declare_struct(&mut self, item: &ItemStruct, module: &ModulePath) {
        let name = item.ident.to_string();
        for attr in &item.attrs {
            if is_builder_of(attr) {
                self.external(attr, Some(&item.vis), module);
            } else if is_builder(attr) || derives_builder(attr) {
                self.directive(DirectiveKind::Type { name: name.clone() }, module, attr);
            }
        }

        let (shape, fields) = match &item.fields {
            Fields::Named(named) => {
                let fields = named
                    .named
                    .iter()
                    .filter_map(|field| {
                        let ident = field.ident.as_ref()?;
                        Some(FieldDecl {
                            name:       ident.to_string(),
                            ty:         lower(&field.ty),
                            modifiers:  self.modifiers(&field.attrs),
                            visibility: visibility(&field.vis),
                            location:   self.location(ident.span()),
                        })
                    })
                    .collect();
                (Shape::Named, fields)
            },
            Fields::Unnamed(_) => (Shape::Tuple, Vec::new()),
            Fields::Unit => (Shape::Unit, Vec::new()),
        };

        let generics = &item.generics;
        self.tree.types.push(DeclaredType {
            name,
            module: module.clone(),
            visibility: visibility(&item.vis),
            generics: (!generics.params.is_empty()).then(|| generics.to_token_stream().to_string()),
            where_clause: generics
                .where_clause
                .as_ref()
                .map(|clause| clause.to_token_stream().to_string()),
            shape,
            fields,
            location: self.location(item.ident.span()),
        });
    }

    fn external(&mut self, attr: &Attribute, vis: Option<&syn::Visibility>, module: &ModulePath) {
        let mut target = None;
        let mut suffix = None;
        let mut use_constructors = false;
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("target") {
                let path: syn::Path = meta.value()?.parse()?;
                target = Some(path_text(&path));
                Ok(())
            } else if meta.path.is_ident("suffix") {
                let value: syn::LitStr = meta.value()?.parse()?;
                suffix = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("use_constructors") {
                let value: syn::LitBool = meta.value()?.parse()?;
                use_constructors = value.value;
                Ok(())
            } else {
                Err(meta.error(format!("unknown builder_of argument `{}`", path_text(&meta.path))))
            }
        });

        if let Err(error) = parsed {
            let location = self.location(error.span());
            self.tree.diagnostics.error(error.to_string(), location);
            return;
        }
        let Some(target) = target else {
            let location = self.location(attr.span());
            self.tree
                .diagnostics
                .error("builder_of requires `target = path::to::Type`", location);
            return;
        };

        let kind = DirectiveKind::External {
            target,
            suffix,
            use_constructors,
            visibility: vis.map(visibility).unwrap_or_default(),
        };
        self.directive(kind, module, attr);
    }

    fn scan_impl(&mut self, item: &ItemImpl, module: &ModulePath) {
        let type_name = match (&item.trait_, self_type_name(&item.self_ty)) {
            (None, Some(name)) => Some(name),
            _ => None,
        };

        let mut record = type_name.as_ref().map(|type_name| ImplRecord {
            type_name:    type_name.clone(),
            module:       module.clone(),
            constructors: Vec::new(),
            getters:      Vec::new(),
        });

        for impl_item in &item.items {
            let ImplItem::Fn(function) = impl_item else {
                continue;
            };
            let candidate = type_name.as_deref().map_or(Candidate::NotConstructor, |type_name| {
                self.constructor(function, type_name, module)
            });
            self.function_directives(function, type_name.as_deref(), &candidate, module);

            let Some(record) = record.as_mut() else {
                continue;
            };
            match candidate {
                Candidate::Constructor(constructor) => record.constructors.push(constructor),
                Candidate::Unusable(reason) => {
                    debug!("Skipping constructor {}::{}: {reason}", record.type_name, function.sig.ident);
                },
                Candidate::NotConstructor => {
                    if let Some(getter) = getter(function) {
                        record.getters.push(getter);
                    }
                },
            }
        }

        if let Some(record) = record {
            self.tree.impls.push(record);
        }
    }

    fn function_directives(
        &mut self,
        function: &ImplItemFn,
        type_name: Option<&str>,
        candidate: &Candidate,
        module: &ModulePath,
    ) {
        let name = function.sig.ident.to_string();
        let qualified = type_name.map_or_else(|| format!("`{name}`"), |type_name| format!("`{type_name}::{name}`"));
        for attr in &function.attrs {
            let kind = if is_builder_of(attr) {
                DirectiveKind::Misplaced {
                    item: format!("associated function {qualified} (builder_of belongs on a module-level marker item)"),
                }
            } else if is_builder(attr) {
                match (candidate, type_name) {
                    (Candidate::Constructor(_), Some(type_name)) => DirectiveKind::Constructor {
                        type_name:   type_name.to_string(),
                        constructor: name.clone(),
                    },
                    (Candidate::Unusable(reason), _) => DirectiveKind::Misplaced {
                        item: format!("constructor {qualified} ({reason})"),
                    },
                    _ => DirectiveKind::Misplaced {
                        item: format!("method {qualified}, which is not a constructor"),
                    },
                }
            } else {
                continue;
            };
            self.directive(kind, module, attr);
        }
    }

    fn constructor(&mut self, function: &ImplItemFn, type_name: &str, module: &ModulePath) -> Candidate {
        let signature = &function.sig;
        let returns_type = match &signature.output {
            ReturnType::Type(_, ty) => names_type(ty, type_name),
            ReturnType::Default => false,
        };
        if signature.receiver().is_some() || !returns_type {
            return Candidate::NotConstructor;
        }
        if signature.asyncness.is_some() || signature.unsafety.is_some() {
            return Candidate::Unusable("async and unsafe constructors are not supported".to_string());
        }
        if signature
            .generics
            .params
            .iter()
            .any(|param| !matches!(param, syn::GenericParam::Lifetime(_)))
        {
            return Candidate::Unusable("generic constructors are not supported".to_string());
        }

        let mut parameters = Vec::new();
        for input in &signature.inputs {
            let FnArg::Typed(typed) = input else {
                return Candidate::NotConstructor;
            };
            let Pat::Ident(binding) = typed.pat.as_ref() else {
                return Candidate::Unusable("parameters must be plain bindings".to_string());
            };
            if binding.by_ref.is_some() || binding.subpat.is_some() {
                return Candidate::Unusable("parameters must be plain bindings".to_string());
            }
            parameters.push(Parameter {
                name:      binding.ident.to_string(),
                ty:        lower(&typed.ty),
                modifiers: self.modifiers(&typed.attrs),
                location:  self.location(binding.ident.span()),
            });
        }

        Candidate::Constructor(Constructor {
            kind: ConstructorKind::Function(signature.ident.to_string()),
            parameters,
            visibility: visibility(&function.vis),
            module: module.clone(),
            location: self.location(signature.ident.span()),
        })
    }

    /// Modifiers from `#[builder(..)]` attributes.
    ///
    /// Malformed entries are reported and treated as absent.
    fn modifiers(&mut self, attrs: &[Attribute]) -> Modifiers {
        let mut modifiers = Modifiers::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("builder")) {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("nullable_element") {
                    modifiers.nullable_element = true;
                    Ok(())
                } else if meta.path.is_ident("mutable") {
                    modifiers.mutable_collection = true;
                    Ok(())
                } else if meta.path.is_ident("default") {
                    let literal: syn::Lit = meta.value()?.parse()?;
                    modifiers.default_value = Some(literal_text(&literal));
                    Ok(())
                } else {
                    Err(meta.error(format!("unknown builder modifier `{}`", path_text(&meta.path))))
                }
            });
            if let Err(error) = parsed {
                let location = self.location(error.span());
                self.tree.diagnostics.error(error.to_string(), location);
            }
        }
        modifiers
    }
}

/// Getter methods: `fn name(&self) -> T` returning an owned value.
fn getter(function: &ImplItemFn) -> Option<Getter> {
    let signature = &function.sig;
    let receiver = signature.receiver()?;
    if receiver.reference.is_none()
        || receiver.mutability.is_some()
        || signature.inputs.len() != 1
        || !signature.generics.params.is_empty()
        || signature.asyncness.is_some()
        || signature.unsafety.is_some()
    {
        return None;
    }

    let ReturnType::Type(_, ty) = &signature.output else {
        return None;
    };
    if matches!(ty.as_ref(), Type::Tuple(tuple) if tuple.elems.is_empty()) {
        return None;
    }
    let ty = lower(ty);
    if ty.borrows() || matches!(ty, TypeRef::ImplTrait(_)) {
        return None;
    }

    let method = signature.ident.to_string();
    let property = method.strip_prefix("get_").unwrap_or(&method).to_string();
    Some(Getter {
        property,
        method,
        visibility: visibility(&function.vis),
        ty,
    })
}

/// Whether `attr` is `#[builder]` or `#[buildergen::builder]`.
fn is_builder(attr: &Attribute) -> bool { names_directive(attr.path(), "builder") }

/// Whether `attr` is `#[builder_of(..)]` or `#[buildergen::builder_of(..)]`.
fn is_builder_of(attr: &Attribute) -> bool { names_directive(attr.path(), "builder_of") }

fn names_directive(path: &syn::Path, name: &str) -> bool {
    let segments: Vec<String> = path
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect();
    match segments.as_slice() {
        [only] => only == name,
        [krate, last] => krate == "buildergen" && last == name,
        _ => false,
    }
}

/// Whether `attr` is a `#[derive(..)]` list containing `Builder`.
fn derives_builder(attr: &Attribute) -> bool {
    attr.path().is_ident("derive")
        && attr
            .parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
            .is_ok_and(|paths| paths.iter().any(|path| names_directive(path, "Builder")))
}

/// Whether `ty` is `Self` or a path ending in `type_name`.
fn names_type(ty: &Type, type_name: &str) -> bool {
    match ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Self" || segment.ident == type_name),
        Type::Group(group) => names_type(&group.elem, type_name),
        _ => false,
    }
}

fn self_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
}

fn visibility(vis: &syn::Visibility) -> Visibility {
    match vis {
        syn::Visibility::Public(_) => Visibility::Public,
        syn::Visibility::Restricted(_) => Visibility::Restricted(vis.to_token_stream().to_string()),
        syn::Visibility::Inherited => Visibility::Private,
    }
}

/// `a::b::C` without token spacing.
fn path_text(path: &syn::Path) -> String {
    let joined = path
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::");
    if path.leading_colon.is_some() {
        format!("::{joined}")
    } else {
        joined
    }
}

/// A string literal's value, or any other literal's source text.
fn literal_text(literal: &syn::Lit) -> String {
    match literal {
        syn::Lit::Str(text) => text.value(),
        other => other.to_token_stream().to_string(),
    }
}
