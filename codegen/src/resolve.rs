//! Which fields of a declared type take part in its builder, and with which modifiers.

use std::collections::HashMap;

use crate::host::{Constructor, ConstructorKind, DeclaredType, FieldDecl, Introspect, Modifiers, TypeRef};

/// Modifiers of constructor parameters, indexed by parameter name.
///
/// When several constructors declare a parameter of the same name, the first
/// one in declaration order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierTable {
    by_name: HashMap<String, Modifiers>,
}

impl ModifierTable {
    /// Index the parameters of `constructors`.
    #[must_use]
    pub fn build(constructors: &[Constructor]) -> Self {
        let mut by_name = HashMap::new();
        for parameter in constructors.iter().flat_map(|constructor| &constructor.parameters) {
            by_name
                .entry(parameter.name.clone())
                .or_insert_with(|| parameter.modifiers.clone());
        }
        Self { by_name }
    }

    /// Whether some constructor has a parameter called `name`.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool { self.by_name.contains_key(name) }

    /// Modifiers of the first parameter called `name`.
    #[must_use]
    pub fn parameter_modifiers(&self, name: &str) -> Option<&Modifiers> { self.by_name.get(name) }
}

/// A declared type together with its constructors and parameter modifiers.
#[derive(Debug, Clone)]
pub struct TypeMetadata<'h> {
    /// Named fields in declaration order.
    pub fields:       &'h [FieldDecl],
    /// Constructors in declaration order.
    pub constructors: Vec<Constructor>,
    table:            ModifierTable,
}

impl<'h> TypeMetadata<'h> {
    /// Read fields and constructors of `declared` through `host`.
    pub fn resolve(host: &'h impl Introspect, declared: &'h DeclaredType) -> Self {
        let fields = host.resolve_fields(declared);
        let constructors = host.resolve_constructors(declared);
        let table = ModifierTable::build(&constructors);
        Self {
            fields,
            constructors,
            table,
        }
    }

    /// Fields that some constructor accepts as a parameter of the same name, in declaration order.
    #[must_use]
    pub fn eligible_fields(&self) -> Vec<&'h FieldDecl> {
        self.fields
            .iter()
            .filter(|field| self.table.has_parameter(&field.name))
            .collect()
    }

    /// The field's own modifiers united with those of the like-named parameter.
    #[must_use]
    pub fn effective_modifiers(&self, field: &FieldDecl) -> Modifiers {
        self.table
            .parameter_modifiers(&field.name)
            .map_or_else(|| field.modifiers.clone(), |parameter| field.modifiers.united_with(parameter))
    }

    /// The first constructor whose parameter names are exactly `names`, order aside.
    #[must_use]
    pub fn constructor_accepting<'c>(
        constructors: impl IntoIterator<Item = &'c Constructor>,
        names: &[&str],
    ) -> Option<&'c Constructor> {
        let mut wanted: Vec<&str> = names.to_vec();
        wanted.sort_unstable();
        constructors.into_iter().find(|constructor| {
            let mut offered: Vec<&str> = constructor.parameter_names().collect();
            offered.sort_unstable();
            offered == wanted
        })
    }

    /// The named constructor `name`.
    #[must_use]
    pub fn constructor_named(&self, name: &str) -> Option<&Constructor> {
        self.constructors
            .iter()
            .find(|constructor| matches!(&constructor.kind, ConstructorKind::Function(candidate) if candidate == name))
    }
}

/// Whether values of `ty` may be absent, i.e. `ty` is an `Option`.
///
/// Primitives are never nullable.
#[must_use]
pub fn is_nullable(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Path { path, args } => is_option_path(path) && args.len() == 1,
        _ => false,
    }
}

/// Whether `path` names `core::option::Option`.
fn is_option_path(path: &str) -> bool {
    matches!(
        path.trim_start_matches("::"),
        "Option" | "option::Option" | "std::option::Option" | "core::option::Option"
    )
}
