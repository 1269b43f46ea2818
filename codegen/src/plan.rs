//! Planning one builder: its fields, their descriptors and how the target is constructed.

use itertools::Itertools;
use quote::ToTokens;
use tracing::debug;

use crate::describe::{canonical, describe};
use crate::descriptor::TypeDescriptor;
use crate::diagnostics::{Diagnostic, Diagnostics, Location};
use crate::host::{Accessor, AccessorKind, Constructor, ConstructorKind, Modifiers, ModulePath, TypeRef, Visibility};
use crate::resolve::TypeMetadata;

/// Suffix used when a directive does not name one.
pub const DEFAULT_SUFFIX: &str = "Builder";

/// Builder methods a field name must not shadow.
pub const RESERVED_NAMES: [&str; 3] = ["new", "build", "check_required_fields"];

/// The type a builder constructs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Type name.
    pub name:         String,
    /// How generated code names the type, relative to the builder's module.
    pub path:         String,
    /// Generic parameters as written, with angle brackets.
    pub generics:     Option<String>,
    /// Where clause as written.
    pub where_clause: Option<String>,
}

/// One field a builder is asked to carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field or parameter name.
    pub name:      String,
    /// Declared type.
    pub ty:        TypeRef,
    /// Modifiers to apply.
    pub modifiers: Modifiers,
    /// Where the field or parameter is declared.
    pub location:  Location,
}

/// How `build()` creates the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Construction {
    /// `Target::name(args..)` with arguments in parameter order.
    Constructor {
        /// Associated function name.
        name:      String,
        /// Field names in parameter order.
        arguments: Vec<String>,
    },
    /// `Target { fields.. }`
    Literal,
}

/// A field of a planned builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedField {
    /// Setter and slot name.
    pub name:       String,
    /// Target type of the field.
    pub descriptor: TypeDescriptor,
    /// Initial value expression, when one was given.
    pub default:    Option<String>,
    /// Whether `build()` fails when the field is unset.
    pub required:   bool,
    /// How `From<Target>` reads the field back, when it can.
    pub copy:       Option<AccessorKind>,
}

/// Everything the emitter needs to write one builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderPlan {
    /// Builder type name, also the output file stem.
    pub unit:         String,
    /// The type being built.
    pub target:       Target,
    /// Visibility of the builder type.
    pub visibility:   Visibility,
    /// Fields in declaration order.
    pub fields:       Vec<PlannedField>,
    /// How the target is constructed.
    pub construction: Construction,
    /// Whether to add `Target::builder()`.
    pub entry_point:  bool,
    /// Module the builder is included into.
    pub module:       ModulePath,
    /// Location of the originating directive.
    pub location:     Location,
}

/// Input to [`plan`].
#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    /// The type being built.
    pub target:       Target,
    /// Appended to the target name to form the unit name.
    pub suffix:       &'a str,
    /// Visibility of the builder type.
    pub visibility:   Visibility,
    /// Fields in the order the builder should present them.
    pub fields:       Vec<FieldSpec>,
    /// Constructors that may construct the target.
    pub constructors: &'a [Constructor],
    /// Properties readable for `From<Target>`.
    pub accessors:    &'a [Accessor],
    /// Whether to add `Target::builder()`.
    pub entry_point:  bool,
    /// Module the builder is included into.
    pub module:       ModulePath,
    /// Location of the originating directive.
    pub location:     Location,
}

/// Plan a builder for `request`.
///
/// Modifier problems are pushed onto `diagnostics` and do not stop planning.
///
/// # Errors
///
/// A diagnostic when the builder cannot be synthesized: an invalid unit name,
/// a field named like a builder method, an `impl Trait` field, or no
/// constructor accepting exactly the planned fields.
pub fn plan(request: PlanRequest<'_>, diagnostics: &mut Diagnostics) -> Result<BuilderPlan, Diagnostic> {
    let unit = format!("{}{}", request.target.name, request.suffix);
    if syn::parse_str::<syn::Ident>(&unit).is_err() {
        return Err(Diagnostic::error(
            format!("`{unit}` is not a valid builder name"),
            request.location,
        ));
    }

    for field in &request.fields {
        if RESERVED_NAMES.contains(&field.name.as_str()) {
            return Err(Diagnostic::error(
                format!(
                    "field `{}` collides with the builder method of the same name; rename it to get a builder for `{}`",
                    field.name, request.target.name
                ),
                field.location.clone(),
            ));
        }
        if matches!(field.ty, TypeRef::ImplTrait(_)) {
            return Err(Diagnostic::error(
                format!("field `{}` has an `impl Trait` type, which a builder cannot store", field.name),
                field.location.clone(),
            ));
        }
    }

    let names: Vec<&str> = request.fields.iter().map(|field| field.name.as_str()).collect();
    let Some(constructor) = TypeMetadata::constructor_accepting(request.constructors, &names) else {
        return Err(Diagnostic::error(
            format!(
                "no constructor of `{}` accepts exactly ({})",
                request.target.name,
                names.iter().join(", ")
            ),
            request.location,
        ));
    };
    let construction = match &constructor.kind {
        ConstructorKind::Function(name) => Construction::Constructor {
            name:      name.clone(),
            arguments: constructor.parameter_names().map(str::to_string).collect(),
        },
        ConstructorKind::Memberwise => Construction::Literal,
    };

    let fields = request
        .fields
        .iter()
        .map(|field| plan_field(field, constructor, request.accessors, &request.target, diagnostics))
        .collect();

    debug!("Planned {unit} for {}", request.target.path);
    Ok(BuilderPlan {
        unit,
        target: request.target,
        visibility: request.visibility,
        fields,
        construction,
        entry_point: request.entry_point,
        module: request.module,
        location: request.location,
    })
}

fn plan_field(
    field: &FieldSpec,
    constructor: &Constructor,
    accessors: &[Accessor],
    target: &Target,
    diagnostics: &mut Diagnostics,
) -> PlannedField {
    let declared = canonical(&field.ty);
    let described = describe(&field.ty, &field.modifiers, &field.location, diagnostics);
    let descriptor = match accepted_type(constructor, &field.name) {
        Some(accepted) if described != declared && accepted != described => {
            diagnostics.error(
                format!(
                    "modifiers turn `{}` into `{described}`, but `{}` is constructed from `{accepted}`; building it as `{declared}`",
                    field.name, target.name
                ),
                field.location.clone(),
            );
            declared
        },
        _ => described,
    };
    let default = field
        .modifiers
        .default_value
        .as_deref()
        .and_then(|raw| default_literal(raw, &descriptor, field, diagnostics));

    let accessor = accessors.iter().find(|accessor| accessor.property == field.name);
    let copy = match accessor {
        Some(accessor) if canonical(&accessor.ty) == descriptor => Some(accessor.kind.clone()),
        Some(accessor) => {
            diagnostics.note(
                format!(
                    "`{}` is not copied when converting from `{}`: it reads as `{}` but the builder holds `{descriptor}`",
                    field.name,
                    target.name,
                    canonical(&accessor.ty)
                ),
                field.location.clone(),
            );
            None
        },
        None => None,
    };

    PlannedField {
        name: field.name.clone(),
        required: !descriptor.nullable,
        descriptor,
        default,
        copy,
    }
}

/// What `constructor` takes for the parameter called `name`.
fn accepted_type(constructor: &Constructor, name: &str) -> Option<TypeDescriptor> {
    constructor
        .parameters
        .iter()
        .find(|parameter| parameter.name == name)
        .map(|parameter| canonical(&parameter.ty))
}

/// The initial value expression for a default literal.
///
/// String-like types get the literal quoted unless it already is. `None`
/// means no default, and `Some(x)` on a nullable field means `x`. Anything
/// that does not parse as an expression is reported and dropped.
fn default_literal(
    raw: &str,
    descriptor: &TypeDescriptor,
    field: &FieldSpec,
    diagnostics: &mut Diagnostics,
) -> Option<String> {
    let raw = raw.trim();
    if raw == "None" {
        return None;
    }
    let inner = if descriptor.nullable { some_argument(raw) } else { None };
    let raw = inner.as_deref().unwrap_or(raw);

    let text = if descriptor.as_non_null().is_string_like() && !is_quoted(raw) {
        format!("{raw:?}")
    } else {
        raw.to_string()
    };

    match syn::parse_str::<syn::Expr>(&text) {
        Ok(_) => Some(text),
        Err(error) => {
            diagnostics.error(
                format!("default value `{raw}` of `{}` is not a Rust expression: {error}", field.name),
                field.location.clone(),
            );
            None
        },
    }
}

/// `x` when `raw` is `Some(x)`.
fn some_argument(raw: &str) -> Option<String> {
    let syn::Expr::Call(call) = syn::parse_str::<syn::Expr>(raw).ok()? else {
        return None;
    };
    let syn::Expr::Path(function) = call.func.as_ref() else {
        return None;
    };
    if call.args.len() != 1 || !function.path.segments.last().is_some_and(|segment| segment.ident == "Some") {
        return None;
    }
    call.args.first().map(|argument| argument.to_token_stream().to_string())
}

fn is_quoted(raw: &str) -> bool { raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') }

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::host::Parameter;

    fn location() -> Location {
        Location {
            file:   PathBuf::from("lib.rs"),
            line:   1,
            column: 1,
        }
    }

    fn target() -> Target {
        Target {
            name:         "Pair".to_string(),
            path:         "Pair".to_string(),
            generics:     None,
            where_clause: None,
        }
    }

    fn field(name: &str, ty: TypeRef) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            ty,
            modifiers: Modifiers::default(),
            location: location(),
        }
    }

    fn constructor(kind: ConstructorKind, fields: &[FieldSpec]) -> Constructor {
        Constructor {
            kind,
            parameters: fields
                .iter()
                .map(|field| Parameter {
                    name:      field.name.clone(),
                    ty:        field.ty.clone(),
                    modifiers: field.modifiers.clone(),
                    location:  field.location.clone(),
                })
                .collect(),
            visibility: Visibility::Public,
            module: ModulePath::default(),
            location: location(),
        }
    }

    fn request<'a>(fields: Vec<FieldSpec>, constructors: &'a [Constructor], accessors: &'a [Accessor]) -> PlanRequest<'a> {
        PlanRequest {
            target: target(),
            suffix: DEFAULT_SUFFIX,
            visibility: Visibility::Public,
            fields,
            constructors,
            accessors,
            entry_point: true,
            module: ModulePath::default(),
            location: location(),
        }
    }

    fn pair_fields() -> Vec<FieldSpec> {
        vec![
            field("a", TypeRef::path("String")),
            field("b", TypeRef::generic("Option", vec![TypeRef::path("String")])),
        ]
    }

    #[test]
    fn required_follows_nullability() {
        let fields = pair_fields();
        let constructors = [constructor(ConstructorKind::Memberwise, &fields)];
        let mut diagnostics = Diagnostics::new();
        let plan = plan(request(fields, &constructors, &[]), &mut diagnostics);

        let plan = plan.map_err(|d| d.message);
        let required: Result<Vec<_>, _> = plan
            .as_ref()
            .map(|plan| plan.fields.iter().map(|f| (f.name.as_str(), f.required)).collect());
        assert_eq!(required, Ok(vec![("a", true), ("b", false)]));
        assert_eq!(plan.map(|plan| plan.unit), Ok("PairBuilder".to_string()));
    }

    #[test]
    fn named_constructor_keeps_parameter_order() {
        let fields = pair_fields();
        let reversed: Vec<_> = fields.iter().rev().cloned().collect();
        let constructors = [constructor(ConstructorKind::Function("new".to_string()), &reversed)];
        let mut diagnostics = Diagnostics::new();
        let plan = plan(request(fields, &constructors, &[]), &mut diagnostics);

        assert_eq!(
            plan.map(|plan| plan.construction).map_err(|d| d.message),
            Ok(Construction::Constructor {
                name:      "new".to_string(),
                arguments: vec!["b".to_string(), "a".to_string()],
            })
        );
    }

    #[test]
    fn reserved_names_abandon_the_builder() {
        let fields = vec![field("build", TypeRef::Primitive("u8".to_string()))];
        let constructors = [constructor(ConstructorKind::Memberwise, &fields)];
        let mut diagnostics = Diagnostics::new();
        let error = plan(request(fields, &constructors, &[]), &mut diagnostics).map_err(|d| d.message);
        assert!(error.is_err_and(|message| message.contains("field `build` collides")));
    }

    #[test]
    fn impl_trait_fields_abandon_the_builder() {
        let fields = vec![field("render", TypeRef::ImplTrait("impl Display".to_string()))];
        let constructors = [constructor(ConstructorKind::Memberwise, &fields)];
        let mut diagnostics = Diagnostics::new();
        assert!(plan(request(fields, &constructors, &[]), &mut diagnostics).is_err());
    }

    #[test]
    fn missing_constructor_abandons_the_builder() {
        let fields = pair_fields();
        let constructors = [constructor(ConstructorKind::Memberwise, &fields[..1])];
        let mut diagnostics = Diagnostics::new();
        let error = plan(request(fields, &constructors, &[]), &mut diagnostics).map_err(|d| d.message);
        assert_eq!(error, Err("no constructor of `Pair` accepts exactly (a, b)".to_string()));
    }

    #[test]
    fn defaults_are_quoted_for_string_like_types() {
        let mut name = field("name", TypeRef::path("String"));
        name.modifiers.default_value = Some("Anonymous".to_string());
        let mut quoted = field("title", TypeRef::path("String"));
        quoted.modifiers.default_value = Some("\"Dr\"".to_string());
        let mut count = field("count", TypeRef::Primitive("u32".to_string()));
        count.modifiers.default_value = Some("42".to_string());
        let mut absent = field("nickname", TypeRef::generic("Option", vec![TypeRef::path("String")]));
        absent.modifiers.default_value = Some("None".to_string());
        let mut broken = field("ratio", TypeRef::Primitive("f32".to_string()));
        broken.modifiers.default_value = Some("1.0 +".to_string());

        let fields = vec![name, quoted, count, absent, broken];
        let constructors = [constructor(ConstructorKind::Memberwise, &fields)];
        let mut diagnostics = Diagnostics::new();
        let plan = plan(request(fields, &constructors, &[]), &mut diagnostics).map_err(|d| d.message);

        let defaults: Result<Vec<_>, _> = plan.map(|plan| plan.fields.into_iter().map(|f| f.default).collect());
        assert_eq!(
            defaults,
            Ok(vec![
                Some("\"Anonymous\"".to_string()),
                Some("\"Dr\"".to_string()),
                Some("42".to_string()),
                None,
                None,
            ])
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn nullable_defaults_may_spell_out_some() {
        let optional = |name: &str, inner: TypeRef, raw: &str| {
            let mut spec = field(name, TypeRef::generic("Option", vec![inner]));
            spec.modifiers.default_value = Some(raw.to_string());
            spec
        };
        let fields = vec![
            optional("timeout", TypeRef::Primitive("u32".to_string()), "Some(30)"),
            optional("retries", TypeRef::Primitive("u32".to_string()), "3"),
            optional("motd", TypeRef::path("String"), "Some(\"hi\")"),
            optional("banner", TypeRef::path("String"), "core::option::Option::Some(welcome)"),
        ];
        let constructors = [constructor(ConstructorKind::Memberwise, &fields)];
        let mut diagnostics = Diagnostics::new();
        let plan = plan(request(fields, &constructors, &[]), &mut diagnostics).map_err(|d| d.message);

        let defaults: Result<Vec<_>, _> = plan.map(|plan| plan.fields.into_iter().map(|f| f.default).collect());
        assert_eq!(
            defaults,
            Ok(vec![
                Some("30".to_string()),
                Some("3".to_string()),
                Some("\"hi\"".to_string()),
                Some("\"welcome\"".to_string()),
            ])
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn copy_requires_matching_accessor_type() {
        let mut scores = field(
            "scores",
            TypeRef::generic("Vec", vec![TypeRef::Primitive("u32".to_string())]),
        );
        scores.modifiers.nullable_element = true;
        let fields = vec![field("a", TypeRef::path("String")), scores];
        let optional_u32 = TypeRef::generic("Option", vec![TypeRef::Primitive("u32".to_string())]);
        let parameters = [
            field("a", TypeRef::path("String")),
            field("scores", TypeRef::generic("Vec", vec![optional_u32])),
        ];
        let constructors = [constructor(ConstructorKind::Function("new".to_string()), &parameters)];
        let accessors = [
            Accessor {
                property: "a".to_string(),
                kind:     AccessorKind::Getter("a".to_string()),
                ty:       TypeRef::path("String"),
            },
            Accessor {
                property: "scores".to_string(),
                kind:     AccessorKind::Field,
                ty:       TypeRef::generic("Vec", vec![TypeRef::Primitive("u32".to_string())]),
            },
        ];
        let mut diagnostics = Diagnostics::new();
        let plan = plan(request(fields, &constructors, &accessors), &mut diagnostics).map_err(|d| d.message);

        let copies: Result<Vec<_>, _> = plan.map(|plan| plan.fields.into_iter().map(|f| f.copy).collect());
        assert_eq!(copies, Ok(vec![Some(AccessorKind::Getter("a".to_string())), None]));
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn modifier_the_constructor_does_not_accept_is_dropped() {
        let mut names = field("names", TypeRef::generic("Vec", vec![TypeRef::path("String")]));
        names.modifiers.nullable_element = true;
        let fields = vec![names];
        let constructors = [constructor(ConstructorKind::Memberwise, &fields)];
        let mut diagnostics = Diagnostics::new();
        let plan = plan(request(fields, &constructors, &[]), &mut diagnostics).map_err(|d| d.message);

        let types: Result<Vec<_>, _> =
            plan.map(|plan| plan.fields.iter().map(|f| f.descriptor.to_string()).collect());
        assert_eq!(types, Ok(vec!["Vec<String>".to_string()]));
        let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).map(|d| d.message.clone()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("`Pair` is constructed from `Vec<String>`"));
    }

    #[test]
    fn suffix_must_form_an_identifier() {
        let fields = pair_fields();
        let constructors = [constructor(ConstructorKind::Memberwise, &fields)];
        let mut diagnostics = Diagnostics::new();
        let mut bad = request(fields, &constructors, &[]);
        bad.suffix = "-Maker";
        assert!(plan(bad, &mut diagnostics).is_err());
    }
}
