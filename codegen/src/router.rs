//! Routing directives to builder plans.
//!
//! Self-directives are routed before external ones, each group in source
//! order. When two plans share a unit name the later one replaces the earlier
//! and says so in a note. If both are included into the same module the
//! definitions clash, which is an error.

use std::collections::HashMap;

use tracing::debug;

use crate::diagnostics::{Diagnostic, Diagnostics, Location};
use crate::host::{Constructor, DeclaredType, Directive, DirectiveKind, Introspect, ModulePath, Shape, Visibility};
use crate::plan::{BuilderPlan, DEFAULT_SUFFIX, FieldSpec, PlanRequest, Target, plan};
use crate::resolve::TypeMetadata;

/// The result of routing one directive.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The directive that was routed.
    pub directive:   Directive,
    /// The plan, or the error that abandoned it.
    pub result:      Result<BuilderPlan, Diagnostic>,
    /// Everything else reported along the way.
    pub diagnostics: Diagnostics,
}

impl Outcome {
    /// The plan, if routing succeeded.
    #[must_use]
    pub fn plan(&self) -> Option<&BuilderPlan> { self.result.as_ref().ok() }
}

/// Route every directive of `host`, one [`Outcome`] per directive.
pub fn route(host: &impl Introspect) -> Vec<Outcome> {
    let (external, own): (Vec<&Directive>, Vec<&Directive>) =
        host.directives().iter().partition(|directive| directive.is_external());

    let mut outcomes: Vec<Outcome> = own
        .into_iter()
        .chain(external)
        .map(|directive| route_directive(host, directive))
        .collect();

    let mut seen: HashMap<String, (ModulePath, Location)> = HashMap::new();
    for outcome in &mut outcomes {
        let Ok(plan) = &outcome.result else {
            continue;
        };
        let Some((module, earlier)) = seen.insert(plan.unit.clone(), (plan.module.clone(), plan.location.clone()))
        else {
            continue;
        };
        if module == plan.module {
            outcome.diagnostics.error(
                format!(
                    "`{}` is also requested at {earlier}; both directives include it into `{module}`, so it would be defined twice. Remove one directive or give one a different suffix",
                    plan.unit
                ),
                plan.location.clone(),
            );
        } else {
            outcome.diagnostics.note(
                format!("`{}` replaces the builder of the same name requested at {earlier}", plan.unit),
                plan.location.clone(),
            );
        }
    }
    outcomes
}

fn route_directive(host: &impl Introspect, directive: &Directive) -> Outcome {
    let mut diagnostics = Diagnostics::new();
    let result = match &directive.kind {
        DirectiveKind::Type { name } => route_type(host, directive, name, &mut diagnostics),
        DirectiveKind::Constructor {
            type_name,
            constructor,
        } => route_constructor(host, directive, type_name, constructor, &mut diagnostics),
        DirectiveKind::External {
            target,
            suffix,
            use_constructors,
            visibility,
        } => route_external(
            host,
            directive,
            &External {
                target,
                suffix: suffix.as_deref().unwrap_or(DEFAULT_SUFFIX),
                use_constructors: *use_constructors,
                visibility,
            },
            &mut diagnostics,
        ),
        DirectiveKind::Misplaced { item } => Err(Diagnostic::error(
            format!("builder directives belong on structs with named fields or on associated constructors, not on {item}"),
            directive.location.clone(),
        )),
    };

    match &result {
        Ok(plan) => debug!("Routed {} to {}", directive.location, plan.unit),
        Err(error) => debug!("Rejected {}: {}", directive.location, error.message),
    }
    Outcome {
        directive: directive.clone(),
        result,
        diagnostics,
    }
}

/// Look up a struct with named fields.
fn named_struct<'h>(
    host: &'h impl Introspect,
    path: &str,
    directive: &Directive,
) -> Result<&'h DeclaredType, Diagnostic> {
    let declared = host.find_type(path, &directive.module).ok_or_else(|| {
        Diagnostic::error(
            format!("cannot find type `{path}` in the scanned sources"),
            directive.location.clone(),
        )
    })?;
    if declared.shape != Shape::Named {
        return Err(Diagnostic::error(
            format!(
                "`{}` is a {}; builders need a struct with named fields",
                declared.name, declared.shape
            ),
            directive.location.clone(),
        ));
    }
    Ok(declared)
}

/// How code in `from` names `declared`.
fn local_path(declared: &DeclaredType, from: &ModulePath) -> String {
    if declared.module == *from {
        declared.name.clone()
    } else {
        let mut path = vec!["crate".to_string()];
        path.extend(declared.module.segments.iter().cloned());
        path.push(declared.name.clone());
        path.join("::")
    }
}

fn target(declared: &DeclaredType, path: String) -> Target {
    Target {
        name: declared.name.clone(),
        path,
        generics: declared.generics.clone(),
        where_clause: declared.where_clause.clone(),
    }
}

fn verbatim(constructor: &Constructor) -> Vec<FieldSpec> {
    constructor
        .parameters
        .iter()
        .map(|parameter| FieldSpec {
            name:      parameter.name.clone(),
            ty:        parameter.ty.clone(),
            modifiers: parameter.modifiers.clone(),
            location:  parameter.location.clone(),
        })
        .collect()
}

fn eligible(metadata: &TypeMetadata<'_>) -> Vec<FieldSpec> {
    metadata
        .eligible_fields()
        .into_iter()
        .map(|field| FieldSpec {
            name:      field.name.clone(),
            ty:        field.ty.clone(),
            modifiers: metadata.effective_modifiers(field),
            location:  field.location.clone(),
        })
        .collect()
}

fn route_type(
    host: &impl Introspect,
    directive: &Directive,
    name: &str,
    diagnostics: &mut Diagnostics,
) -> Result<BuilderPlan, Diagnostic> {
    let declared = named_struct(host, name, directive)?;
    let metadata = TypeMetadata::resolve(host, declared);
    let accessors = host.resolve_accessors(declared, &directive.module);

    plan(
        PlanRequest {
            target:       target(declared, local_path(declared, &directive.module)),
            suffix:       DEFAULT_SUFFIX,
            visibility:   declared.visibility.clone(),
            fields:       eligible(&metadata),
            constructors: &metadata.constructors,
            accessors:    &accessors,
            entry_point:  true,
            module:       directive.module.clone(),
            location:     directive.location.clone(),
        },
        diagnostics,
    )
}

fn route_constructor(
    host: &impl Introspect,
    directive: &Directive,
    type_name: &str,
    constructor: &str,
    diagnostics: &mut Diagnostics,
) -> Result<BuilderPlan, Diagnostic> {
    let declared = named_struct(host, type_name, directive)?;
    let metadata = TypeMetadata::resolve(host, declared);
    let chosen = metadata.constructor_named(constructor).ok_or_else(|| {
        Diagnostic::error(
            format!("cannot find constructor `{type_name}::{constructor}`"),
            directive.location.clone(),
        )
    })?;
    let accessors = host.resolve_accessors(declared, &directive.module);

    plan(
        PlanRequest {
            target:       target(declared, local_path(declared, &directive.module)),
            suffix:       DEFAULT_SUFFIX,
            visibility:   declared.visibility.clone(),
            fields:       verbatim(chosen),
            constructors: std::slice::from_ref(chosen),
            accessors:    &accessors,
            entry_point:  true,
            module:       directive.module.clone(),
            location:     directive.location.clone(),
        },
        diagnostics,
    )
}

/// Arguments of a `builder_of` directive.
struct External<'a> {
    target:           &'a str,
    suffix:           &'a str,
    use_constructors: bool,
    visibility:       &'a Visibility,
}

fn route_external(
    host: &impl Introspect,
    directive: &Directive,
    external: &External<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<BuilderPlan, Diagnostic> {
    let declared = named_struct(host, external.target, directive)?;
    let metadata = TypeMetadata::resolve(host, declared);
    let accessible: Vec<Constructor> = metadata
        .constructors
        .iter()
        .filter(|constructor| constructor.is_accessible_from(&directive.module))
        .cloned()
        .collect();
    let Some(primary) = accessible.first() else {
        return Err(Diagnostic::error(
            format!(
                "`{}` has no constructor accessible from `{}`",
                external.target, directive.module
            ),
            directive.location.clone(),
        ));
    };

    let (fields, constructors) = if external.use_constructors {
        (verbatim(primary), std::slice::from_ref(primary))
    } else {
        (eligible(&metadata), accessible.as_slice())
    };
    let accessors = host.resolve_accessors(declared, &directive.module);

    plan(
        PlanRequest {
            target: target(declared, external.target.to_string()),
            suffix: external.suffix,
            visibility: external.visibility.clone(),
            fields,
            constructors,
            accessors: &accessors,
            entry_point: false,
            module: directive.module.clone(),
            location: directive.location.clone(),
        },
        diagnostics,
    )
}
