//! Classification of a source file as an entity or a package, and assembly of
//! the full model.

use tracing::debug;

use super::declarations::{extract_declarations, RegionMode};
use super::doxygen::split_tags;
use super::interface::{extract_interface, Interface};
use super::{body::extract_body, regions, unit_identifier, ExtractContext};
use crate::error::{ExtractionError, Result};
use crate::ir::{
    CompilationUnit, EntityDocument, EntityModel, PackageDocument, PackageModel, UnitKind,
    UnitName,
};
use crate::parser::cst::{Node, SyntaxTree};

/// The primary units of a file with the documentation found above each.
struct PrimaryUnits<'t> {
    entity: Option<(Node<'t>, String)>,
    package: Option<(Node<'t>, String)>,
}

fn primary_units<'t>(tree: &'t SyntaxTree, ctx: &ExtractContext<'_>) -> PrimaryUnits<'t> {
    let profile = ctx.profile;
    let mut assoc = ctx.associator();
    let mut units = PrimaryUnits {
        entity: None,
        package: None,
    };
    for node in regions::top_level(tree, profile) {
        if profile.is_comment(node.kind()) {
            assoc.comment(node, |_, _| false);
        } else if units.entity.is_none() && regions::is_named_unit(node, profile.entity_kind, profile) {
            units.entity = Some((node, assoc.take()));
        } else if units.package.is_none() && regions::is_named_unit(node, profile.package_kind, profile) {
            units.package = Some((node, assoc.take()));
        } else if node.is_named() {
            assoc.interrupt(node);
        }
    }
    units
}

/// Recoverable sub-block failures leave an empty block behind.
fn best_effort<T: Default>(result: Result<T>, what: &str) -> Result<T> {
    match result {
        Err(e) if e.is_recoverable() => {
            debug!("No {} extracted: {}", what, e);
            Ok(T::default())
        }
        other => other,
    }
}

/// Classify the tree and extract the complete model of its primary unit.
pub fn classify_and_extract(tree: &SyntaxTree, ctx: &ExtractContext<'_>) -> Result<CompilationUnit> {
    let units = primary_units(tree, ctx);

    if let Some((node, description)) = units.entity {
        let name = unit_identifier(node, ctx.profile).unwrap_or_default().to_string();
        let (description, info) = split_tags(&description);
        let Interface {
            generics,
            ports,
            virtual_buses,
        } = extract_interface(node, ctx);
        let declarations = best_effort(
            extract_declarations(tree, RegionMode::Architecture, ctx),
            "architecture declarations",
        )?;
        let body = best_effort(extract_body(tree, &name, ctx), "architecture body")?;
        debug!(
            "Extracted {} {}: {} generics, {} ports, {} processes",
            ctx.language(),
            name,
            generics.len(),
            ports.len(),
            body.processes.len()
        );
        return Ok(CompilationUnit::Entity(EntityDocument {
            language: ctx.language(),
            entity: EntityModel {
                name,
                description,
                info,
                generics,
                ports,
                virtual_buses,
            },
            declarations,
            body,
        }));
    }

    if let Some((node, description)) = units.package {
        let name = unit_identifier(node, ctx.profile).unwrap_or_default().to_string();
        let (description, info) = split_tags(&description);
        let declarations = best_effort(
            extract_declarations(tree, RegionMode::Package, ctx),
            "package declarations",
        )?;
        return Ok(CompilationUnit::Package(PackageDocument {
            language: ctx.language(),
            package: PackageModel {
                name,
                description,
                info,
            },
            declarations,
        }));
    }

    Err(ExtractionError::NoParseableUnit)
}

/// Name and kind of the primary unit, without extracting anything else.
pub fn unit_name(tree: &SyntaxTree, ctx: &ExtractContext<'_>) -> Result<UnitName> {
    let units = primary_units(tree, ctx);
    let (node, kind) = match (units.entity, units.package) {
        (Some((node, _)), _) => (node, UnitKind::Entity),
        (None, Some((node, _))) => (node, UnitKind::Package),
        (None, None) => return Err(ExtractionError::NoParseableUnit),
    };
    Ok(UnitName {
        name: unit_identifier(node, ctx.profile).unwrap_or_default().to_string(),
        kind,
    })
}
