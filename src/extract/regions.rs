//! Lookup of the library units and regions the extractors walk.

use tracing::debug;

use super::unit_identifier;
use crate::error::{ExtractionError, Result};
use crate::parser::cst::{Node, SyntaxTree};
use crate::parser::profile::LanguageProfile;

/// Top-level siblings in source order, with design-unit wrappers expanded.
pub fn top_level<'t>(tree: &'t SyntaxTree, profile: &LanguageProfile) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    for child in tree.root().children() {
        match profile.unit_wrapper {
            Some(wrapper) if child.kind() == wrapper => out.extend(child.children()),
            _ => out.push(child),
        }
    }
    out
}

/// A unit of `kind` is only usable when its name was actually written.
pub fn is_named_unit(node: Node<'_>, kind: &str, profile: &LanguageProfile) -> bool {
    node.kind() == kind && unit_identifier(node, profile).is_some_and(|name| !name.is_empty())
}

/// First entity (or module) with a non-empty name.
pub fn find_entity<'t>(tree: &'t SyntaxTree, profile: &LanguageProfile) -> Option<Node<'t>> {
    top_level(tree, profile)
        .into_iter()
        .find(|n| is_named_unit(*n, profile.entity_kind, profile))
}

/// First package with a non-empty name.
pub fn find_package<'t>(tree: &'t SyntaxTree, profile: &LanguageProfile) -> Option<Node<'t>> {
    top_level(tree, profile)
        .into_iter()
        .find(|n| is_named_unit(*n, profile.package_kind, profile))
}

/// Entity named in an architecture's `of` clause.
fn architecture_of<'t>(arch: Node<'t>) -> Option<&'t str> {
    arch.child_by_field("entity")
        .or_else(|| arch.child_by_kind("name"))
        .map(|name| name.text().trim())
}

/// The architecture implementing `entity_name`, else the first one in the file.
pub fn select_architecture<'t>(
    tree: &'t SyntaxTree,
    profile: &LanguageProfile,
    entity_name: &str,
) -> Option<Node<'t>> {
    let kind = profile.architecture_kind?;
    let candidates: Vec<Node<'t>> = top_level(tree, profile)
        .into_iter()
        .filter(|n| n.kind() == kind)
        .collect();
    let matching = candidates.iter().copied().find(|arch| {
        architecture_of(*arch).is_some_and(|of| profile.same_name(of, entity_name))
    });
    if matching.is_none() && candidates.len() > 1 {
        debug!(
            "No architecture of {:?}, using the first of {}",
            entity_name,
            candidates.len()
        );
    }
    matching.or_else(|| candidates.first().copied())
}

/// Node holding the implementation of the entity: the architecture for
/// dialects that split units, the module itself otherwise.
pub fn implementation<'t>(
    tree: &'t SyntaxTree,
    profile: &LanguageProfile,
    entity_name: &str,
) -> Option<Node<'t>> {
    match profile.architecture_kind {
        Some(_) => select_architecture(tree, profile, entity_name),
        None => find_entity(tree, profile),
    }
}

/// Child region `kind` of `owner`, or the owner itself when its items are
/// direct children.
pub fn region<'t>(owner: Node<'t>, kind: Option<&'static str>, name: &'static str) -> Result<Node<'t>> {
    match kind {
        None => Ok(owner),
        Some(kind) => owner
            .child_by_kind(kind)
            .ok_or(ExtractionError::MalformedRegion { region: name }),
    }
}

/// Name of the first entity in the tree, if any.
pub fn entity_name<'t>(tree: &'t SyntaxTree, profile: &LanguageProfile) -> Option<&'t str> {
    find_entity(tree, profile).and_then(|entity| unit_identifier(entity, profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::HdlLanguage;
    use crate::parser::grammar;
    use crate::parser::profile::{VERILOG, VHDL};
    use std::sync::Arc;

    const TWO_ARCHS: &str = "\
entity top is end;
architecture sim of other is begin end;
architecture rtl of TOP is begin end;
";

    fn parse(language: HdlLanguage, source: &str) -> Arc<SyntaxTree> {
        grammar::load(language).unwrap().parse(source).unwrap()
    }

    #[test]
    fn test_top_level_expands_design_units() {
        let tree = parse(HdlLanguage::Vhdl, "library ieee;\nentity e is end;\n");
        let kinds: Vec<&str> = top_level(&tree, &VHDL).iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec!["library_clause", "entity_declaration"]);
    }

    #[test]
    fn test_architecture_matched_by_entity_name() {
        let tree = parse(HdlLanguage::Vhdl, TWO_ARCHS);
        let arch = select_architecture(&tree, &VHDL, "top").unwrap();
        assert_eq!(unit_identifier(arch, &VHDL), Some("rtl"));
        let fallback = select_architecture(&tree, &VHDL, "missing").unwrap();
        assert_eq!(unit_identifier(fallback, &VHDL), Some("sim"));
    }

    #[test]
    fn test_nameless_package_is_not_found() {
        let tree = parse(
            HdlLanguage::Vhdl,
            "package is\n constant a : integer := 1;\nend package;\n",
        );
        assert!(find_package(&tree, &VHDL).is_none());
        let tree = parse(HdlLanguage::Vhdl, "package p is\nend package;\n");
        assert!(find_package(&tree, &VHDL).is_some());
    }

    #[test]
    fn test_verilog_module_is_its_own_implementation() {
        let tree = parse(HdlLanguage::Verilog, "module m; endmodule\n");
        let module = implementation(&tree, &VERILOG, "m").unwrap();
        assert_eq!(module.kind(), "module_declaration");
        assert_eq!(entity_name(&tree, &VERILOG), Some("m"));
        assert_eq!(region(module, None, "module").unwrap(), module);
        assert!(matches!(
            region(module, Some("architecture_head"), "declarative"),
            Err(ExtractionError::MalformedRegion { region: "declarative" })
        ));
    }
}
