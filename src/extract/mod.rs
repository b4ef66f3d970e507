//! Structural extractors that turn a [`SyntaxTree`](crate::parser::cst::SyntaxTree)
//! into the documentation model.

pub mod body;
pub mod classify;
pub mod comments;
pub mod declarations;
pub mod doxygen;
pub mod interface;
pub mod regions;

pub use body::extract_body;
pub use classify::{classify_and_extract, unit_name};
pub use comments::{CommentAssociator, CommentOutcome, Documented};
pub use declarations::{extract_declarations, RegionMode};
pub use interface::{extract_interface, Interface};

use crate::config::ExtractConfig;
use crate::constants::{DEFAULT_DOC_SYMBOL, DEFAULT_FSM_MARKER};
use crate::fsm::FsmOptions;
use crate::ir::HdlLanguage;
use crate::parser::cst::Node;
use crate::parser::profile::LanguageProfile;
use crate::utils::{collapse_whitespace, strip_assignment};

/// Settings for one extraction pass over one tree.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub profile: &'static LanguageProfile,
    pub doc_symbol: &'a str,
    pub fsm_marker: &'a str,
    pub fsm: FsmOptions,
}

impl<'a> ExtractContext<'a> {
    pub fn new(language: HdlLanguage, doc_symbol: &'a str) -> Self {
        Self {
            profile: language.profile(),
            doc_symbol,
            fsm_marker: DEFAULT_FSM_MARKER,
            fsm: FsmOptions::default(),
        }
    }

    pub fn from_config(config: &'a ExtractConfig, language: HdlLanguage) -> Self {
        Self {
            profile: language.profile(),
            doc_symbol: &config.doc_symbol,
            fsm_marker: &config.fsm_marker,
            fsm: config.fsm,
        }
    }

    pub fn language(&self) -> HdlLanguage {
        self.profile.language
    }

    pub(crate) fn associator(&self) -> CommentAssociator<'a> {
        CommentAssociator::new(self.profile, self.doc_symbol)
    }
}

impl Default for ExtractContext<'static> {
    fn default() -> Self {
        Self::new(HdlLanguage::Vhdl, DEFAULT_DOC_SYMBOL)
    }
}

/// Every comment kind of both grammars; kinds never clash across dialects.
pub(crate) const COMMENT_KINDS: &[&str] = &["comment", "line_comment", "block_comment"];

/// Text of the first `identifier` child, if it is non-empty.
pub(crate) fn identifier_of<'t>(node: Node<'t>) -> Option<&'t str> {
    node.child_by_kind("identifier")
        .map(|n| n.text())
        .filter(|name| !name.is_empty())
}

/// Declared name of a library unit (entity, module, package, architecture).
pub(crate) fn unit_identifier<'t>(node: Node<'t>, profile: &LanguageProfile) -> Option<&'t str> {
    let holder = node.child_by_kinds(profile.unit_name_kinds).unwrap_or(node);
    holder
        .child_by_kinds(profile.identifier_kinds)
        .map(|n| n.text())
        .filter(|name| !name.is_empty())
}

/// Name in a `label_declaration` child (`name :`).
pub(crate) fn label_of<'t>(node: Node<'t>) -> Option<&'t str> {
    node.child_by_kind("label_declaration")
        .and_then(|decl| decl.child_by_kind("label"))
        .map(|label| label.text())
}

/// Node text on one line, embedded comments removed.
pub(crate) fn flat_text(node: Node<'_>) -> String {
    collapse_whitespace(&node.text_excluding(COMMENT_KINDS))
}

/// Names listed in a VHDL `identifier_list`.
pub(crate) fn listed_names<'t>(list: Node<'t>) -> Vec<&'t str> {
    list.named_children()
        .filter(|n| !COMMENT_KINDS.contains(&n.kind()))
        .map(|n| n.text())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Default value of a VHDL object or interface declaration.
pub(crate) fn initial_value(node: Node<'_>) -> String {
    node.child_by_kind("initialiser")
        .map(|init| strip_assignment(&flat_text(init)))
        .unwrap_or_default()
}

/// Region items in order, with single-item wrappers looked through.
pub(crate) fn region_items<'t>(region: Node<'t>, profile: &LanguageProfile) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    for child in region.children() {
        let mut item = child;
        while profile.is_item_wrapper(item.kind()) {
            match item.named_children().next() {
                Some(inner) => item = inner,
                None => break,
            }
        }
        out.push(item);
    }
    out
}

/// Text between the start of `decl` and its `list_kind` child, such as the
/// `wire [3:0]` of `wire [3:0] a, b;`.
pub(crate) fn type_prefix(decl: Node<'_>, list_kind: &str) -> String {
    let Some(list) = decl.child_by_kind(list_kind) else {
        return String::new();
    };
    let source = &decl.text()[..list.start_byte() - decl.start_byte()];
    collapse_whitespace(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grammar;

    fn parse(language: HdlLanguage, source: &str) -> std::sync::Arc<crate::parser::SyntaxTree> {
        grammar::load(language).unwrap().parse(source).unwrap()
    }

    #[test]
    fn test_type_prefix_and_wrappers() {
        let tree = parse(HdlLanguage::Verilog, "module m; wire [3:0] a, b; endmodule");
        let module = tree.root().find_first(&["module_declaration"]).unwrap();
        let items = region_items(module, HdlLanguage::Verilog.profile());
        let decl = items.iter().find(|n| n.kind() == "net_declaration").unwrap();
        assert_eq!(type_prefix(*decl, "list_of_net_decl_assignments"), "wire [3:0]");
        assert_eq!(unit_identifier(module, HdlLanguage::Verilog.profile()), Some("m"));
    }

    #[test]
    fn test_flat_text_drops_comments() {
        let tree = parse(
            HdlLanguage::Vhdl,
            "package p is
  function f(a : bit; -- first
    b : bit) return bit;
end;
",
        );
        let params = tree.root().find_first(&["parameter_list_specification"]).unwrap();
        assert_eq!(flat_text(params), "(a : bit; b : bit)");
    }

    #[test]
    fn test_vhdl_names_and_labels() {
        let tree = parse(
            HdlLanguage::Vhdl,
            "architecture a of e is
  signal x, y : bit := '1';
begin
  p : process begin wait; end process;
end;
",
        );
        let signal = tree.root().find_first(&["signal_declaration"]).unwrap();
        let names = listed_names(signal.child_by_kind("identifier_list").unwrap());
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(initial_value(signal), "'1'");
        let process = tree.root().find_first(&["process_statement"]).unwrap();
        assert_eq!(label_of(process), Some("p"));
        let arch = tree.root().find_first(&["architecture_definition"]).unwrap();
        assert_eq!(unit_identifier(arch, HdlLanguage::Vhdl.profile()), Some("a"));
    }
}
