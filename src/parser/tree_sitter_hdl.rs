use tree_sitter::{Language, Parser, Tree};

use super::cst::{SyntaxTree, TreeBuilder, ERROR_KIND};
use super::grammar::Grammar;
use crate::error::{ExtractionError, Result};
use crate::ir::HdlLanguage;

/// Grammar backed by a tree-sitter language.
///
/// Node kinds are copied unchanged; the extractors learn which kinds play
/// which role from the dialect's [`LanguageProfile`](super::profile::LanguageProfile).
pub struct TreeSitterGrammar {
    language: HdlLanguage,
    ts_language: Language,
}

impl std::fmt::Debug for TreeSitterGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterGrammar")
            .field("language", &self.language)
            .field("abi_version", &self.ts_language.abi_version())
            .finish()
    }
}

impl TreeSitterGrammar {
    pub fn new(language: HdlLanguage, ts_language: Language) -> Result<Self> {
        // Reject ABI mismatches up front instead of on the first parse
        Self::parser_for(language, &ts_language)?;
        Ok(Self {
            language,
            ts_language,
        })
    }

    fn parser_for(language: HdlLanguage, ts_language: &Language) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(ts_language)
            .map_err(|e| ExtractionError::GrammarUnavailable {
                language,
                reason: e.to_string(),
            })?;
        Ok(parser)
    }
}

impl Grammar for TreeSitterGrammar {
    fn language(&self) -> HdlLanguage {
        self.language
    }

    fn name(&self) -> &str {
        "tree-sitter"
    }

    fn parse(&self, source: &str) -> Result<SyntaxTree> {
        let mut parser = Self::parser_for(self.language, &self.ts_language)?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ExtractionError::GrammarUnavailable {
                language: self.language,
                reason: "parser returned no tree".to_string(),
            })?;
        Ok(convert(&tree, source))
    }
}

/// Copy a tree-sitter tree into an owned [`SyntaxTree`].
///
/// Zero-width nodes the parser inserted to recover (`MISSING identifier`)
/// become `ERROR` leaves, so a unit whose name was never written has no
/// name node.
pub fn convert(tree: &Tree, source: &str) -> SyntaxTree {
    let mut builder = TreeBuilder::new(source);
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        let field = cursor.field_name();
        let kind = if node.is_error() || node.is_missing() {
            ERROR_KIND
        } else {
            node.kind()
        };
        let named = node.is_named() || node.is_missing();
        if node.child_count() == 0 {
            builder.leaf(kind, named, field, node.start_byte(), node.end_byte());
        } else {
            builder.start_node(kind, named, field, node.start_byte(), node.end_byte());
            if cursor.goto_first_child() {
                continue;
            }
            builder.finish_node();
        }

        // Climb until a sibling is found, closing every interior node we leave
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return builder.finish();
            }
            builder.finish_node();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vhdl() -> TreeSitterGrammar {
        TreeSitterGrammar::new(HdlLanguage::Vhdl, tree_sitter_vhdl::LANGUAGE.into()).unwrap()
    }

    fn verilog() -> TreeSitterGrammar {
        TreeSitterGrammar::new(HdlLanguage::Verilog, tree_sitter_verilog::LANGUAGE.into()).unwrap()
    }

    #[test]
    fn test_bridge_copies_structure() {
        let source = "entity e is\n  port (a : in bit);\nend;\n";
        let tree = vhdl().parse(source).unwrap();
        let root = tree.root();
        assert_eq!(root.kind(), "design_file");
        assert_eq!(root.text(), source);
        assert!(!tree.has_error());
        let entity = root.find_first(&["entity_declaration"]).unwrap();
        assert_eq!(entity.child_by_field("entity").unwrap().text(), "e");
        let port = root.find_first(&["interface_declaration"]).unwrap();
        assert_eq!(port.start_row(), 1);
        assert_eq!(port.text(), "a : in bit");
    }

    #[test]
    fn test_bridge_keeps_unnamed_tokens() {
        let tree = verilog().parse("module m (input a); endmodule").unwrap();
        let list = tree.root().find_first(&["list_of_port_declarations"]).unwrap();
        let first = list.children().next().unwrap();
        assert_eq!(first.kind(), "(");
        assert!(!first.is_named());
        assert_eq!(list.named_children().count(), 1);
    }

    #[test]
    fn test_bridge_marks_missing_nodes() {
        let tree = vhdl().parse("package is\n constant a : integer := 1;\nend package;\n").unwrap();
        assert!(tree.has_error());
        let package = tree.root().find_first(&["package_declaration"]).unwrap();
        assert!(package.child_by_kind("identifier").is_none());
    }

    #[test]
    fn test_bridge_marks_errors() {
        let tree = verilog().parse("module broken (input a,\n  always @(posedge").unwrap();
        assert!(tree.has_error());
        assert!(tree.root().find_first(&["module_declaration"]).is_none());
    }
}
