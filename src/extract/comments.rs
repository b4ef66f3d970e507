//! Association of documentation comments with the declarations they describe.
//!
//! A sibling run is walked in source order. Doc comments accumulate in a
//! pending buffer that the next declaration takes as its description; any
//! other node clears it. A comment that starts on the same row as a
//! declaration already emitted in the scope documents that declaration
//! instead.

use crate::ir::{
    ConstantDecl, FunctionDecl, Generic, Instantiation, Port, Process, SignalDecl, TypeDecl,
};
use crate::parser::cst::Node;
use crate::parser::profile::LanguageProfile;
use crate::utils::normalize_description;

/// A model element that carries a description and a source row.
pub trait Documented {
    fn source_line(&self) -> usize;
    fn set_description(&mut self, description: String);
}

macro_rules! impl_documented {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Documented for $ty {
                fn source_line(&self) -> usize {
                    self.source_line
                }

                fn set_description(&mut self, description: String) {
                    self.description = description;
                }
            }
        )*
    };
}

impl_documented!(
    Generic,
    Port,
    TypeDecl,
    SignalDecl,
    ConstantDecl,
    FunctionDecl,
    Process,
    Instantiation
);

/// Overwrite the description of every item declared on `row`.
pub fn annotate_row<T: Documented>(items: &mut [T], row: usize, description: &str) -> bool {
    let mut hit = false;
    for item in items.iter_mut().filter(|i| i.source_line() == row) {
        item.set_description(description.to_string());
        hit = true;
    }
    hit
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    /// Not a doc comment; the pending buffer was cleared.
    Skipped,
    Buffered,
    /// Attached to declarations on the comment's own row.
    SameLine,
}

#[derive(Debug)]
pub struct CommentAssociator<'a> {
    profile: &'static LanguageProfile,
    doc_symbol: &'a str,
    pending: String,
}

impl<'a> CommentAssociator<'a> {
    pub fn new(profile: &'static LanguageProfile, doc_symbol: &'a str) -> Self {
        Self {
            profile,
            doc_symbol,
            pending: String::new(),
        }
    }

    /// Documentation text of a comment, or `None` when the doc symbol filter rejects it.
    pub fn doc_body(&self, comment: &str) -> Option<String> {
        let body = self.profile.comment_body(comment);
        if self.doc_symbol.is_empty() {
            return Some(body.trim().to_string());
        }
        body.trim_start()
            .strip_prefix(self.doc_symbol)
            .map(|rest| rest.trim().to_string())
    }

    /// Feed one comment node. `annotate(row, text)` applies a same-line
    /// description to the declarations already emitted on `row` and reports
    /// whether there were any.
    pub fn comment(
        &mut self,
        node: Node<'_>,
        annotate: impl FnOnce(usize, &str) -> bool,
    ) -> CommentOutcome {
        let Some(body) = self.doc_body(node.text()) else {
            self.pending.clear();
            return CommentOutcome::Skipped;
        };
        if annotate(node.start_row(), &body) {
            return CommentOutcome::SameLine;
        }
        self.pending.push_str(&body);
        self.pending.push('\n');
        CommentOutcome::Buffered
    }

    /// A node that documents nothing: drop whatever was pending unless the
    /// node kind is transparent for this dialect.
    pub fn interrupt(&mut self, node: Node<'_>) {
        if !self.profile.is_transparent(node.kind()) {
            self.pending.clear();
        }
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Hand the pending block to the declaration being emitted.
    pub fn take(&mut self) -> String {
        let description = normalize_description(&self.pending);
        self.pending.clear();
        description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::HdlLanguage;
    use crate::parser::grammar;
    use crate::parser::profile::{VERILOG, VHDL};

    #[test]
    fn test_doc_symbol_filter() {
        let assoc = CommentAssociator::new(&VHDL, "!");
        assert_eq!(assoc.doc_body("--! clock input\n").as_deref(), Some("clock input"));
        assert_eq!(assoc.doc_body("--   ! spaced").as_deref(), Some("spaced"));
        assert_eq!(assoc.doc_body("-- plain"), None);

        let dash = CommentAssociator::new(&VHDL, "-");
        assert_eq!(dash.doc_body("--- doc").as_deref(), Some("doc"));
        assert_eq!(dash.doc_body("-- not doc"), None);

        let all = CommentAssociator::new(&VERILOG, "");
        assert_eq!(all.doc_body("// anything").as_deref(), Some("anything"));
        assert_eq!(all.doc_body("/* block */").as_deref(), Some("block"));
    }

    #[test]
    fn test_buffer_and_take() {
        let tree = grammar::load(HdlLanguage::Vhdl)
            .unwrap()
            .parse("--! first\n--! second\n-- ignored\n--! third\n")
            .unwrap();
        let mut assoc = CommentAssociator::new(&VHDL, "!");
        let outcomes: Vec<CommentOutcome> = tree
            .root()
            .children()
            .map(|c| assoc.comment(c, |_, _| false))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                CommentOutcome::Buffered,
                CommentOutcome::Buffered,
                CommentOutcome::Skipped,
                CommentOutcome::Buffered
            ]
        );
        assert_eq!(assoc.take(), "third");
        assert_eq!(assoc.pending(), "");
    }

    #[test]
    fn test_same_line_annotation() {
        let mut ports = vec![
            Port {
                name: "a".to_string(),
                source_line: 3,
                ..Port::default()
            },
            Port {
                name: "b".to_string(),
                source_line: 3,
                ..Port::default()
            },
        ];
        assert!(annotate_row(&mut ports, 3, "shared"));
        assert!(!annotate_row(&mut ports, 4, "other"));
        assert!(ports.iter().all(|p| p.description == "shared"));
    }

    #[test]
    fn test_transparent_nodes_keep_pending() {
        let tree = grammar::load(HdlLanguage::Vhdl)
            .unwrap()
            .parse("--! header\nlibrary ieee;\nuse ieee.std_logic_1164.all;\nentity e is end;\n")
            .unwrap();
        let unit = tree.root().child_by_kind("design_unit").unwrap();
        let mut assoc = CommentAssociator::new(&VHDL, "!");
        let siblings = tree
            .root()
            .children()
            .filter(|c| c.kind() != "design_unit")
            .chain(unit.children())
            .take_while(|c| c.kind() != "entity_declaration");
        for child in siblings {
            if VHDL.is_comment(child.kind()) {
                assoc.comment(child, |_, _| false);
            } else if child.is_named() {
                assoc.interrupt(child);
            }
        }
        assert_eq!(assoc.take(), "header");
    }
}
