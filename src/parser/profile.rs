//! Per-language node-kind tables consulted by the extractors.
//!
//! Both dialects are parsed into the same [`SyntaxTree`](super::cst::SyntaxTree)
//! representation, but `tree-sitter-vhdl` and `tree-sitter-verilog` name
//! their nodes differently. Which kinds play which role, how comments are
//! marked, and how case choices are written live here as data.

use crate::ir::HdlLanguage;

#[derive(Debug)]
pub struct LanguageProfile {
    pub language: HdlLanguage,
    /// Comment openers, longest first; block comments also list their closer.
    pub comment_markers: &'static [(&'static str, &'static str)],
    pub comment_kinds: &'static [&'static str],
    pub case_insensitive: bool,
    /// Leaf kinds holding a plain name.
    pub identifier_kinds: &'static [&'static str],

    /// Wrapper around one library unit plus its context clauses, if the grammar has one.
    pub unit_wrapper: Option<&'static str>,
    pub entity_kind: &'static str,
    pub package_kind: &'static str,
    /// Children of a unit that hold its name, when the name is not a direct child.
    pub unit_name_kinds: &'static [&'static str],
    /// Secondary unit carrying the implementation of an entity.
    pub architecture_kind: Option<&'static str>,
    /// Child of the implementation holding its declarations; `None` when
    /// they are direct children of the unit.
    pub declarative_region: Option<&'static str>,
    pub package_region: Option<&'static str>,
    /// Child of the implementation holding its concurrent statements.
    pub concurrent_region: Option<&'static str>,
    /// Nodes wrapping exactly one region item, looked through during walks.
    pub item_wrappers: &'static [&'static str],
    /// Kinds that neither document nor interrupt a pending comment.
    pub transparent_kinds: &'static [&'static str],

    pub process_kinds: &'static [&'static str],
    pub case_kinds: &'static [&'static str],
    /// Child of a case statement holding its alternatives, if any.
    pub case_body_kind: Option<&'static str>,
    pub case_item_kind: &'static str,
    /// Child of a case alternative holding its choices.
    pub choice_kind: &'static str,
    pub if_kind: &'static str,
    pub assignment_kinds: &'static [&'static str],
    pub choice_separator: char,
    pub catch_all_choice: &'static str,

    /// Port direction keywords mapped to their normalized spelling.
    pub directions: &'static [(&'static str, &'static str)],
    /// A parameter declaration documents a constant when found in a package.
    pub package_constants: &'static [&'static str],
}

pub static VHDL: LanguageProfile = LanguageProfile {
    language: HdlLanguage::Vhdl,
    comment_markers: &[("--", ""), ("/*", "*/")],
    comment_kinds: &["line_comment", "block_comment"],
    case_insensitive: true,
    identifier_kinds: &["identifier"],
    unit_wrapper: Some("design_unit"),
    entity_kind: "entity_declaration",
    package_kind: "package_declaration",
    unit_name_kinds: &[],
    architecture_kind: Some("architecture_definition"),
    declarative_region: Some("architecture_head"),
    package_region: Some("package_declaration_body"),
    concurrent_region: Some("concurrent_block"),
    item_wrappers: &[],
    transparent_kinds: &["library_clause", "use_clause", "context_reference"],
    process_kinds: &["process_statement"],
    case_kinds: &["case_statement"],
    case_body_kind: Some("case_body"),
    case_item_kind: "case_statement_alternative",
    choice_kind: "when_element",
    if_kind: "if_statement",
    assignment_kinds: &["simple_waveform_assignment", "simple_variable_assignment"],
    choice_separator: '|',
    catch_all_choice: "others",
    directions: &[
        ("in", "in"),
        ("out", "out"),
        ("inout", "inout"),
        ("buffer", "buffer"),
        ("linkage", "linkage"),
    ],
    package_constants: &["constant_declaration"],
};

pub static VERILOG: LanguageProfile = LanguageProfile {
    language: HdlLanguage::Verilog,
    comment_markers: &[("//", ""), ("/*", "*/")],
    comment_kinds: &["comment"],
    case_insensitive: false,
    identifier_kinds: &["simple_identifier", "escaped_identifier"],
    unit_wrapper: None,
    entity_kind: "module_declaration",
    package_kind: "package_declaration",
    unit_name_kinds: &["module_header", "package_identifier"],
    architecture_kind: None,
    declarative_region: None,
    package_region: None,
    concurrent_region: None,
    item_wrappers: &["module_or_generate_item", "package_or_generate_item_declaration"],
    transparent_kinds: &[
        "timescale_compiler_directive",
        "include_compiler_directive",
        "default_nettype_compiler_directive",
        "text_macro_definition",
        "package_import_declaration",
        "timeunits_declaration",
    ],
    process_kinds: &["always_construct"],
    case_kinds: &["case_statement"],
    case_body_kind: None,
    case_item_kind: "case_item",
    choice_kind: "case_item_expression",
    if_kind: "conditional_statement",
    assignment_kinds: &["nonblocking_assignment", "blocking_assignment"],
    choice_separator: ',',
    catch_all_choice: "default",
    directions: &[
        ("input", "in"),
        ("output", "out"),
        ("inout", "inout"),
        ("ref", "ref"),
    ],
    package_constants: &["parameter_declaration", "local_parameter_declaration"],
};

impl HdlLanguage {
    pub fn profile(self) -> &'static LanguageProfile {
        match self {
            HdlLanguage::Vhdl => &VHDL,
            HdlLanguage::Verilog => &VERILOG,
        }
    }
}

impl LanguageProfile {
    pub fn same_name(&self, a: &str, b: &str) -> bool {
        if self.case_insensitive {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }

    /// Normalized direction for a raw direction keyword.
    pub fn direction(&self, raw: &str) -> String {
        let raw = raw.trim();
        self.directions
            .iter()
            .find(|(keyword, _)| self.same_name(keyword, raw))
            .map(|(_, normalized)| normalized.to_string())
            .unwrap_or_else(|| raw.to_ascii_lowercase())
    }

    /// Comment text with its marker (and block closer) removed.
    pub fn comment_body<'a>(&self, text: &'a str) -> &'a str {
        let text = text.trim_end_matches(['\r', '\n']);
        for (open, close) in self.comment_markers {
            if let Some(rest) = text.strip_prefix(open) {
                return if close.is_empty() {
                    rest
                } else {
                    rest.strip_suffix(close).unwrap_or(rest)
                };
            }
        }
        text
    }

    pub fn is_comment(&self, kind: &str) -> bool {
        self.comment_kinds.contains(&kind)
    }

    pub fn is_transparent(&self, kind: &str) -> bool {
        self.transparent_kinds.contains(&kind)
    }

    pub fn is_item_wrapper(&self, kind: &str) -> bool {
        self.item_wrappers.contains(&kind)
    }
}
