//! Source text to [`SyntaxTree`]: the tree-sitter grammars, their per-dialect
//! node-kind profiles and the caching [`HdlParser`].

pub mod cst;
pub mod grammar;
pub mod hdl_parser;
pub mod profile;
pub mod tree_sitter_hdl;

pub use cst::{Node, SyntaxTree};
pub use grammar::{load, load_async, Grammar, GrammarHandle};
pub use hdl_parser::{HdlParser, ParseCache};
pub use profile::LanguageProfile;
pub use tree_sitter_hdl::TreeSitterGrammar;
