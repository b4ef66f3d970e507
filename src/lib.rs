pub mod batch;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod fsm;
pub mod ir;
pub mod parser;
pub mod utils;

// Re-export commonly used types
pub use batch::{extract_files, FileReport};
pub use config::ExtractConfig;
pub use error::{ExtractionError, Result};
pub use fsm::{extract_fsm, extract_fsm_from_source, FsmOptions};
pub use ir::{CompilationUnit, HdlLanguage, StateMachineGraph, UnitKind, UnitName};
pub use parser::HdlParser;

/// Parse `source` and extract the model of its primary unit.
pub fn classify_and_extract(
    source: &str,
    language: HdlLanguage,
    doc_symbol: &str,
) -> Result<CompilationUnit> {
    let config = ExtractConfig::new(language).with_doc_symbol(doc_symbol);
    HdlParser::new(config)?.classify_and_extract(source)
}

/// Name and kind of the primary unit in `source`.
pub fn unit_name(source: &str, language: HdlLanguage) -> Result<UnitName> {
    HdlParser::new(ExtractConfig::new(language))?.unit_name(source)
}
