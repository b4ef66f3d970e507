//! Grammar adapter: turns source text into a [`SyntaxTree`].
//!
//! The `tree-sitter-vhdl` and `tree-sitter-verilog` grammars are registered
//! once per process and handed out as cheap [`GrammarHandle`] clones. Any
//! other tree-sitter language can be wrapped through
//! [`GrammarHandle::from_tree_sitter`].

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use super::cst::SyntaxTree;
use super::tree_sitter_hdl::TreeSitterGrammar;
use crate::error::{ExtractionError, Result};
use crate::ir::HdlLanguage;

/// A parser for one HDL dialect.
pub trait Grammar: Send + Sync + fmt::Debug {
    fn language(&self) -> HdlLanguage;

    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    fn parse(&self, source: &str) -> Result<SyntaxTree>;
}

#[derive(Debug, Clone)]
pub struct GrammarHandle(Arc<dyn Grammar>);

impl GrammarHandle {
    pub fn new(grammar: impl Grammar + 'static) -> Self {
        Self(Arc::new(grammar))
    }

    pub fn from_tree_sitter(language: HdlLanguage, ts_language: tree_sitter::Language) -> Result<Self> {
        Ok(Self::new(TreeSitterGrammar::new(language, ts_language)?))
    }

    pub fn language(&self) -> HdlLanguage {
        self.0.language()
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn parse(&self, source: &str) -> Result<Arc<SyntaxTree>> {
        let tree = self.0.parse(source)?;
        if tree.has_error() {
            warn!(
                "{} {} grammar left unparsed regions in the source",
                self.name(),
                self.language()
            );
        }
        Ok(Arc::new(tree))
    }
}

static VHDL: OnceLock<GrammarHandle> = OnceLock::new();
static VERILOG: OnceLock<GrammarHandle> = OnceLock::new();

fn registry_language(language: HdlLanguage) -> tree_sitter::Language {
    match language {
        HdlLanguage::Vhdl => tree_sitter_vhdl::LANGUAGE.into(),
        HdlLanguage::Verilog => tree_sitter_verilog::LANGUAGE.into(),
    }
}

/// Get the process-wide grammar for a dialect.
pub fn load(language: HdlLanguage) -> Result<GrammarHandle> {
    let cell = match language {
        HdlLanguage::Vhdl => &VHDL,
        HdlLanguage::Verilog => &VERILOG,
    };
    if let Some(handle) = cell.get() {
        return Ok(handle.clone());
    }
    debug!("Registering tree-sitter {} grammar", language);
    let handle = GrammarHandle::from_tree_sitter(language, registry_language(language))?;
    // A concurrent caller may have won the race; keep whichever was stored first
    Ok(cell.get_or_init(|| handle).clone())
}

/// [`load`] from async code without blocking the runtime.
pub async fn load_async(language: HdlLanguage) -> Result<GrammarHandle> {
    tokio::task::spawn_blocking(move || load(language))
        .await
        .map_err(|e| ExtractionError::WorkerFailed(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_is_idempotent() {
        let a = load(HdlLanguage::Vhdl).unwrap();
        let b = load(HdlLanguage::Vhdl).unwrap();
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a.language(), HdlLanguage::Vhdl);
        assert_eq!(a.name(), "tree-sitter");
    }

    #[test]
    fn test_handles_per_language() {
        let vhdl = load(HdlLanguage::Vhdl).unwrap();
        let verilog = load(HdlLanguage::Verilog).unwrap();
        assert_eq!(verilog.language(), HdlLanguage::Verilog);
        let tree = verilog.parse("module m; endmodule").unwrap();
        assert!(tree.root().find_first(&["module_declaration"]).is_some());
        assert_eq!(tree.root().kind(), "source_file");
        let tree = vhdl.parse("entity e is end;").unwrap();
        assert!(tree.root().find_first(&["entity_declaration"]).is_some());
        assert_eq!(tree.root().kind(), "design_file");
    }

    #[tokio::test]
    async fn test_load_async() {
        let handle = load_async(HdlLanguage::Verilog).await.unwrap();
        assert_eq!(handle.language(), HdlLanguage::Verilog);
    }

    #[test]
    fn test_from_tree_sitter() {
        let handle =
            GrammarHandle::from_tree_sitter(HdlLanguage::Verilog, tree_sitter_verilog::LANGUAGE.into())
                .unwrap();
        assert_eq!(handle.name(), "tree-sitter");
        assert!(!Arc::ptr_eq(&handle.0, &load(HdlLanguage::Verilog).unwrap().0));
        let tree = handle.parse("package p; endpackage").unwrap();
        assert!(tree.root().find_first(&["package_declaration"]).is_some());
    }
}
