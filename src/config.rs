use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{DEFAULT_DOC_SYMBOL, DEFAULT_FSM_MARKER, MAX_FILE_SIZE_BYTES};
use crate::error::{ExtractionError, Result};
use crate::fsm::FsmOptions;
use crate::ir::HdlLanguage;

/// Settings for one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Dialect used when it cannot be guessed from a file extension.
    pub language: HdlLanguage,
    pub doc_symbol: String,
    pub fsm_marker: String,
    pub max_source_bytes: usize,
    pub fsm: FsmOptions,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            language: HdlLanguage::Vhdl,
            doc_symbol: DEFAULT_DOC_SYMBOL.to_string(),
            fsm_marker: DEFAULT_FSM_MARKER.to_string(),
            max_source_bytes: MAX_FILE_SIZE_BYTES,
            fsm: FsmOptions::default(),
        }
    }
}

impl ExtractConfig {
    pub fn new(language: HdlLanguage) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    pub fn with_doc_symbol(mut self, doc_symbol: impl Into<String>) -> Self {
        self.doc_symbol = doc_symbol.into();
        self
    }

    /// Load a JSON configuration; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| ExtractionError::Config(e.to_string()))
    }

    /// Dialect of `path`, falling back to the configured language.
    pub fn language_for(&self, path: &Path) -> HdlLanguage {
        HdlLanguage::from_path(path).unwrap_or(self.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ExtractConfig::default();
        assert_eq!(config.doc_symbol, "!");
        assert_eq!(config.fsm_marker, "fsm_extract");
        assert_eq!(config.max_source_bytes, MAX_FILE_SIZE_BYTES);
        assert!(!config.fsm.record_implicit_holds);
    }

    #[test]
    fn test_partial_json() {
        let config =
            ExtractConfig::from_json(r#"{"language": "verilog", "fsm": {"record_implicit_holds": true}}"#)
                .unwrap();
        assert_eq!(config.language, HdlLanguage::Verilog);
        assert!(config.fsm.record_implicit_holds);
        assert_eq!(config.doc_symbol, "!");
    }

    #[test]
    fn test_invalid_json() {
        let err = ExtractConfig::from_json("{\"max_source_bytes\": \"many\"}").unwrap_err();
        assert!(matches!(err, ExtractionError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"doc_symbol": "*"}}"#).unwrap();
        let config = ExtractConfig::from_file(file.path()).unwrap();
        assert_eq!(config.doc_symbol, "*");

        let missing = ExtractConfig::from_file(Path::new("/nonexistent/hdl_doc.json"));
        assert!(matches!(missing, Err(ExtractionError::Io { .. })));
    }

    #[test]
    fn test_language_for_path() {
        let config = ExtractConfig::new(HdlLanguage::Verilog);
        assert_eq!(config.language_for(Path::new("a.vhd")), HdlLanguage::Vhdl);
        assert_eq!(config.language_for(Path::new("a.txt")), HdlLanguage::Verilog);
    }
}
