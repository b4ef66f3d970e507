use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::cst::SyntaxTree;
use super::grammar::{self, GrammarHandle};
use crate::config::ExtractConfig;
use crate::error::{ExtractionError, Result};
use crate::extract::{self, ExtractContext, RegionMode};
use crate::ir::{ArchitectureBody, CompilationUnit, DeclarationBlock, HdlLanguage, UnitName};

/// Last parsed source and its tree.
#[derive(Debug, Clone)]
pub struct ParseCache {
    source_hash: u64,
    tree: Arc<SyntaxTree>,
}

impl ParseCache {
    fn new(source: &str, tree: Arc<SyntaxTree>) -> Self {
        Self {
            source_hash: hash_source(source),
            tree,
        }
    }

    /// True only when `source` is byte-identical to the cached text.
    pub fn is_valid_for(&self, source: &str) -> bool {
        self.source_hash == hash_source(source) && self.tree.source() == source
    }

    pub fn tree(&self) -> &Arc<SyntaxTree> {
        &self.tree
    }
}

fn hash_source(source: &str) -> u64 {
    let mut hasher = FxHasher::default();
    source.hash(&mut hasher);
    hasher.finish()
}

/// Extraction entry point that keeps the tree of the last source it parsed.
#[derive(Debug)]
pub struct HdlParser {
    grammar: GrammarHandle,
    config: ExtractConfig,
    cache: Option<ParseCache>,
}

impl HdlParser {
    pub fn new(config: ExtractConfig) -> Result<Self> {
        let grammar = grammar::load(config.language)?;
        Ok(Self::with_grammar(grammar, config))
    }

    /// Use a specific grammar, e.g. one built from a tree-sitter language.
    pub fn with_grammar(grammar: GrammarHandle, mut config: ExtractConfig) -> Self {
        config.language = grammar.language();
        Self {
            grammar,
            config,
            cache: None,
        }
    }

    /// A parser for `path`'s dialect together with the file's contents.
    pub fn from_file(path: &Path, config: &ExtractConfig) -> Result<(Self, String)> {
        let source = std::fs::read_to_string(path).map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ExtractConfig {
            language: config.language_for(path),
            ..config.clone()
        };
        Ok((Self::new(config)?, source))
    }

    pub fn language(&self) -> HdlLanguage {
        self.grammar.language()
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&ParseCache> {
        self.cache.as_ref()
    }

    /// Parse `source`, reusing the previous tree when the text is unchanged.
    pub fn parse(&mut self, source: &str) -> Result<Arc<SyntaxTree>> {
        if source.len() > self.config.max_source_bytes {
            return Err(ExtractionError::SourceTooLarge {
                size: source.len(),
                limit: self.config.max_source_bytes,
            });
        }
        if let Some(cache) = &self.cache {
            if cache.is_valid_for(source) {
                debug!("Parse cache hit ({} bytes)", source.len());
                return Ok(Arc::clone(&cache.tree));
            }
        }
        debug!("Parse cache miss, parsing {} bytes of {}", source.len(), self.language());
        let tree = self.grammar.parse(source)?;
        self.cache = Some(ParseCache::new(source, Arc::clone(&tree)));
        Ok(tree)
    }

    fn context(&self) -> ExtractContext<'_> {
        ExtractContext::from_config(&self.config, self.language())
    }

    pub fn classify_and_extract(&mut self, source: &str) -> Result<CompilationUnit> {
        let tree = self.parse(source)?;
        extract::classify_and_extract(&tree, &self.context())
    }

    pub fn unit_name(&mut self, source: &str) -> Result<UnitName> {
        let tree = self.parse(source)?;
        extract::unit_name(&tree, &self.context())
    }

    pub fn extract_declarations(&mut self, source: &str, mode: RegionMode) -> Result<DeclarationBlock> {
        let tree = self.parse(source)?;
        extract::extract_declarations(&tree, mode, &self.context())
    }

    pub fn extract_body(&mut self, source: &str, entity_name: &str) -> Result<ArchitectureBody> {
        let tree = self.parse(source)?;
        extract::extract_body(&tree, entity_name, &self.context())
    }
}
