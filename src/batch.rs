//! Extraction over many files at once.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ExtractConfig;
use crate::error::{ExtractionError, Result};
use crate::ir::CompilationUnit;
use crate::parser::HdlParser;

/// Outcome for one input file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: Result<CompilationUnit>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Extract one file with a parser of its own.
pub fn extract_file(path: &Path, config: &ExtractConfig) -> Result<CompilationUnit> {
    let (mut parser, source) = HdlParser::from_file(path, config)?;
    debug!("Extracting {:?} as {}", path, parser.language());
    parser.classify_and_extract(&source)
}

/// Extract every file on the blocking pool. Reports come back in input order.
pub async fn extract_files(paths: Vec<PathBuf>, config: &ExtractConfig) -> Vec<FileReport> {
    info!("Extracting {} files", paths.len());
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let config = config.clone();
            let task_path = path.clone();
            let handle = tokio::task::spawn_blocking(move || extract_file(&task_path, &config));
            (path, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(ExtractionError::WorkerFailed(e.to_string())),
        };
        reports.push(FileReport { path, result });
    }
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    info!("Extracted {} files, {} failed", reports.len(), failed);
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reports_keep_input_order() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for name in ["b_unit", "a_unit", "c_unit"] {
            let path = dir.path().join(format!("{}.vhd", name));
            fs::write(&path, format!("entity {} is end;", name)).unwrap();
            paths.push(path);
        }
        let verilog = dir.path().join("m.v");
        fs::write(&verilog, "module m(input a); endmodule").unwrap();
        paths.push(verilog);
        paths.push(dir.path().join("missing.vhd"));

        let reports = extract_files(paths.clone(), &ExtractConfig::default()).await;
        let names: Vec<String> = reports
            .iter()
            .filter_map(|r| r.result.as_ref().ok())
            .map(|unit| unit.name().to_string())
            .collect();
        assert_eq!(names, vec!["b_unit", "a_unit", "c_unit", "m"]);
        assert_eq!(reports.len(), 5);
        assert_eq!(reports[4].path, paths[4]);
        assert!(matches!(reports[4].result, Err(ExtractionError::Io { .. })));
    }
}
