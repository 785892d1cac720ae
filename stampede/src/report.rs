//! Report emission.
use crate::error::ReportError;
use stampede_core::FinalReport;
use std::fs;
use std::path::{Path, PathBuf};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Receives one [`FinalReport`] per test group, in configured order.
pub trait ReportSink {
    fn write(&mut self, report: &FinalReport) -> Result<(), ReportError>;
}

/// Collects reports in memory.
impl ReportSink for Vec<FinalReport> {
    fn write(&mut self, report: &FinalReport) -> Result<(), ReportError> {
        self.push(report.clone());
        Ok(())
    }
}

/// Writes each report as a text file named after its group.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Creates `dir` (and its parents) if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let dir = dir.into();
        if !dir.is_dir() {
            fs::create_dir_all(&dir).map_err(|source| ReportError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, report: &FinalReport) -> PathBuf {
        self.dir.join(report.file_name())
    }
}

impl ReportSink for FileSink {
    fn write(&mut self, report: &FinalReport) -> Result<(), ReportError> {
        let path = self.path_for(report);
        fs::write(&path, report.to_string())
            .map_err(|source| ReportError::Write { path: path.clone(), source })?;
        debug!("Saved report for {} to {}", report.model, path.display());
        Ok(())
    }
}
