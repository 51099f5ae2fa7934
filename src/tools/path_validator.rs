use crate::error::{PipelineError, PipelineResult};
use std::path::Path;

pub fn validate_directory_exists(path: &Path) -> PipelineResult<()> {
    if !path.exists() {
        return Err(PipelineError::configuration(format!(
            "directory does not exist: {}",
            path.display()
        )));
    }
    if !path.is_dir() {
        return Err(PipelineError::configuration(format!(
            "not a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

pub fn validate_file_exists(path: &Path) -> PipelineResult<()> {
    if !path.is_file() {
        return Err(PipelineError::configuration(format!(
            "required file is missing: {}",
            path.display()
        )));
    }
    Ok(())
}

/// 冪等：資料夾已存在時不做任何事
pub fn ensure_directory_exists(path: &Path) -> PipelineResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| {
            PipelineError::configuration(format!("cannot create {}: {e}", path.display()))
        })?;
    }
    validate_directory_exists(path)
}
