use crate::config::types::Config;
use crate::error::PipelineResult;
use crate::tools::{ensure_directory_exists, validate_directory_exists, validate_file_exists};
use log::info;

impl Config {
    /// 確認輸入資料夾與綠幕素材存在
    pub fn validate_assets(&self) -> PipelineResult<()> {
        validate_directory_exists(&self.layout.input)?;
        validate_file_exists(&self.layout.chroma_key)?;
        Ok(())
    }

    /// 建立 temp / result 資料夾，重複呼叫不會有副作用
    pub fn prepare_workspace(&self) -> PipelineResult<()> {
        ensure_directory_exists(&self.layout.temp)?;
        ensure_directory_exists(&self.layout.output)?;
        info!(
            "Workspace ready: temp={} output={}",
            self.layout.temp.display(),
            self.layout.output.display()
        );
        Ok(())
    }
}
