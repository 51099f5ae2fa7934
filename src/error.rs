//! 合成流程的錯誤分類
//!
//! 每個錯誤只屬於產生它的單一影片任務，不會影響其他任務。

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 外部程式（ffmpeg）無法啟動、逾時或以非零狀態結束
    #[error("external process `{program}` failed: {message}")]
    ExternalProcess { program: String, message: String },

    /// 來源或素材影片無法開啟 / 解析
    #[error("cannot decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// 最終編碼或寫檔失敗
    #[error("render of {} failed: {message}", path.display())]
    Render { path: PathBuf, message: String },

    /// 啟動時缺少必要的素材、資料夾或設定值不合法
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// 處理步驟 panic；只終止該支影片的任務
    #[error("worker panicked: {message}")]
    WorkerPanic { message: String },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    ExternalProcess,
    Decode,
    Render,
    Configuration,
    WorkerPanic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ExternalProcess => "ExternalProcessError",
            Self::Decode => "DecodeError",
            Self::Render => "RenderError",
            Self::Configuration => "ConfigurationError",
            Self::WorkerPanic => "WorkerPanicError",
        };
        f.write_str(name)
    }
}

impl PipelineError {
    pub fn external_process(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalProcess {
            program: program.into(),
            message: message.into(),
        }
    }

    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn render(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Render {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn worker_panic(message: impl Into<String>) -> Self {
        Self::WorkerPanic {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ExternalProcess { .. } => ErrorKind::ExternalProcess,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Render { .. } => ErrorKind::Render,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::WorkerPanic { .. } => ErrorKind::WorkerPanic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            PipelineError::external_process("ffmpeg", "exit 1").kind(),
            ErrorKind::ExternalProcess
        );
        assert_eq!(
            PipelineError::decode("/a.mp4", "no stream").kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            PipelineError::render("/a.mp4", "disk full").kind(),
            ErrorKind::Render
        );
        assert_eq!(
            PipelineError::configuration("missing asset").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            PipelineError::worker_panic("index out of bounds").kind(),
            ErrorKind::WorkerPanic
        );
    }

    #[test]
    fn test_display_carries_context() {
        let err = PipelineError::decode("/videos/clip_a.mp4", "moov atom not found");
        let text = err.to_string();
        assert!(text.contains("/videos/clip_a.mp4"));
        assert!(text.contains("moov atom not found"));
        assert_eq!(ErrorKind::Decode.to_string(), "DecodeError");
    }
}
