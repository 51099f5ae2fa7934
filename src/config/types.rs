use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// 輸出畫面尺寸（直式）
pub const TARGET_WIDTH: u32 = 1080;
pub const TARGET_HEIGHT: u32 = 1920;
pub const TARGET_FPS: u32 = 24;

/// boxblur 半徑與次數
pub const BLUR_RADIUS: u32 = 10;
pub const BLUR_PASSES: u32 = 5;

/// 綠幕參考色與去背參數
pub const KEY_COLOR: [u8; 3] = [35, 177, 77];
pub const KEY_THRESHOLD: f64 = 83.0;
pub const KEY_SOFTNESS: f64 = 15.0;

pub const ENCODER_CODEC: &str = "libvpx-vp9";
pub const ENCODER_THREADS: usize = 8;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxBlur {
    pub radius: u32,
    pub passes: u32,
}

impl BoxBlur {
    #[must_use]
    pub fn filter_expression(&self) -> String {
        format!("boxblur={}:{}", self.radius, self.passes)
    }
}

/// 一次背景轉換（ffmpeg）所需的全部參數
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSpec {
    pub blur: BoxBlur,
    pub resolution: Resolution,
    pub fps: u32,
    pub log_level: &'static str,
    pub overwrite: bool,
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self {
            blur: BoxBlur {
                radius: BLUR_RADIUS,
                passes: BLUR_PASSES,
            },
            resolution: Resolution::new(TARGET_WIDTH, TARGET_HEIGHT),
            fps: TARGET_FPS,
            log_level: "error",
            overwrite: true,
        }
    }
}

/// VP9 的速度 / 品質取捨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncoderPreset {
    #[default]
    Fast,
    Balanced,
    Quality,
}

impl EncoderPreset {
    /// libvpx-vp9 沒有 `-preset`，改以 deadline 與 cpu-used 表示
    #[must_use]
    pub const fn vp9_args(self) -> [&'static str; 4] {
        match self {
            Self::Fast => ["-deadline", "good", "-cpu-used", "4"],
            Self::Balanced => ["-deadline", "good", "-cpu-used", "2"],
            Self::Quality => ["-deadline", "best", "-cpu-used", "0"],
        }
    }
}

/// 合成與最終編碼參數
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSpec {
    pub resolution: Resolution,
    pub fps: u32,
    pub key_color: [u8; 3],
    pub key_threshold: f64,
    pub key_softness: f64,
    pub codec: &'static str,
    pub preset: EncoderPreset,
    pub encoder_threads: usize,
}

impl Default for CompositeSpec {
    fn default() -> Self {
        Self {
            resolution: Resolution::new(TARGET_WIDTH, TARGET_HEIGHT),
            fps: TARGET_FPS,
            key_color: KEY_COLOR,
            key_threshold: KEY_THRESHOLD,
            key_softness: KEY_SOFTNESS,
            codec: ENCODER_CODEC,
            preset: EncoderPreset::Fast,
            encoder_threads: ENCODER_THREADS,
        }
    }
}

/// 中間檔（模糊背景）處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempCleanupPolicy {
    /// 一律保留，方便除錯
    Retain,
    /// 任務成功才刪除
    #[default]
    DeleteOnSuccess,
    /// 無論成功失敗都刪除
    DeleteAlways,
}

impl TempCleanupPolicy {
    #[must_use]
    pub const fn should_delete(self, succeeded: bool) -> bool {
        match self {
            Self::Retain => false,
            Self::DeleteOnSuccess => succeeded,
            Self::DeleteAlways => true,
        }
    }
}

impl fmt::Display for TempCleanupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Retain => "retain",
            Self::DeleteOnSuccess => "delete on success",
            Self::DeleteAlways => "delete always",
        };
        f.write_str(name)
    }
}

/// 中間檔 / 輸出檔命名方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicy {
    /// `<stem>_temp.mp4` / `<stem>_complete.mp4`，只有撞名時才加上雜湊後綴
    #[default]
    Basename,
    /// 每個檔名都加上來源路徑的雜湊後綴
    PathHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    English,
    #[serde(rename = "zh-TW")]
    TraditionalChinese,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::TraditionalChinese => "zh-TW",
        }
    }
}

/// `settings.json` 的內容，所有欄位皆可省略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    pub input_directory: PathBuf,
    pub chroma_key_path: PathBuf,
    pub temp_directory: PathBuf,
    pub output_directory: PathBuf,
    pub video_extensions: Vec<String>,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub temp_cleanup: TempCleanupPolicy,
    pub naming: NamingPolicy,
    pub process_timeout_secs: Option<u64>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            input_directory: PathBuf::from("originalVideos"),
            chroma_key_path: PathBuf::from("chroma_key/chroma_key.mp4"),
            temp_directory: PathBuf::from("temp"),
            output_directory: PathBuf::from("result"),
            video_extensions: vec!["mp4".to_string()],
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            temp_cleanup: TempCleanupPolicy::default(),
            naming: NamingPolicy::default(),
            process_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLayout {
    pub input: PathBuf,
    pub chroma_key: PathBuf,
    pub temp: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// 啟動時建立一次，之後以 `&Config` 唯讀分享給所有 worker
#[derive(Debug, Clone)]
pub struct Config {
    pub language: Language,
    pub layout: DirectoryLayout,
    pub tools: ToolPaths,
    pub video_extensions: Vec<String>,
    pub transform: TransformSpec,
    pub composite: CompositeSpec,
    pub temp_cleanup: TempCleanupPolicy,
    pub naming: NamingPolicy,
    pub process_timeout: Option<Duration>,
}

impl From<UserSettings> for Config {
    fn from(settings: UserSettings) -> Self {
        Self {
            language: settings.language,
            layout: DirectoryLayout {
                input: settings.input_directory,
                chroma_key: settings.chroma_key_path,
                temp: settings.temp_directory,
                output: settings.output_directory,
            },
            tools: ToolPaths {
                ffmpeg: settings.ffmpeg_path,
                ffprobe: settings.ffprobe_path,
            },
            video_extensions: settings
                .video_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            transform: TransformSpec::default(),
            composite: CompositeSpec::default(),
            temp_cleanup: settings.temp_cleanup,
            naming: settings.naming,
            process_timeout: settings
                .process_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}
