use crate::error::{PipelineError, PipelineResult};
use crate::tools::process_runner::{command_line, run_to_completion};
use log::debug;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub duration_seconds: f64,
    /// 儲存的像素寬高，未套用旋轉與 SAR
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// 順時針角度，正規化到 0..360
    pub rotation: u32,
    pub sample_aspect_ratio: f64,
}

impl VideoInfo {
    /// ffmpeg 解碼後（自動旋轉、方形像素）的畫面尺寸
    #[must_use]
    pub fn display_size(&self) -> (u32, u32) {
        let width = (f64::from(self.width) * self.sample_aspect_ratio).round().max(1.0) as u32;
        if self.rotation % 180 == 90 {
            (self.height, width)
        } else {
            (width, self.height)
        }
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    sample_aspect_ratio: Option<String>,
    tags: Option<StreamTags>,
    side_data_list: Option<Vec<SideData>>,
}

#[derive(Deserialize)]
struct StreamTags {
    rotate: Option<String>,
}

#[derive(Deserialize)]
struct SideData {
    rotation: Option<f64>,
}

/// 使用 ffprobe 取得影片資訊，任何失敗都視為 `DecodeError`
pub fn get_video_info(
    ffprobe: &Path,
    path: &Path,
    timeout: Option<Duration>,
) -> PipelineResult<VideoInfo> {
    let mut command = Command::new(ffprobe);
    command
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path);
    debug!("Probing: {}", command_line(&command));

    let output = run_to_completion(&mut command, timeout)
        .map_err(|e| PipelineError::decode(path, format!("ffprobe {e}")))?;

    parse_ffprobe_json(&String::from_utf8_lossy(&output.stdout))
        .map_err(|message| PipelineError::decode(path, message))
}

fn parse_ffprobe_json(json: &str) -> Result<VideoInfo, String> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| format!("invalid ffprobe output: {e}"))?;

    let video_stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or("no video stream")?;

    let width = video_stream.width.ok_or("missing video width")?;
    let height = video_stream.height.ok_or("missing video height")?;
    if width == 0 || height == 0 {
        return Err(format!("invalid frame size {width}x{height}"));
    }

    // 影片長度優先取 format，其次取 stream
    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or(video_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or("missing or zero duration")?;

    let frame_rate = video_stream
        .r_frame_rate
        .as_ref()
        .and_then(|r| parse_frame_rate(r))
        .unwrap_or(30.0);

    // 新版 ffprobe 放在 Display Matrix side data，舊版放在 rotate tag
    let rotation = video_stream
        .side_data_list
        .iter()
        .flatten()
        .find_map(|side| side.rotation)
        .or_else(|| {
            video_stream
                .tags
                .as_ref()
                .and_then(|t| t.rotate.as_deref())
                .and_then(|r| r.trim().parse::<f64>().ok())
        })
        .map_or(0, normalize_rotation);

    let sample_aspect_ratio = video_stream
        .sample_aspect_ratio
        .as_deref()
        .and_then(parse_sample_aspect_ratio)
        .unwrap_or(1.0);

    Ok(VideoInfo {
        duration_seconds,
        width,
        height,
        frame_rate,
        rotation,
        sample_aspect_ratio,
    })
}

fn normalize_rotation(degrees: f64) -> u32 {
    (degrees.round() as i64).rem_euclid(360) as u32
}

/// "4:3" 之類的比例；"0:1" 代表未知
fn parse_sample_aspect_ratio(ratio: &str) -> Option<f64> {
    let (num, den) = ratio.split_once(':')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    (num > 0.0 && den > 0.0).then(|| num / den)
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate.parse().ok()
}
