use super::artifact::{ArtifactPaths, PartialOutput};
use super::chroma_key::ChromaKey;
use crate::config::{CompositeSpec, Config, Resolution};
use crate::error::{PipelineError, PipelineResult};
use crate::tools::{VideoInfo, command_line, get_video_info, run_to_completion};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

const BACKGROUND_INPUT: usize = 0;
const FOREGROUND_INPUT: usize = 1;
const OVERLAY_INPUT: usize = 2;

/// 已探測過的影片；ffprobe 子程序在 `open` 回傳前就已回收
#[derive(Debug, Clone)]
pub struct Clip {
    pub path: PathBuf,
    pub info: VideoInfo,
}

impl Clip {
    pub fn open(ffprobe: &Path, path: &Path, timeout: Option<Duration>) -> PipelineResult<Self> {
        let info = get_video_info(ffprobe, path, timeout)?;
        Ok(Self {
            path: path.to_path_buf(),
            info,
        })
    }
}

/// 等比縮放到指定寬度，高度取偶數（yuv420p 需要）
#[must_use]
pub fn fit_width(width: u32, height: u32, target_width: u32) -> Resolution {
    let scaled = f64::from(target_width) * f64::from(height) / f64::from(width.max(1));
    let even = ((scaled / 2.0).round() as u32 * 2).max(2);
    Resolution::new(target_width, even)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub input_index: usize,
    pub size: Resolution,
    pub fps: u32,
    pub duration: f64,
    /// 來源不夠長時以最後一幀補足的秒數
    pub pad_seconds: f64,
    pub key: Option<ChromaKey>,
}

impl Layer {
    fn filter_chain(&self, label: &str) -> String {
        let mut filters = vec![
            format!("scale={}:{}", self.size.width, self.size.height),
            "setsar=1".to_string(),
        ];
        if let Some(key) = &self.key {
            filters.push("format=rgba".to_string());
            filters.push(key.filter());
        }
        filters.push(format!("fps={}", self.fps));
        if self.pad_seconds > 0.0 {
            filters.push(format!(
                "tpad=stop_mode=clone:stop_duration={:.3}",
                self.pad_seconds
            ));
        }
        filters.push(format!("trim=duration={:.3}", self.duration));
        filters.push("setpts=PTS-STARTPTS".to_string());

        format!("[{}:v]{}[{label}]", self.input_index, filters.join(","))
    }
}

/// 三層合成：模糊背景 → 置中的原始影片 → 置中的去背綠幕素材
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePlan {
    pub canvas: Resolution,
    pub fps: u32,
    pub clamped_duration: f64,
    pub background: Layer,
    pub foreground: Layer,
    pub overlay: Layer,
}

impl CompositePlan {
    #[must_use]
    pub fn new(
        background: &VideoInfo,
        source: &VideoInfo,
        chroma: &VideoInfo,
        composite: &CompositeSpec,
    ) -> Self {
        let clamped_duration = chroma.duration_seconds.min(source.duration_seconds);

        // 背景不夠長時以最後一幀補到共同長度
        let background_duration = clamped_duration;
        let pad_seconds = (background_duration - background.duration_seconds).max(0.0);

        Self {
            canvas: composite.resolution,
            fps: composite.fps,
            clamped_duration,
            background: Layer {
                input_index: BACKGROUND_INPUT,
                size: composite.resolution,
                fps: composite.fps,
                duration: background_duration,
                pad_seconds,
                key: None,
            },
            foreground: Layer {
                input_index: FOREGROUND_INPUT,
                size: {
                    let (width, height) = source.display_size();
                    fit_width(width, height, composite.resolution.width)
                },
                fps: composite.fps,
                duration: clamped_duration,
                pad_seconds: 0.0,
                key: None,
            },
            overlay: Layer {
                input_index: OVERLAY_INPUT,
                size: composite.resolution,
                fps: composite.fps,
                duration: clamped_duration,
                pad_seconds: 0.0,
                key: Some(ChromaKey::from_composite(composite)),
            },
        }
    }

    #[must_use]
    pub fn filter_graph(&self) -> String {
        [
            self.background.filter_chain("bg"),
            self.foreground.filter_chain("fg"),
            self.overlay.filter_chain("key"),
            "[bg][fg]overlay=x=(W-w)/2:y=(H-h)/2[base]".to_string(),
            "[base][key]overlay=x=(W-w)/2:y=(H-h)/2,format=yuv420p[out]".to_string(),
        ]
        .join(";")
    }
}

pub struct Compositor<'a> {
    ffmpeg: &'a Path,
    ffprobe: &'a Path,
    chroma_key_path: &'a Path,
    composite: &'a CompositeSpec,
    timeout: Option<Duration>,
}

impl<'a> Compositor<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            ffmpeg: &config.tools.ffmpeg,
            ffprobe: &config.tools.ffprobe,
            chroma_key_path: &config.layout.chroma_key,
            composite: &config.composite,
            timeout: config.process_timeout,
        }
    }

    /// 合成並渲染一支影片，成功時回傳最終輸出路徑
    pub fn composite(&self, paths: &ArtifactPaths) -> PipelineResult<PathBuf> {
        let source = Clip::open(self.ffprobe, &paths.source, self.timeout)?;
        let chroma = Clip::open(self.ffprobe, self.chroma_key_path, self.timeout)?;
        let background = Clip::open(self.ffprobe, &paths.intermediate, self.timeout)?;

        let plan = CompositePlan::new(&background.info, &source.info, &chroma.info, self.composite);
        debug!(
            "Composite plan for {}: {:.3}s, foreground {}",
            paths.source.display(),
            plan.clamped_duration,
            plan.foreground.size
        );

        let partial = PartialOutput::new(&paths.output);
        let mut command = self.build_render_command(&background, &source, &chroma, &plan, partial.path());
        debug!("Render: {}", command_line(&command));

        run_to_completion(&mut command, self.timeout)
            .map_err(|e| PipelineError::render(&paths.output, format!("ffmpeg {e}")))?;

        self.verify_output(partial.path(), &paths.output, &plan)?;

        partial
            .commit()
            .map_err(|e| PipelineError::render(&paths.output, format!("cannot move into place: {e}")))
    }

    #[must_use]
    pub fn build_render_command(
        &self,
        background: &Clip,
        source: &Clip,
        chroma: &Clip,
        plan: &CompositePlan,
        destination: &Path,
    ) -> Command {
        let mut cmd = Command::new(self.ffmpeg);

        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]);
        cmd.arg("-i").arg(&background.path);
        cmd.arg("-i").arg(&source.path);
        cmd.arg("-i").arg(&chroma.path);
        cmd.args([
            "-filter_complex", &plan.filter_graph(),
            "-map", "[out]",
            "-an",
            "-c:v", self.composite.codec,
        ]);
        cmd.args(self.composite.preset.vp9_args());
        cmd.args([
            "-row-mt", "1",
            "-threads", &self.composite.encoder_threads.to_string(),
            "-r", &plan.fps.to_string(),
            "-pix_fmt", "yuv420p",
            "-t", &format!("{:.3}", plan.clamped_duration),
            "-f", "mp4",
        ]);
        cmd.arg(destination);

        cmd
    }

    fn verify_output(&self, rendered: &Path, output: &Path, plan: &CompositePlan) -> PipelineResult<()> {
        let info = get_video_info(self.ffprobe, rendered, self.timeout)
            .map_err(|e| PipelineError::render(output, format!("unreadable render: {e}")))?;

        let (width, height) = info.display_size();
        if width != plan.canvas.width || height != plan.canvas.height {
            return Err(PipelineError::render(
                output,
                format!("unexpected frame size {width}x{height}, expected {}", plan.canvas),
            ));
        }

        // 容許兩幀或 0.1 秒的封裝誤差
        let tolerance = (2.0 / f64::from(plan.fps.max(1))).max(0.1);
        let drift = (info.duration_seconds - plan.clamped_duration).abs();
        if drift > tolerance {
            return Err(PipelineError::render(
                output,
                format!(
                    "rendered duration {:.3}s differs from planned {:.3}s",
                    info.duration_seconds, plan.clamped_duration
                ),
            ));
        }

        Ok(())
    }
}
