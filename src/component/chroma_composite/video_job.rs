use super::artifact::{ArtifactPaths, IntermediateArtifact};
use super::compositor::Compositor;
use super::transform_command::TransformCommand;
use crate::config::{Config, TempCleanupPolicy};
use crate::error::{ErrorKind, PipelineError, PipelineResult};
use log::{debug, error, info, warn};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Transforming,
    Compositing,
    Done,
    Failed(ErrorKind),
}

impl JobState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Transforming)
                | (Self::Transforming, Self::Compositing)
                | (Self::Compositing, Self::Done)
                | (
                    Self::Pending | Self::Transforming | Self::Compositing,
                    Self::Failed(_)
                )
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Transforming => f.write_str("Transforming"),
            Self::Compositing => f.write_str("Compositing"),
            Self::Done => f.write_str("Done"),
            Self::Failed(kind) => write!(f, "Failed({kind})"),
        }
    }
}

/// 任務依序呼叫的兩個步驟
pub trait JobStages: Sync {
    /// 產生模糊背景中間檔
    fn transform(&self, paths: &ArtifactPaths) -> PipelineResult<PathBuf>;

    /// 合成並寫出最終輸出檔
    fn composite(&self, paths: &ArtifactPaths) -> PipelineResult<PathBuf>;
}

/// 以 ffmpeg / ffprobe 實作的正式流程
pub struct ChromaPipeline<'a> {
    config: &'a Config,
}

impl<'a> ChromaPipeline<'a> {
    #[must_use]
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }
}

impl JobStages for ChromaPipeline<'_> {
    fn transform(&self, paths: &ArtifactPaths) -> PipelineResult<PathBuf> {
        TransformCommand::new(
            &self.config.tools.ffmpeg,
            &self.config.transform,
            &paths.source,
            &paths.intermediate,
        )
        .execute(self.config.process_timeout)
    }

    fn composite(&self, paths: &ArtifactPaths) -> PipelineResult<PathBuf> {
        Compositor::new(self.config).composite(paths)
    }
}

#[derive(Debug)]
pub struct JobResult {
    pub job_id: usize,
    pub source: PathBuf,
    pub output: PathBuf,
    pub state: JobState,
    pub outcome: PipelineResult<PathBuf>,
    pub elapsed: Duration,
}

impl JobResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.outcome.as_ref().err().map(|e| e.kind())
    }
    /// 處理步驟 panic 後補上的失敗結果
    #[must_use]
    pub fn panicked(job_id: usize, paths: ArtifactPaths, elapsed: Duration, message: &str) -> Self {
        error!(
            "Video failed [{job_id}]: {} panicked: {message}",
            paths.source.display()
        );
        Self {
            job_id,
            source: paths.source,
            output: paths.output,
            state: JobState::Failed(ErrorKind::WorkerPanic),
            outcome: Err(PipelineError::worker_panic(message)),
            elapsed,
        }
    }
}

#[derive(Debug)]
pub struct VideoJob {
    id: usize,
    paths: ArtifactPaths,
    state: JobState,
}

impl VideoJob {
    #[must_use]
    pub const fn new(id: usize, paths: ArtifactPaths) -> Self {
        Self {
            id,
            paths,
            state: JobState::Pending,
        }
    }

    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub const fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    #[must_use]
    pub const fn state(&self) -> JobState {
        self.state
    }

    /// 不合法的轉換在 debug 與 release 下都只記錄 warn，狀態維持不變
    fn transition(&mut self, next: JobState) {
        if !self.state.can_transition_to(next) {
            warn!(
                "Job [{}] ignored illegal transition {} -> {next}",
                self.id, self.state
            );
            return;
        }
        debug!("Job [{}] {} -> {next}", self.id, self.state);
        self.state = next;
    }

    /// 轉換 → 合成，任何一步失敗即終止，不重試
    pub fn run<S>(mut self, stages: &S, cleanup: TempCleanupPolicy) -> JobResult
    where
        S: JobStages + ?Sized,
    {
        let started = Instant::now();
        info!("Starting video [{}]: {}", self.id, self.paths.source.display());

        let outcome = self.execute(stages, cleanup);
        let elapsed = started.elapsed();

        match &outcome {
            Ok(output) => {
                self.transition(JobState::Done);
                info!(
                    "Video processed [{}]: {} -> {} ({:.1}s)",
                    self.id,
                    self.paths.source.display(),
                    output.display(),
                    elapsed.as_secs_f64()
                );
            }
            Err(e) => {
                let failed_during = self.state;
                self.transition(JobState::Failed(e.kind()));
                error!(
                    "Video failed [{}]: {} while {failed_during}: {} - {e}",
                    self.id,
                    self.paths.source.display(),
                    e.kind()
                );
            }
        }

        JobResult {
            job_id: self.id,
            source: self.paths.source,
            output: self.paths.output,
            state: self.state,
            outcome,
            elapsed,
        }
    }

    fn execute<S>(&mut self, stages: &S, cleanup: TempCleanupPolicy) -> PipelineResult<PathBuf>
    where
        S: JobStages + ?Sized,
    {
        let mut intermediate = IntermediateArtifact::reserve(&self.paths.intermediate, cleanup);

        self.transition(JobState::Transforming);
        let background = stages.transform(&self.paths)?;
        debug!("Job [{}] background ready: {}", self.id, background.display());

        self.transition(JobState::Compositing);
        let output = stages.composite(&self.paths)?;

        intermediate.mark_succeeded();
        debug!(
            "Job [{}] releasing intermediate {}",
            self.id,
            intermediate.path().display()
        );
        Ok(output)
    }
}
