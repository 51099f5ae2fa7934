use super::video_job::{JobResult, JobStages, VideoJob};
use crate::config::TempCleanupPolicy;
use crate::error::{ErrorKind, PipelineError, PipelineResult};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::ThreadPoolBuilder;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::time::Instant;

/// 整批任務的結果（依完成順序）
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<JobResult>,
}

impl BatchReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// 各錯誤類型的失敗數量
    #[must_use]
    pub fn failures_by_kind(&self) -> BTreeMap<ErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for kind in self.failures().filter_map(JobResult::error_kind) {
            *counts.entry(kind).or_insert(0) += 1;
        }
        counts
    }
}

/// 固定大小的 worker pool；每個 worker 同步地跑完一個任務才接下一個
pub struct BatchScheduler {
    workers: NonZeroUsize,
    show_progress: bool,
}

/// 把任務中的 panic 轉成該任務自己的 `WorkerPanic` 失敗
fn run_isolated<S>(job: VideoJob, stages: &S, cleanup: TempCleanupPolicy) -> JobResult
where
    S: JobStages + ?Sized,
{
    let job_id = job.id();
    let paths = job.paths().clone();
    let started = Instant::now();

    panic::catch_unwind(AssertUnwindSafe(|| job.run(stages, cleanup))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        JobResult::panicked(job_id, paths, started.elapsed(), &message)
    })
}

impl BatchScheduler {
    /// 不會依機器核心數調整 `workers`
    pub fn new(workers: usize) -> PipelineResult<Self> {
        let workers = NonZeroUsize::new(workers).ok_or_else(|| {
            PipelineError::configuration("worker pool size must be a positive integer")
        })?;
        Ok(Self {
            workers,
            show_progress: true,
        })
    }

    #[must_use]
    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers.get()
    }

    /// 所有任務都進入 Done 或 Failed 後才回傳
    pub fn run<S>(
        &self,
        jobs: Vec<VideoJob>,
        stages: &S,
        cleanup: TempCleanupPolicy,
    ) -> PipelineResult<BatchReport>
    where
        S: JobStages + ?Sized,
    {
        let total = jobs.len();
        info!(
            "Starting batch: {total} videos on {} workers",
            self.workers
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers.get())
            .thread_name(|index| format!("video-worker-{index}"))
            .build()
            .map_err(|e| PipelineError::configuration(format!("cannot start worker pool: {e}")))?;

        let progress_bar = self.progress_bar(total);
        let (sender, receiver) = mpsc::channel::<JobResult>();
        let mut results = Vec::with_capacity(total);

        pool.in_place_scope(|scope| {
            for job in jobs {
                let sender = sender.clone();
                scope.spawn(move |_| {
                    let result = run_isolated(job, stages, cleanup);
                    if sender.send(result).is_err() {
                        warn!("Result channel closed before job finished");
                    }
                });
            }
            drop(sender);

            for result in receiver {
                progress_bar.inc(1);
                if let Some(name) = result.source.file_name() {
                    progress_bar.set_message(name.to_string_lossy().into_owned());
                }
                results.push(result);
            }
        });

        progress_bar.finish_and_clear();

        let report = BatchReport { results };
        info!(
            "Batch finished - succeeded: {}, failed: {}",
            report.succeeded(),
            report.failed()
        );
        for (kind, count) in report.failures_by_kind() {
            warn!("  {kind}: {count}");
        }

        Ok(report)
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            progress_bar.set_style(style.progress_chars("#>-"));
        }
        progress_bar
    }
}
