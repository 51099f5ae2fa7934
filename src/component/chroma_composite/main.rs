use super::artifact::plan_artifact_paths;
use super::batch_scheduler::{BatchReport, BatchScheduler};
use super::video_job::{ChromaPipeline, VideoJob};
use crate::config::Config;
use crate::error::PipelineResult;
use crate::tools::{VideoFileInfo, scan_video_files};
use anyhow::Result;
use console::style;
use dialoguer::Input;
use log::info;
use rust_i18n::t;
use std::path::PathBuf;
use sysinfo::System;

pub struct ChromaCompositeBatch {
    config: Config,
}

impl ChromaCompositeBatch {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<BatchReport> {
        println!("{}", style(t!("batch.title")).cyan().bold());

        self.config.validate_assets()?;
        self.config.prepare_workspace()?;

        let input_dir = &self.config.layout.input;
        println!(
            "{}",
            style(t!("batch.scanning", dir = input_dir.display())).dim()
        );
        let video_files = scan_video_files(input_dir, &self.config.video_extensions)?;

        if video_files.is_empty() {
            println!(
                "{}",
                style(t!("batch.no_videos", dir = input_dir.display())).yellow()
            );
            return Ok(BatchReport::default());
        }

        println!(
            "{}",
            style(t!("batch.found", count = video_files.len())).green()
        );
        for (index, file) in video_files.iter().enumerate() {
            let size_mb = file.size as f64 / 1024.0 / 1024.0;
            println!(
                "  {}. {} ({:.2} MB)",
                index + 1,
                file.path.file_name().unwrap_or_default().to_string_lossy(),
                size_mb
            );
        }

        println!();
        let workers = self.prompt_worker_count()?;
        println!();
        println!("{}", style(t!("batch.starting", workers = workers)).cyan());

        let report = self.render(&video_files, workers)?;
        self.print_summary(&report);

        Ok(report)
    }

    /// 非互動的批次入口：規劃路徑、建立任務並交給 scheduler
    pub fn render(&self, videos: &[VideoFileInfo], workers: usize) -> PipelineResult<BatchReport> {
        let scheduler = BatchScheduler::new(workers)?;

        let sources: Vec<PathBuf> = videos.iter().map(|v| v.path.clone()).collect();
        let jobs = plan_artifact_paths(&sources, &self.config.layout, self.config.naming)
            .into_iter()
            .enumerate()
            .map(|(id, paths)| VideoJob::new(id, paths))
            .collect();

        info!(
            "Intermediate cleanup policy: {}",
            self.config.temp_cleanup
        );
        let pipeline = ChromaPipeline::new(&self.config);
        scheduler.run(jobs, &pipeline, self.config.temp_cleanup)
    }

    fn prompt_worker_count(&self) -> Result<usize> {
        let mut system = System::new();
        system.refresh_cpu_all();
        let cpu_count = system.cpus().len();
        if cpu_count > 0 {
            println!("{}", style(t!("batch.cpu_hint", count = cpu_count)).dim());
        }

        let workers: usize = Input::new()
            .with_prompt(t!("batch.prompt_workers"))
            .validate_with(|value: &usize| -> Result<(), String> {
                if *value > 0 {
                    Ok(())
                } else {
                    Err(t!("batch.invalid_workers").to_string())
                }
            })
            .interact_text()?;
        Ok(workers)
    }

    fn print_summary(&self, report: &BatchReport) {
        println!();
        println!("{}", style(t!("batch.summary_title")).cyan().bold());
        println!("{}", t!("batch.summary_total", count = report.total()));
        println!(
            "{}",
            style(t!("batch.summary_succeeded", count = report.succeeded())).green()
        );

        if report.failed() > 0 {
            println!(
                "{}",
                style(t!("batch.summary_failed", count = report.failed())).red()
            );
            for failure in report.failures() {
                if let Err(e) = &failure.outcome {
                    println!(
                        "{}",
                        t!(
                            "batch.failed_item",
                            path = failure.source.display(),
                            kind = e.kind(),
                            cause = e
                        )
                    );
                }
            }
        }

        info!(
            "Composite batch done - succeeded: {}, failed: {}",
            report.succeeded(),
            report.failed()
        );
    }
}
