//! 批次排程整合測試
//!
//! 以假的處理步驟驗證 worker pool 的並行上限與失敗隔離，不需要 ffmpeg

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use chroma_overlay_batch::component::ChromaCompositeBatch;
use chroma_overlay_batch::component::chroma_composite::{
    ArtifactPaths, BatchScheduler, JobStages, JobState, VideoJob, plan_artifact_paths,
};
use chroma_overlay_batch::config::{
    Config, DirectoryLayout, NamingPolicy, TempCleanupPolicy, UserSettings,
};
use chroma_overlay_batch::error::{ErrorKind, PipelineError, PipelineResult};
use chroma_overlay_batch::tools::scan_video_files;
use tempfile::TempDir;

/// 寫出假的中間檔與輸出檔，並記錄同時執行中的任務數
struct RecordingStages {
    active: AtomicUsize,
    peak: AtomicUsize,
    completed: Mutex<Vec<PathBuf>>,
}

impl RecordingStages {
    fn new() -> Self {
        Self {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            completed: Mutex::new(Vec::new()),
        }
    }
}

impl JobStages for RecordingStages {
    fn transform(&self, paths: &ArtifactPaths) -> PipelineResult<PathBuf> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));

        if paths.source.to_string_lossy().contains("broken") {
            self.active.fetch_sub(1, Ordering::SeqCst);
            return Err(PipelineError::decode(&paths.source, "invalid data found"));
        }
        fs::write(&paths.intermediate, b"blurred").unwrap();
        Ok(paths.intermediate.clone())
    }

    fn composite(&self, paths: &ArtifactPaths) -> PipelineResult<PathBuf> {
        thread::sleep(Duration::from_millis(10));
        fs::write(&paths.output, b"composite").unwrap();
        self.completed.lock().unwrap().push(paths.output.clone());
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(paths.output.clone())
    }
}

fn layout_in(root: &Path) -> DirectoryLayout {
    let layout = DirectoryLayout {
        input: root.join("originalVideos"),
        chroma_key: root.join("chroma_key").join("chroma_key.mp4"),
        temp: root.join("temp"),
        output: root.join("result"),
    };
    fs::create_dir_all(&layout.input).unwrap();
    fs::create_dir_all(&layout.temp).unwrap();
    fs::create_dir_all(&layout.output).unwrap();
    layout
}

fn jobs_for(layout: &DirectoryLayout, names: &[&str]) -> Vec<VideoJob> {
    let sources: Vec<PathBuf> = names
        .iter()
        .map(|name| {
            let path = layout.input.join(name);
            fs::write(&path, b"fake video").unwrap();
            path
        })
        .collect();

    plan_artifact_paths(&sources, layout, NamingPolicy::Basename)
        .into_iter()
        .enumerate()
        .map(|(id, paths)| VideoJob::new(id, paths))
        .collect()
}

/// 測試 1: 並行數不超過 worker 數，所有任務都有結果
#[test]
fn test_batch_respects_worker_limit() {
    let root = TempDir::new().unwrap();
    let layout = layout_in(root.path());
    let names: Vec<String> = (0..6).map(|i| format!("clip_{i}.mp4")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let jobs = jobs_for(&layout, &name_refs);

    let stages = RecordingStages::new();
    let report = BatchScheduler::new(2)
        .unwrap()
        .with_progress(false)
        .run(jobs, &stages, TempCleanupPolicy::DeleteOnSuccess)
        .unwrap();

    assert_eq!(report.total(), 6);
    assert!(report.all_succeeded());
    assert!(stages.peak.load(Ordering::SeqCst) <= 2, "並行數不應超過 2");
    assert_eq!(stages.completed.lock().unwrap().len(), 6);

    for i in 0..6 {
        assert!(layout.output.join(format!("clip_{i}_complete.mp4")).exists());
        assert!(!layout.temp.join(format!("clip_{i}_temp.mp4")).exists());
    }
}

/// 測試 2: 壞掉的來源只影響自己的任務
#[test]
fn test_broken_source_does_not_stop_batch() {
    let root = TempDir::new().unwrap();
    let layout = layout_in(root.path());
    let jobs = jobs_for(&layout, &["clip_a.mp4", "broken.mp4", "clip_b.mp4"]);

    let stages = RecordingStages::new();
    let report = BatchScheduler::new(3)
        .unwrap()
        .with_progress(false)
        .run(jobs, &stages, TempCleanupPolicy::DeleteOnSuccess)
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let failure = report.failures().next().unwrap();
    assert_eq!(failure.state, JobState::Failed(ErrorKind::Decode));
    assert!(failure.source.ends_with("broken.mp4"));
    assert!(!layout.output.join("broken_complete.mp4").exists());
    assert!(layout.output.join("clip_a_complete.mp4").exists());
    assert!(layout.output.join("clip_b_complete.mp4").exists());
}

/// 測試 3: 大小寫不同的同名來源會得到不同的輸出路徑
#[test]
fn test_colliding_names_get_distinct_outputs() {
    let root = TempDir::new().unwrap();
    let layout = layout_in(root.path());
    let other_dir = root.path().join("elsewhere");
    fs::create_dir_all(&other_dir).unwrap();

    let first = layout.input.join("clip.mp4");
    let second = other_dir.join("CLIP.mp4");
    let paths = plan_artifact_paths(&[first, second], &layout, NamingPolicy::Basename);

    assert_eq!(paths.len(), 2);
    assert_ne!(
        paths[0].output.to_string_lossy().to_lowercase(),
        paths[1].output.to_string_lossy().to_lowercase()
    );
    assert_ne!(paths[0].intermediate, paths[1].intermediate);
}

/// 測試 4: 找不到 ffmpeg 時任務以 ExternalProcessError 結束，不留下任何檔案
#[test]
fn test_missing_ffmpeg_fails_each_job() {
    let root = TempDir::new().unwrap();
    let config = Config::from(UserSettings {
        input_directory: root.path().join("originalVideos"),
        chroma_key_path: root.path().join("chroma_key").join("chroma_key.mp4"),
        temp_directory: root.path().join("temp"),
        output_directory: root.path().join("result"),
        ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
        ffprobe_path: PathBuf::from("/nonexistent/ffprobe"),
        ..UserSettings::default()
    });
    config.prepare_workspace().unwrap();
    fs::create_dir_all(&config.layout.input).unwrap();
    fs::write(config.layout.input.join("clip_a.mp4"), b"not really a video").unwrap();
    fs::write(config.layout.input.join("clip_b.mp4"), b"also not a video!").unwrap();

    let videos = scan_video_files(&config.layout.input, &config.video_extensions).unwrap();
    assert_eq!(videos.len(), 2);

    let batch = ChromaCompositeBatch::new(config.clone());
    let report = batch.render(&videos, 2).unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(report.failed(), 2);
    for result in &report.results {
        assert_eq!(result.state, JobState::Failed(ErrorKind::ExternalProcess));
    }
    assert_eq!(fs::read_dir(&config.layout.temp).unwrap().count(), 0);
    assert_eq!(fs::read_dir(&config.layout.output).unwrap().count(), 0);
}

/// 測試 5: worker 數為 0 是設定錯誤
#[test]
fn test_zero_workers_is_configuration_error() {
    let root = TempDir::new().unwrap();
    let config = Config::from(UserSettings {
        input_directory: root.path().join("originalVideos"),
        temp_directory: root.path().join("temp"),
        output_directory: root.path().join("result"),
        ..UserSettings::default()
    });

    let err = ChromaCompositeBatch::new(config).render(&[], 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
