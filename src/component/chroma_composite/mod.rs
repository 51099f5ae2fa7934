//! 綠幕合成批次處理
//!
//! 每支來源影片先經 ffmpeg 模糊縮放成直式背景中間檔，再與原片、
//! 綠幕素材疊合輸出到結果資料夾。多支影片由固定大小的 worker pool 並行處理。

mod artifact;
mod batch_scheduler;
mod chroma_key;
mod compositor;
mod main;
mod transform_command;
mod video_job;

pub use artifact::{
    ARTIFACT_EXTENSION, ArtifactPaths, INTERMEDIATE_SUFFIX, IntermediateArtifact, OUTPUT_SUFFIX,
    PartialOutput, derive_artifact_paths, plan_artifact_paths,
};
pub use batch_scheduler::{BatchReport, BatchScheduler};
pub use chroma_key::ChromaKey;
pub use compositor::{Clip, CompositePlan, Compositor, fit_width};
pub use main::ChromaCompositeBatch;
pub use transform_command::TransformCommand;
pub use video_job::{ChromaPipeline, JobResult, JobStages, JobState, VideoJob};
