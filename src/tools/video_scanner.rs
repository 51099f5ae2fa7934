use crate::error::{PipelineError, PipelineResult};
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
}

#[must_use]
pub fn has_video_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|known| *known == ext)
        })
}

/// 掃描資料夾第一層的影片檔（不遞迴），依檔案大小由小到大排序
pub fn scan_video_files(
    directory: &Path,
    extensions: &[String],
) -> PipelineResult<Vec<VideoFileInfo>> {
    let mut video_files = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(PipelineError::configuration(format!(
                    "cannot read {}: {e}",
                    directory.display()
                )));
            }
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_video_extension(entry.path(), extensions) {
            continue;
        }

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                warn!("Skipping {}: {e}", entry.path().display());
                continue;
            }
        };

        video_files.push(VideoFileInfo {
            path: entry.into_path(),
            size,
        });
    }

    video_files.sort_by(|a, b| a.size.cmp(&b.size).then_with(|| a.path.cmp(&b.path)));
    Ok(video_files)
}
