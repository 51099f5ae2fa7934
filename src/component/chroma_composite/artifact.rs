use crate::config::{DirectoryLayout, NamingPolicy, TempCleanupPolicy};
use crate::tools::short_path_hash;
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const INTERMEDIATE_SUFFIX: &str = "_temp";
pub const OUTPUT_SUFFIX: &str = "_complete";
pub const ARTIFACT_EXTENSION: &str = "mp4";

/// 單一任務獨佔的檔案路徑
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub source: PathBuf,
    pub intermediate: PathBuf,
    pub output: PathBuf,
}

fn source_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string())
}

/// `temp/<stem>_temp.mp4` 與 `result/<stem>_complete.mp4`
#[must_use]
pub fn derive_artifact_paths(
    source: &Path,
    layout: &DirectoryLayout,
    unique_suffix: Option<&str>,
) -> ArtifactPaths {
    let stem = match unique_suffix {
        Some(suffix) => format!("{}_{suffix}", source_stem(source)),
        None => source_stem(source),
    };

    ArtifactPaths {
        source: source.to_path_buf(),
        intermediate: layout
            .temp
            .join(format!("{stem}{INTERMEDIATE_SUFFIX}.{ARTIFACT_EXTENSION}")),
        output: layout
            .output
            .join(format!("{stem}{OUTPUT_SUFFIX}.{ARTIFACT_EXTENSION}")),
    }
}

/// 為整批輸入規劃互不重疊的輸出路徑
///
/// 檔名比對不分大小寫；`Basename` 下只有撞名的後來者會加上路徑雜湊。
#[must_use]
pub fn plan_artifact_paths(
    sources: &[PathBuf],
    layout: &DirectoryLayout,
    naming: NamingPolicy,
) -> Vec<ArtifactPaths> {
    let mut taken: HashSet<String> = HashSet::with_capacity(sources.len());

    sources
        .iter()
        .map(|source| {
            let stem = source_stem(source);
            let collides = taken.contains(&stem.to_lowercase());
            let suffix = match naming {
                NamingPolicy::PathHash => Some(short_path_hash(source)),
                NamingPolicy::Basename if collides => {
                    let hash = short_path_hash(source);
                    warn!(
                        "File name collision for {}, using suffix _{hash}",
                        source.display()
                    );
                    Some(hash)
                }
                NamingPolicy::Basename => None,
            };

            let final_stem = match &suffix {
                Some(hash) => format!("{stem}_{hash}"),
                None => stem,
            };
            taken.insert(final_stem.to_lowercase());

            derive_artifact_paths(source, layout, suffix.as_deref())
        })
        .collect()
}

/// 模糊背景中間檔的守衛，離開作用域時依政策清理
#[derive(Debug)]
pub struct IntermediateArtifact {
    path: PathBuf,
    policy: TempCleanupPolicy,
    succeeded: bool,
}

impl IntermediateArtifact {
    #[must_use]
    pub fn reserve(path: &Path, policy: TempCleanupPolicy) -> Self {
        Self {
            path: path.to_path_buf(),
            policy,
            succeeded: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mark_succeeded(&mut self) {
        self.succeeded = true;
    }
}

impl Drop for IntermediateArtifact {
    fn drop(&mut self) {
        if !self.policy.should_delete(self.succeeded) || !self.path.exists() {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => info!("Removed intermediate file: {}", self.path.display()),
            Err(e) => warn!(
                "Cannot remove intermediate file {}: {e}",
                self.path.display()
            ),
        }
    }
}

/// 渲染中的輸出檔；只有 `commit` 之後才會出現在最終路徑
#[derive(Debug)]
pub struct PartialOutput {
    partial: PathBuf,
    destination: PathBuf,
    committed: bool,
}

impl PartialOutput {
    #[must_use]
    pub fn new(destination: &Path) -> Self {
        let file_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        Self {
            partial: destination.with_file_name(format!(".{file_name}.partial")),
            destination: destination.to_path_buf(),
            committed: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.partial
    }

    /// 以 rename 取代既有輸出，避免與先前的結果混在一起
    pub fn commit(mut self) -> io::Result<PathBuf> {
        fs::rename(&self.partial, &self.destination)?;
        self.committed = true;
        Ok(self.destination.clone())
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if self.committed || !self.partial.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.partial) {
            warn!(
                "Cannot remove partial output {}: {e}",
                self.partial.display()
            );
        }
    }
}
