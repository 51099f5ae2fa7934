use crate::config::TransformSpec;
use crate::error::{PipelineError, PipelineResult};
use crate::tools::{command_line, run_to_completion};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// 產生模糊、重新取景後的背景影片
pub struct TransformCommand {
    program: PathBuf,
    settings: TransformSpec,
    source_path: PathBuf,
    destination_path: PathBuf,
}

impl TransformCommand {
    #[must_use]
    pub fn new(program: &Path, settings: &TransformSpec, source_path: &Path, destination: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            settings: settings.clone(),
            source_path: source_path.to_path_buf(),
            destination_path: destination.to_path_buf(),
        }
    }

    #[must_use]
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    #[must_use]
    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);

        cmd.args([
            "-hide_banner",
            "-nostdin",
            "-loglevel", self.settings.log_level,
            if self.settings.overwrite { "-y" } else { "-n" },
        ]);
        cmd.arg("-i").arg(&self.source_path);
        cmd.args([
            "-vf", &self.settings.blur.filter_expression(),
            "-s", &self.settings.resolution.to_string(),
            "-r", &self.settings.fps.to_string(),
            "-an",
        ]);
        cmd.arg(&self.destination_path);

        cmd
    }

    /// 阻塞直到 ffmpeg 結束；失敗不重試
    pub fn execute(&self, timeout: Option<Duration>) -> PipelineResult<PathBuf> {
        let mut command = self.build_command();
        debug!("Transform: {}", command_line(&command));

        run_to_completion(&mut command, timeout).map_err(|e| {
            PipelineError::external_process(self.program.display().to_string(), e.to_string())
        })?;

        Ok(self.destination_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_build_command_arguments() {
        let transform = TransformCommand::new(
            Path::new("ffmpeg"),
            &TransformSpec::default(),
            Path::new("originalVideos/clip_a.mp4"),
            Path::new("temp/clip_a_temp.mp4"),
        );
        let cmd = transform.build_command();
        assert_eq!(cmd.get_program(), "ffmpeg");

        let args = args_of(&cmd);
        assert_eq!(
            args,
            vec![
                "-hide_banner", "-nostdin", "-loglevel", "error", "-y",
                "-i", "originalVideos/clip_a.mp4",
                "-vf", "boxblur=10:5",
                "-s", "1080x1920",
                "-r", "24",
                "-an",
                "temp/clip_a_temp.mp4",
            ]
        );
    }

    #[test]
    fn test_no_overwrite_flag() {
        let settings = TransformSpec {
            overwrite: false,
            ..TransformSpec::default()
        };
        let transform = TransformCommand::new(
            Path::new("ffmpeg"),
            &settings,
            Path::new("a.mp4"),
            Path::new("a_temp.mp4"),
        );
        let args = args_of(&transform.build_command());
        assert!(args.contains(&"-n".to_string()));
        assert!(!args.contains(&"-y".to_string()));
    }

    #[test]
    fn test_missing_executable_is_external_process_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let destination = dir.path().join("clip_temp.mp4");
        let transform = TransformCommand::new(
            Path::new("/nonexistent/ffmpeg"),
            &TransformSpec::default(),
            Path::new("clip.mp4"),
            &destination,
        );

        let err = transform.execute(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalProcess);
        assert!(err.to_string().contains("/nonexistent/ffmpeg"));
        assert!(!destination.exists());
    }
}
