mod ffprobe_info;
mod hash;
mod path_validator;
mod process_runner;
mod video_scanner;

pub use ffprobe_info::{VideoInfo, get_video_info};
pub use hash::short_path_hash;
pub use path_validator::{ensure_directory_exists, validate_directory_exists, validate_file_exists};
pub use process_runner::{ProcessFailure, ProcessOutput, command_line, run_to_completion};
pub use video_scanner::{VideoFileInfo, has_video_extension, scan_video_files};
