use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessFailure {
    #[error("failed to start: {0}")]
    Spawn(std::io::Error),

    #[error("failed while waiting: {0}")]
    Wait(std::io::Error),

    #[error("timed out after {}s and was killed", .0.as_secs())]
    TimedOut(Duration),

    #[error("exited with {}: {stderr}", describe_code(.code))]
    Exited { code: Option<i32>, stderr: String },
}

fn describe_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| format!("status {c}"))
}

/// 子程序守衛：尚未回收就被丟棄時，強制結束並回收，避免殘留程序
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn kill_and_reap(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            self.kill_and_reap();
        }
    }
}

fn spawn_pipe_reader<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    let mut pipe = pipe?;
    Some(thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        buffer
    }))
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// 執行外部程式直到結束，同時收集 stdout / stderr
///
/// `timeout` 為 `None` 時無限期等待；超時會終止子程序並回報 `TimedOut`。
pub fn run_to_completion(
    command: &mut Command,
    timeout: Option<Duration>,
) -> Result<ProcessOutput, ProcessFailure> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = command.spawn().map_err(ProcessFailure::Spawn)?;
    let mut guard = ChildGuard {
        child,
        reaped: false,
    };

    let stdout_reader = spawn_pipe_reader(guard.child.stdout.take());
    let stderr_reader = spawn_pipe_reader(guard.child.stderr.take());

    let status = wait_for_exit(&mut guard, timeout)?;

    let stdout = join_reader(stdout_reader);
    let stderr = String::from_utf8_lossy(&join_reader(stderr_reader))
        .trim()
        .to_string();

    if status.success() {
        Ok(ProcessOutput { stdout, stderr })
    } else {
        Err(ProcessFailure::Exited {
            code: status.code(),
            stderr,
        })
    }
}

fn wait_for_exit(
    guard: &mut ChildGuard,
    timeout: Option<Duration>,
) -> Result<ExitStatus, ProcessFailure> {
    let Some(limit) = timeout else {
        let status = guard.child.wait().map_err(ProcessFailure::Wait)?;
        guard.reaped = true;
        return Ok(status);
    };

    let started = Instant::now();
    loop {
        match guard.child.try_wait() {
            Ok(Some(status)) => {
                guard.reaped = true;
                return Ok(status);
            }
            Ok(None) => {}
            Err(e) => return Err(ProcessFailure::Wait(e)),
        }

        if started.elapsed() >= limit {
            guard.kill_and_reap();
            return Err(ProcessFailure::TimedOut(limit));
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// 組出可貼到終端機重現的命令列（僅供 debug log）
#[must_use]
pub fn command_line(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_spawn_failure() {
        let mut command = Command::new("/nonexistent/bin/ffmpeg");
        let failure = run_to_completion(&mut command, None).unwrap_err();
        assert!(matches!(failure, ProcessFailure::Spawn(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_non_zero_exit() {
        let mut ok = Command::new("sh");
        ok.args(["-c", "printf hello"]);
        let output = run_to_completion(&mut ok, None).unwrap();
        assert_eq!(output.stdout, b"hello");

        let mut failing = Command::new("sh");
        failing.args(["-c", "echo broken >&2; exit 3"]);
        match run_to_completion(&mut failing, None).unwrap_err() {
            ProcessFailure::Exited { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let mut command = Command::new("sh");
        command.args(["-c", "sleep 5"]);
        let started = Instant::now();
        let failure = run_to_completion(&mut command, Some(Duration::from_millis(200))).unwrap_err();
        assert!(matches!(failure, ProcessFailure::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_command_line() {
        let mut command = Command::new("ffmpeg");
        command.args(["-i", "in.mp4", "out.mp4"]);
        assert_eq!(command_line(&command), "ffmpeg -i in.mp4 out.mp4");
    }
}
