//! Logger setup: every record goes to stderr and to a per-run log file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

/// Writes every buffer to both sinks. A failing file sink never silences
/// the console.
pub struct LogTee<A, B> {
    console: A,
    file: B,
}

impl<A: Write, B: Write> LogTee<A, B> {
    pub fn new(console: A, file: B) -> Self {
        Self { console, file }
    }
}

impl<A: Write, B: Write> Write for LogTee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.console.write_all(buf)?;
        let _ = self.file.write_all(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.file.flush();
        self.console.flush()
    }
}

/// `<dir>/quiz_solver_<YYYYmmdd_HHMMSS>.log`, creating `dir` if needed.
pub fn create_log_file(dir: &Path) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "quiz_solver_{}.log",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    let file = File::create(&path)?;
    Ok((path, file))
}

/// Installs env_logger (default level `info`). Falls back to stderr only
/// when the log file cannot be created.
pub fn init(log_dir: &str) -> Option<PathBuf> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("info"));

    match create_log_file(Path::new(log_dir)) {
        Ok((path, file)) => {
            builder.target(env_logger::Target::Pipe(Box::new(LogTee::new(
                io::stderr(),
                file,
            ))));
            builder.init();
            Some(path)
        }
        Err(e) => {
            builder.init();
            log::warn!("Could not create log file in {}: {}", log_dir, e);
            None
        }
    }
}
