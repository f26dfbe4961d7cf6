//! Wapiti subprocess.

use super::Labeler;
use crate::config::LabelerConfig;
use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct WapitiLabeler {
    binary: PathBuf,
    model: Option<PathBuf>,
    threads: usize,
}

impl WapitiLabeler {
    pub fn new(config: &LabelerConfig) -> Self {
        let threads = config.threads.unwrap_or_else(|| {
            std::thread::available_parallelism().map(|n| n.get().saturating_sub(1)).unwrap_or(1).max(1)
        });
        Self { binary: config.binary.clone(), model: config.model.clone(), threads }
    }

    /// Run the binary to completion, logging its output line by line.
    fn run(&self, args: &[&OsStr]) -> Result<()> {
        let started = Instant::now();
        let name = self.binary.display().to_string();
        debug!(binary = %name, ?args, "starting labeler");

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::labeler(format!("could not start {name}: {e}")))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let status = std::thread::scope(|s| {
            if let Some(out) = stdout {
                s.spawn(move || drain("stdout", out));
            }
            if let Some(err) = stderr {
                s.spawn(move || drain("stderr", err));
            }
            child.wait()
        })
        .map_err(|e| Error::labeler(format!("waiting for {name}: {e}")))?;

        if !status.success() {
            return Err(Error::labeler(format!("{name} {} exited with {status}", args_label(args))));
        }
        info!(binary = %name, command = %args_label(args), elapsed_ms = started.elapsed().as_millis() as u64, "labeler finished");
        Ok(())
    }
}

fn args_label(args: &[&OsStr]) -> String {
    args.first().map(|a| a.to_string_lossy().into_owned()).unwrap_or_default()
}

fn drain(stream: &'static str, pipe: impl Read) {
    for line in BufReader::new(pipe).lines() {
        match line {
            Ok(line) => debug!(stream, "{line}"),
            Err(_) => break,
        }
    }
}

impl Labeler for WapitiLabeler {
    fn label(&self, input: &Path, output: &Path) -> Result<()> {
        let model = self.model.as_deref().ok_or_else(|| Error::labeler("no labeler model configured"))?;
        self.run(&[
            OsStr::new("label"),
            OsStr::new("-s"),
            OsStr::new("-p"),
            OsStr::new("-m"),
            model.as_os_str(),
            input.as_os_str(),
            output.as_os_str(),
        ])
    }

    fn train(&self, train: &Path, dev: &Path, templates: &Path, model: &Path) -> Result<()> {
        let threads = self.threads.to_string();
        self.run(&[
            OsStr::new("train"),
            OsStr::new("-t"),
            OsStr::new(&threads),
            OsStr::new("-p"),
            templates.as_os_str(),
            OsStr::new("-d"),
            dev.as_os_str(),
            train.as_os_str(),
            model.as_os_str(),
        ])
    }
}
