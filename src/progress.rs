// src/progress.rs

use indicatif::ProgressBar;
use std::io::{self, Write};

/// Log writer that hides `bar` while a line is written, so log output and
/// spinner redraws never share a terminal line.
#[derive(Clone)]
pub struct SuspendingWriter {
    bar: ProgressBar,
}

impl SuspendingWriter {
    pub fn new(bar: ProgressBar) -> Self {
        SuspendingWriter { bar }
    }
}

impl Write for SuspendingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
