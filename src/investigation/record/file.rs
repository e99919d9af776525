use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{LogSink, Stream};

pub const RUN_LOG: &str = "logmfd.out";
pub const REPLICA_LOG: &str = "replica.out";

/// Writes the logs into a directory.
///
/// Only replica 0 owns the run log; appends to it from other ranks are
/// dropped. Both files are truncated on creation and flushed after every
/// append, so a crashed run leaves complete records behind.
pub struct FileSink {
    run: Option<BufWriter<File>>,
    replica: BufWriter<File>,
}

impl FileSink {
    pub fn create(dir: impl AsRef<Path>, rank: usize, size: usize) -> io::Result<Self> {
        let dir = dir.as_ref();
        let run = if rank == 0 {
            Some(open(dir.join(RUN_LOG))?)
        } else {
            None
        };
        let replica = open(replica_path(dir, rank, size))?;
        Ok(Self { run, replica })
    }
}

/// `replica.out` for a single replica, `replica.out.<rank>` otherwise.
pub fn replica_path(dir: &Path, rank: usize, size: usize) -> PathBuf {
    if size > 1 {
        dir.join(format!("{REPLICA_LOG}.{rank}"))
    } else {
        dir.join(REPLICA_LOG)
    }
}

fn open(path: PathBuf) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)?;
    tracing::debug!(path = %path.display(), "opened log file");
    Ok(BufWriter::new(file))
}

impl LogSink for FileSink {
    fn append(&mut self, stream: Stream, text: &str) -> io::Result<()> {
        let writer = match stream {
            Stream::Run => match self.run.as_mut() {
                Some(w) => w,
                None => return Ok(()),
            },
            Stream::Replica => &mut self.replica,
        };
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }
}
