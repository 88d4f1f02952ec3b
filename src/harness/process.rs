//! Instrumented subprocess execution
//!
//! Only stdout is piped. stdin and stderr are inherited, so valgrind's own
//! report (written to stderr by default) reaches the terminal directly and may
//! interleave with the forwarded stdout chunks.
//!
//! The pipe is drained until a zero-length read. Stopping earlier would let the
//! child block on a full pipe while we block in `wait`.

use std::io::{self, ErrorKind, Read, Write};
use std::process::{Command, Stdio};

use super::error::{HarnessError, HarnessResult};
use super::invocation::Invocation;

const CHUNK_SIZE: usize = 8 * 1024;

/// What happened while draining one child. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub bytes: u64,
    pub chunks: u64,
    /// `None` when the child was killed by a signal
    pub exit_code: Option<i32>,
}

/// Copy `reader` into `sink` chunk by chunk until end-of-stream.
///
/// Each chunk is flushed as soon as it is written so a slow child's output
/// shows up while it is still running. Returns `(bytes, chunks)`.
pub fn drain<R: Read + ?Sized, W: Write + ?Sized>(reader: &mut R, sink: &mut W) -> io::Result<(u64, u64)> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut bytes = 0u64;
    let mut chunks = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        sink.write_all(&buf[..n])?;
        sink.flush()?;
        bytes += n as u64;
        chunks += 1;
    }
    Ok((bytes, chunks))
}

/// Launch `invocation`, forward its stdout into `sink`, then wait for exit.
///
/// The exit status is reported back but never treated as a failure: a target
/// that crashes under the tool is still a completed case.
pub fn run_invocation<W: Write + ?Sized>(invocation: &Invocation, sink: &mut W) -> HarnessResult<DrainReport> {
    let program = invocation.program.clone();

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| HarnessError::Launch {
            program: program.clone(),
            source,
        })?;

    let stream_error = |source: io::Error| HarnessError::Stream {
        program: program.clone(),
        source,
    };

    let drained = match child.stdout.take() {
        Some(mut stdout) => drain(&mut stdout, sink),
        None => Ok((0, 0)),
    };
    // Reap the child even if forwarding failed, so no zombie is left behind.
    let status = child.wait().map_err(stream_error)?;
    let (bytes, chunks) = drained.map_err(stream_error)?;

    tracing::debug!(bytes, chunks, %status, "child exited");
    Ok(DrainReport {
        bytes,
        chunks,
        exit_code: status.code(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    /// A reader that hands out data in small pieces and interrupts once.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        interrupted: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            let n = buf.len().min(3).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn shell(script: &str) -> Invocation {
        Invocation {
            program: "sh".to_string(),
            args: vec![OsString::from("-c"), OsString::from(script)],
            output: PathBuf::new(),
        }
    }

    #[test]
    fn test_drain_empty_stream() {
        let mut sink: Vec<u8> = Vec::new();
        let (bytes, chunks) = drain(&mut io::empty(), &mut sink).unwrap();
        assert_eq!((bytes, chunks), (0, 0));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_drain_retries_interrupted_reads() {
        let mut reader = Trickle {
            data: b"==1== LEAK SUMMARY".to_vec(),
            pos: 0,
            interrupted: false,
        };
        let mut sink: Vec<u8> = Vec::new();
        let (bytes, chunks) = drain(&mut reader, &mut sink).unwrap();
        assert_eq!(sink, b"==1== LEAK SUMMARY");
        assert_eq!(bytes, 18);
        assert_eq!(chunks, 6);
    }

    #[test]
    fn test_drain_large_stream_completely() {
        let data = vec![0x5au8; 3 * 1024 * 1024 + 17];
        let mut sink: Vec<u8> = Vec::new();
        let (bytes, _) = drain(&mut data.as_slice(), &mut sink).unwrap();
        assert_eq!(bytes, data.len() as u64);
        assert_eq!(sink.len(), data.len());
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let inv = Invocation {
            program: "memcheck-harness-no-such-tool".to_string(),
            args: Vec::new(),
            output: PathBuf::new(),
        };
        let err = run_invocation(&inv, &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, HarnessError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_child_output_is_forwarded() {
        let mut sink: Vec<u8> = Vec::new();
        let report = run_invocation(&shell("printf 'one\\ntwo\\n'"), &mut sink).unwrap();
        assert_eq!(sink, b"one\ntwo\n");
        assert_eq!(report.bytes, 8);
        assert_eq!(report.exit_code, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_child_without_output() {
        let mut sink: Vec<u8> = Vec::new();
        let report = run_invocation(&shell("exit 0"), &mut sink).unwrap();
        assert!(sink.is_empty());
        assert_eq!(report.bytes, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_multi_megabyte_child_output_does_not_deadlock() {
        let mut sink: Vec<u8> = Vec::new();
        let report = run_invocation(&shell("head -c 4194304 /dev/zero"), &mut sink).unwrap();
        assert_eq!(report.bytes, 4 * 1024 * 1024);
        assert_eq!(sink.len(), 4 * 1024 * 1024);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let mut sink: Vec<u8> = Vec::new();
        let report = run_invocation(&shell("echo crashed; exit 3"), &mut sink).unwrap();
        assert_eq!(sink, b"crashed\n");
        assert_eq!(report.exit_code, Some(3));
    }
}
