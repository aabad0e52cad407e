//! One recording attempt: an external recorder process plus its sample buffer.
//!
//! A [`CaptureSession`] is created on hotkey press and owns the recorder
//! process for its lifetime.  The pipeline worker calls [`drain`] on a
//! blocking thread, which reads the recorder's stdout in 512-byte chunks and
//! accumulates samples until the stream closes.  Hotkey release sends SIGINT
//! through the [`StopHandle`], which makes the recorder flush and exit —
//! `drain` keeps reading until EOF, so no buffered audio is lost.
//!
//! [`drain`]: CaptureSession::drain

use std::io::{self, Read};
use std::process::{Child, ChildStdout, Stdio};

use thiserror::Error;

use super::commands::CommandSpec;
use super::format;

/// Bytes per blocking read from the recorder's stdout.
const READ_CHUNK: usize = 512;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Failure to launch the recorder — fatal, the caller does not retry.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to launch recorder `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// SampleBuffer
// ---------------------------------------------------------------------------

/// Append-only sample accumulator with odd-byte carry.
///
/// Pipe reads are not guaranteed to land on a sample boundary, so a chunk may
/// end mid-sample; the dangling byte is held back and rejoined with the next
/// chunk.  Accumulation is lossless and order-preserving.
#[derive(Debug, Default)]
struct SampleBuffer {
    samples: Vec<i16>,
    pending: Option<u8>,
    bytes_read: u64,
}

impl SampleBuffer {
    fn append_bytes(&mut self, chunk: &[u8]) {
        self.bytes_read += chunk.len() as u64;

        let joined: Vec<u8>;
        let data: &[u8] = if let Some(carry) = self.pending.take() {
            let mut v = Vec::with_capacity(chunk.len() + 1);
            v.push(carry);
            v.extend_from_slice(chunk);
            joined = v;
            &joined
        } else {
            chunk
        };

        let aligned = data.len() & !1;
        self.samples
            .extend(format::bytes_to_samples(&data[..aligned]));
        if aligned < data.len() {
            self.pending = Some(data[aligned]);
        }
    }

    fn into_samples(self) -> Vec<i16> {
        if self.pending.is_some() {
            // A recorder emitting s16 frames always closes on a sample
            // boundary; a dangling byte means the stream was truncated.
            log::warn!("capture: discarding trailing half-sample byte");
        }
        self.samples
    }
}

// ---------------------------------------------------------------------------
// StopHandle
// ---------------------------------------------------------------------------

/// Signals the recorder to stop.
///
/// Held by the controller while the session's reader runs on another thread;
/// sending SIGINT makes the recorder flush and close its stdout, which the
/// reader observes as EOF.
#[derive(Debug, Clone, Copy)]
pub struct StopHandle {
    pid: i32,
}

impl StopHandle {
    /// Send SIGINT to the recorder process.
    pub fn interrupt(&self) {
        let rc = unsafe { libc::kill(self.pid as libc::pid_t, libc::SIGINT) };
        if rc != 0 {
            log::warn!(
                "capture: SIGINT to recorder pid {} failed: {}",
                self.pid,
                io::Error::last_os_error()
            );
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

/// An owned recorder process and the audio it has produced so far.
#[derive(Debug)]
pub struct CaptureSession {
    child: Child,
    stdout: ChildStdout,
    buffer: SampleBuffer,
}

impl CaptureSession {
    /// Spawn the recorder with piped stdout.
    ///
    /// # Errors
    ///
    /// [`CaptureError::Spawn`] when the executable cannot be launched.
    pub fn start(command: &CommandSpec) -> Result<Self, CaptureError> {
        let mut child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CaptureError::Spawn {
                command: command.to_string(),
                source,
            })?;

        // stdout is always present with Stdio::piped.
        let stdout = child.stdout.take().expect("recorder stdout piped");

        log::info!("capture: recorder started (pid {})", child.id());

        Ok(Self {
            child,
            stdout,
            buffer: SampleBuffer::default(),
        })
    }

    /// Handle for interrupting the recorder from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            pid: self.child.id() as i32,
        }
    }

    /// Read the recorder's stdout to EOF, accumulating samples, then reap the
    /// process and return the buffer in capture order.
    ///
    /// Blocks until the recorder exits — call from a blocking thread.
    pub fn drain(mut self) -> io::Result<Vec<i16>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.stdout.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => self.buffer.append_bytes(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // Reap before surfacing the error so no zombie is left.
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    return Err(e);
                }
            }
        }

        let status = self.child.wait()?;
        log::debug!(
            "capture: recorder exited ({status}), {} bytes / {} samples",
            self.buffer.bytes_read,
            self.buffer.samples.len()
        );

        Ok(self.buffer.into_samples())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh", &["-c", script])
    }

    // ---- SampleBuffer ------------------------------------------------------

    #[test]
    fn split_sample_is_rejoined_across_chunks() {
        let mut buf = SampleBuffer::default();
        buf.append_bytes(&[0x01]);
        buf.append_bytes(&[0x02, 0x03, 0x04]);
        // le pairs: (0x01,0x02) = 0x0201, (0x03,0x04) = 0x0403
        assert_eq!(buf.into_samples(), vec![0x0201, 0x0403]);
    }

    #[test]
    fn accumulation_is_lossless_for_any_chunking() {
        let bytes: Vec<u8> = (0u16..200).map(|i| (i % 251) as u8).collect();
        let expected = format::bytes_to_samples(&bytes);

        // Slice the same byte stream at several awkward chunk sizes; the
        // accumulated buffer must always equal the contiguous decode.
        for chunk_size in [1usize, 2, 3, 5, 7, 64, 199] {
            let mut buf = SampleBuffer::default();
            for chunk in bytes.chunks(chunk_size) {
                buf.append_bytes(chunk);
            }
            assert_eq!(buf.into_samples(), expected, "chunk_size={chunk_size}");
        }
    }

    #[test]
    fn bytes_read_counts_every_byte() {
        let mut buf = SampleBuffer::default();
        buf.append_bytes(&[1, 2, 3]);
        buf.append_bytes(&[4]);
        assert_eq!(buf.bytes_read, 4);
    }

    // ---- CaptureSession against real short-lived processes -----------------

    #[test]
    fn drain_collects_process_output_in_order() {
        // bytes 0,1,255,255 → samples [256, -1]
        let session = CaptureSession::start(&sh("printf '\\000\\001\\377\\377'")).unwrap();
        let samples = session.drain().unwrap();
        assert_eq!(samples, vec![256, -1]);
    }

    #[test]
    fn drain_handles_output_larger_than_one_read() {
        // 4096 zero bytes → 2048 zero samples, spanning several 512-byte reads.
        let session =
            CaptureSession::start(&sh("head -c 4096 /dev/zero")).unwrap();
        let samples = session.drain().unwrap();
        assert_eq!(samples.len(), 2048);
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn interrupt_unblocks_an_endless_recorder() {
        let session = CaptureSession::start(&sh("cat /dev/zero")).unwrap();
        let stop = session.stop_handle();

        // Let it fill the pipe a little, then interrupt.
        std::thread::sleep(std::time::Duration::from_millis(100));
        stop.interrupt();

        let samples = session.drain().unwrap();
        assert!(!samples.is_empty());
    }

    #[test]
    fn spawn_failure_is_reported() {
        let missing = CommandSpec::new("/nonexistent/recorder-binary", &[]);
        let err = CaptureSession::start(&missing).unwrap_err();
        assert!(matches!(err, CaptureError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/recorder-binary"));
    }
}
