//! OS-level hotkey hook on a dedicated thread.
//!
//! `rdev::listen` blocks forever and cannot run inside a tokio task, so
//! [`HotkeyListener::start`] gives it its own OS thread and forwards matching
//! key events over an mpsc channel with `blocking_send`.
//!
//! rdev has no shutdown API; dropping the handle sets a stop flag so the
//! callback discards further events, and the thread stays parked inside the
//! OS event loop until the process exits.  It holds no resources that need
//! cleanup.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use super::HotkeyEvent;

// ---------------------------------------------------------------------------
// HotkeyListener
// ---------------------------------------------------------------------------

/// Handle to the running listener thread.  Drop it to stop forwarding.
pub struct HotkeyListener {
    stop: Arc<AtomicBool>,
    // Never joined — rdev::listen never returns.
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyListener {
    /// Watch `key` globally and forward [`HotkeyEvent::Pressed`] /
    /// [`HotkeyEvent::Released`] on `tx`.
    ///
    /// Auto-repeat while the key is held shows up as extra press events;
    /// the pipeline's Idle guard makes those harmless, so they are forwarded
    /// as-is.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread.
    pub fn start(key: rdev::Key, tx: mpsc::Sender<HotkeyEvent>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("hotkey".into())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    if stop_flag.load(Ordering::Relaxed) {
                        return;
                    }

                    let forwarded = match event.event_type {
                        rdev::EventType::KeyPress(k) if k == key => HotkeyEvent::Pressed,
                        rdev::EventType::KeyRelease(k) if k == key => HotkeyEvent::Released,
                        _ => return,
                    };

                    // The channel consumer (the pipeline loop) may lag; a
                    // dropped receiver just means we are shutting down.
                    let _ = tx.blocking_send(forwarded);
                });

                if let Err(e) = result {
                    log::error!("hotkey: listen failed: {e:?}");
                }
            })
            .expect("failed to spawn hotkey thread");

        Self {
            stop,
            _thread: thread,
        }
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
