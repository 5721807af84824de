// Keyboard input runs on its own thread: crossterm's read() blocks, and the
// runtime must never be parked behind it.

use ratatui::crossterm::event::{self, Event};
use std::thread;
use tokio::sync::mpsc;
use tracing::warn;

/// Forwards terminal events into the runtime until the receiver goes away.
pub fn spawn_input_thread(tx: mpsc::Sender<Event>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        loop {
            match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(ev).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "input read failed");
                    return;
                }
            }
        }
    })
}
