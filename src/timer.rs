use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, select, tick, Receiver, Sender};

use crate::error::{EmuError, Result};

/// A 60 Hz countdown running on its own thread.
///
/// The thread owns the value; `get` and `set` are rendezvous exchanges with
/// it, so a `set` has landed before the call returns and a later `get` can
/// only see it or a value ticked down from it.
#[derive(Debug)]
pub struct Timer {
    name: &'static str,
    get_rx: Receiver<u8>,
    set_tx: Sender<u8>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    // last value seen, answered once the thread is gone
    last: u8,
}

impl Timer {
    pub fn start(name: &'static str, interval: Duration) -> Result<Self> {
        let (get_tx, get_rx) = bounded(0);
        let (set_tx, set_rx) = bounded(0);
        let (stop_tx, stop_rx) = bounded(0);

        let handle = thread::Builder::new()
            .name(format!("{name}-timer"))
            .spawn(move || countdown(interval, get_tx, set_rx, stop_rx))
            .map_err(|e| EmuError::ThreadSpawn(name, e.to_string()))?;

        Ok(Self {
            name,
            get_rx,
            set_tx,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            last: 0,
        })
    }

    pub fn get(&mut self) -> u8 {
        if let Ok(value) = self.get_rx.recv() {
            self.last = value;
        }
        self.last
    }

    pub fn set(&mut self, value: u8) {
        if self.set_tx.send(value).is_ok() {
            self.last = value;
        } else {
            log::warn!("{} timer stopped, ignoring set to {}", self.name, value);
        }
    }

    /// Ends the countdown thread. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // a dead thread has already dropped its receiver
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("{} timer thread panicked", self.name);
            }
            log::debug!("{} timer stopped", self.name);
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn countdown(interval: Duration, get_tx: Sender<u8>, set_rx: Receiver<u8>, stop_rx: Receiver<()>) {
    let ticker = tick(interval);
    let mut count: u8 = 0;
    loop {
        select! {
            send(get_tx, count) -> res => if res.is_err() { return },
            recv(set_rx) -> value => match value {
                Ok(value) => count = value,
                Err(_) => return,
            },
            recv(ticker) -> _ => count = count.saturating_sub(1),
            recv(stop_rx) -> _ => return,
        }
    }
}
