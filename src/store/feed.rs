//! Room change feed
//!
//! Each subscriber gets its own channel. A new subscriber receives the
//! current snapshot straight away, then every committed change in commit
//! order. Dropping a [`Subscription`] closes its channel and the next
//! publish forgets it.

use crate::room::{Room, RoomCode};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Receiving end of a room feed.
pub struct Subscription {
    code: RoomCode,
    rx: Receiver<Room>,
    /// Whether the store still holds the sending side
    alive: bool,
}

impl Subscription {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Next pending snapshot, without blocking.
    pub fn try_recv(&mut self) -> Option<Room> {
        match self.rx.try_recv() {
            Ok(room) => Some(room),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.alive = false;
                None
            }
        }
    }

    /// Wait up to `timeout` for the next snapshot.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Room> {
        match self.rx.recv_timeout(timeout) {
            Ok(room) => Some(room),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.alive = false;
                None
            }
        }
    }

    /// All pending snapshots, oldest first.
    pub fn drain(&mut self) -> Vec<Room> {
        let mut rooms = Vec::new();
        while let Some(room) = self.try_recv() {
            rooms.push(room);
        }
        rooms
    }

    /// Newest pending snapshot, skipping the ones before it.
    pub fn latest(&mut self) -> Option<Room> {
        self.drain().pop()
    }

    /// False once the store that fed this subscription is gone.
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Sending side shared by the store implementations.
#[derive(Default)]
pub struct Subscribers {
    senders: Mutex<HashMap<RoomCode, Vec<Sender<Room>>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and hand it `snapshot` as its first message.
    ///
    /// Call with the store's lock held so no commit slips in between.
    pub fn subscribe(&self, snapshot: &Room) -> Subscription {
        let (tx, rx) = channel();
        // The receiver is alive right here, so this cannot fail
        let _ = tx.send(snapshot.clone());
        self.senders
            .lock()
            .entry(snapshot.code().clone())
            .or_default()
            .push(tx);
        Subscription {
            code: snapshot.code().clone(),
            rx,
            alive: true,
        }
    }

    /// Send `room` to every live subscriber of its code.
    pub fn publish(&self, room: &Room) {
        let mut senders = self.senders.lock();
        if let Some(list) = senders.get_mut(room.code()) {
            list.retain(|tx| tx.send(room.clone()).is_ok());
            if list.is_empty() {
                senders.remove(room.code());
            }
        }
    }

    /// Number of subscribers registered for `code`, including ones not yet pruned.
    pub fn count(&self, code: &RoomCode) -> usize {
        self.senders.lock().get(code).map_or(0, Vec::len)
    }
}
