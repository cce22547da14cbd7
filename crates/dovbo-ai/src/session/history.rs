//! Bounded conversation history with an optional pinned system message.

use std::collections::VecDeque;

use crate::{Message, Role};

/// FIFO window of messages. The pinned system message does not count
/// against the capacity and is always read first.
#[derive(Debug, Clone)]
pub struct History {
    pinned: Option<Message>,
    entries: VecDeque<Message>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            pinned: None,
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Set (or replace) the pinned system message.
    pub fn pin_system(&mut self, content: impl Into<String>) {
        self.pinned = Some(Message::new(Role::System, content));
    }

    /// Append a message, evicting the oldest entries past capacity.
    pub fn push(&mut self, message: Message) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    /// Snapshot in insertion order, pinned system message first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.pinned
            .iter()
            .chain(self.entries.iter())
            .cloned()
            .collect()
    }

    /// Number of windowed entries (the pinned message is not counted).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop windowed entries; the pinned message stays.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
