//! Bounded record queue with drain-at-capacity backpressure.

use std::sync::Arc;

use contracts::Record;

/// Bounded queue of validated records.
///
/// Capacity is fixed at construction; reaching it is the only drain trigger
/// during normal operation. A drain moves every queued record into one
/// immutable batch, leaving the queue empty.
pub struct RecordQueue {
    records: Vec<Record>,
    capacity: usize,
}

impl RecordQueue {
    /// Create a queue holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record; at capacity the whole queue drains into a batch.
    pub fn push(&mut self, record: Record) -> Option<Arc<[Record]>> {
        self.records.push(record);
        if self.records.len() >= self.capacity {
            Some(self.drain())
        } else {
            None
        }
    }

    /// Drain every queued record into one immutable batch.
    pub fn drain(&mut self) -> Arc<[Record]> {
        std::mem::take(&mut self.records).into()
    }
}
