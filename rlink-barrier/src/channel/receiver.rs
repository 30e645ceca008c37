use std::time::Duration;

use crate::channel::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use crate::metrics::{Counter, Gauge};

pub struct ChannelReceiver<T> {
    name: String,
    receiver: Receiver<T>,
    size: Gauge,
    drain_counter: Counter,
}

impl<T> std::fmt::Debug for ChannelReceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelReceiver")
            .field("name", &self.name)
            .field("size", &self.size.load())
            .field("drained", &self.drain_counter.load())
            .finish()
    }
}

impl<T> ChannelReceiver<T> {
    pub fn new(name: &str, receiver: Receiver<T>, size: Gauge, drain_counter: Counter) -> Self {
        ChannelReceiver {
            name: name.to_string(),
            receiver,
            size,
            drain_counter,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Number of events taken out of the channel
    pub fn drained(&self) -> u64 {
        self.drain_counter.load()
    }

    pub fn size(&self) -> i64 {
        self.size.load()
    }

    #[inline]
    fn on_success(&self) {
        self.size.fetch_sub(1);
        self.drain_counter.fetch_add(1);
    }

    pub fn recv(&self) -> Result<T, RecvError> {
        self.receiver.recv().map(|event| {
            self.on_success();
            event
        })
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv().map(|event| {
            self.on_success();
            event
        })
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout).map(|event| {
            self.on_success();
            event
        })
    }
}
