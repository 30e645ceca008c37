use crate::channel::{SendError, Sender};
use crate::metrics::{Counter, Gauge};

pub struct ChannelSender<T> {
    name: String,
    sender: Sender<T>,

    size: Gauge,
    counter: Counter,
}

impl<T> Clone for ChannelSender<T> {
    fn clone(&self) -> Self {
        ChannelSender {
            name: self.name.clone(),
            sender: self.sender.clone(),
            size: self.size.clone(),
            counter: self.counter.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ChannelSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSender")
            .field("name", &self.name)
            .field("size", &self.size.load())
            .field("accepted", &self.counter.load())
            .finish()
    }
}

impl<T> ChannelSender<T> {
    pub fn new(name: &str, sender: Sender<T>, size: Gauge, counter: Counter) -> Self {
        ChannelSender {
            name: name.to_string(),
            sender,
            size,
            counter,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Number of events accepted by the channel
    pub fn accepted(&self) -> u64 {
        self.counter.load()
    }

    /// Number of events waiting in the channel
    pub fn size(&self) -> i64 {
        self.size.load()
    }

    #[inline]
    fn on_success(&self) {
        self.size.fetch_add(1);
        self.counter.fetch_add(1);
    }

    /// Blocks while a bounded channel is full.
    pub fn send(&self, event: T) -> Result<(), SendError<T>> {
        self.sender.send(event).map(|r| {
            self.on_success();
            r
        })
    }
}
