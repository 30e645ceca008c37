//! Barrier node runtime
//!
//! ```text
//!                   ┌─────────────────────────────────────────────┐
//!  input channel ──►│ GroupedConsumer ─► TimedForwarder(group a) ─┼──► output channels
//!                   │        │           TimedForwarder(group b) ─┤
//!                   │        ▼                    ▲               │
//!                   │  GroupController ──► BarrierEmitter threads │
//!                   └─────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use crate::channel::ElementSender;

pub mod consumer;
pub mod controller;
pub mod emitter;
pub mod forward;
pub mod node;

pub use consumer::{GroupedConsumer, GroupedReceiver};
pub use controller::GroupController;
pub use emitter::{BarrierEmitter, BarrierTrigger, IdleEmitter, PeriodicEmitter, StopHandle};
pub use forward::{forward, ForwardReceiver, TimedForwarder};
pub use node::BarrierNode;

/// Output channels of a node, shared by the data path and every emitter of the node
pub type Outputs = Arc<Vec<ElementSender>>;

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use crate::api::element::Element;
    use crate::api::group::{GroupInfo, Tags};
    use crate::channel::{named_channel_with_base, ChannelBaseOn, ElementReceiver};
    use crate::runtime::Outputs;

    pub fn outputs(name: &str) -> (Outputs, ElementReceiver) {
        let (sender, receiver) =
            named_channel_with_base(name, vec![], 0, ChannelBaseOn::Unbounded);
        (Arc::new(vec![sender]), receiver)
    }

    pub fn group(host: &str) -> GroupInfo {
        let mut tags = Tags::new();
        tags.insert("host".to_string(), host.to_string());
        GroupInfo::new(tags)
    }

    /// Everything currently in the channel
    pub fn drain(receiver: &ElementReceiver) -> Vec<Element> {
        let mut elements = Vec::new();
        while let Ok(element) = receiver.try_recv() {
            elements.push(element);
        }
        elements
    }

    /// Everything arriving until `deadline`
    pub fn collect_until(receiver: &ElementReceiver, deadline: Instant) -> Vec<Element> {
        let mut elements = Vec::new();
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            if let Ok(element) = receiver.recv_timeout(deadline - now) {
                elements.push(element);
            }
        }
        elements
    }

    pub fn barriers(elements: &[Element]) -> Vec<u64> {
        elements
            .iter()
            .filter_map(|element| element.as_barrier().map(|barrier| barrier.timestamp))
            .collect()
    }

    /// Wait for the next barrier, skipping other elements
    pub fn next_barrier(receiver: &ElementReceiver, timeout: Duration) -> Option<u64> {
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            match receiver.recv_timeout(deadline - now) {
                Ok(Element::Barrier(barrier)) => return Some(barrier.timestamp),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }
}
