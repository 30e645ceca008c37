use std::time::Instant;

use crate::api::element::{BatchPoint, Barrier, BeginBatch, DeleteGroup, Element, EndBatch, Point};
use crate::api::error::{BarrierError, Result};
use crate::channel::SendError;
use crate::metrics::{register_counter, Counter, Tag};
use crate::runtime::Outputs;

/// Per message handler of one group. Every method returns the element to pass downstream,
/// or `None` to drop it.
pub trait ForwardReceiver: Send {
    fn begin_batch(&mut self, begin: BeginBatch) -> Option<Element>;
    fn batch_point(&mut self, point: BatchPoint) -> Option<Element>;
    fn end_batch(&mut self, end: EndBatch) -> Option<Element>;
    fn barrier(&mut self, barrier: Barrier) -> Option<Element>;
    fn delete_group(&mut self, delete: DeleteGroup) -> Option<Element>;
    fn point(&mut self, point: Point) -> Option<Element>;
}

/// Dispatch `element` to the handler method of its kind
pub fn receive(receiver: &mut dyn ForwardReceiver, element: Element) -> Option<Element> {
    match element {
        Element::Point(point) => receiver.point(point),
        Element::BeginBatch(begin) => receiver.begin_batch(begin),
        Element::BatchPoint(point) => receiver.batch_point(point),
        Element::EndBatch(end) => receiver.end_batch(end),
        Element::Barrier(barrier) => receiver.barrier(barrier),
        Element::DeleteGroup(delete) => receiver.delete_group(delete),
    }
}

/// Send `element` to every output. All outputs are attempted, the first failure is returned.
pub fn forward(outs: &Outputs, element: Element) -> Result<()> {
    let mut result = Ok(());
    let len = outs.len();
    let mut element = Some(element);
    for (index, out) in outs.iter().enumerate() {
        let e = if index + 1 == len {
            element.take()
        } else {
            element.clone()
        };
        let e = match e {
            Some(e) => e,
            None => break,
        };

        if let Err(SendError(e)) = out.send(e) {
            if result.is_ok() {
                result = Err(BarrierError::Forward {
                    group_id: e.group_id().clone(),
                    channel: out.name().to_string(),
                });
            }
        }
    }

    result
}

#[derive(Clone, Debug, Default)]
pub struct ExecStatistics {
    /// total time spent in handlers, nanos
    pub exec_time: Counter,
    pub processed: Counter,
}

impl ExecStatistics {
    pub fn register(node_name: &str) -> Self {
        let tags = vec![Tag::new("node", node_name)];
        ExecStatistics {
            exec_time: register_counter("Barrier.ExecTimeNanos", tags.clone()),
            processed: register_counter("Barrier.Processed", tags),
        }
    }
}

/// Runs a group handler, times it and forwards whatever it passes on.
pub struct TimedForwarder {
    receiver: Box<dyn ForwardReceiver>,
    outs: Outputs,
    statistics: ExecStatistics,
}

impl TimedForwarder {
    pub fn new(
        receiver: Box<dyn ForwardReceiver>,
        outs: Outputs,
        statistics: ExecStatistics,
    ) -> Self {
        TimedForwarder {
            receiver,
            outs,
            statistics,
        }
    }

    pub fn process(&mut self, element: Element) -> Result<()> {
        let begin = Instant::now();
        let output = receive(self.receiver.as_mut(), element);
        self.statistics
            .exec_time
            .fetch_add(begin.elapsed().as_nanos() as u64);
        self.statistics.processed.fetch_add(1);

        match output {
            Some(element) => forward(&self.outs, element),
            None => Ok(()),
        }
    }
}
