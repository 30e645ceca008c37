use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{select, tick};

use crate::api::element::{BatchPoint, Barrier, BeginBatch, DeleteGroup, Element, EndBatch, Point};
use crate::api::error::Result;
use crate::api::group::GroupInfo;
use crate::channel::Receiver;
use crate::runtime::emitter::{start, BarrierEmitter, EmitterContext, EmitterStatistics, StopHandle};
use crate::runtime::forward::ForwardReceiver;
use crate::runtime::Outputs;

/// Emits a barrier every `period` regardless of traffic
pub struct PeriodicEmitter {
    context: Arc<EmitterContext>,
    period: Duration,
    stop_handle: Arc<StopHandle>,
}

impl PeriodicEmitter {
    pub fn new(
        name: &str,
        group: GroupInfo,
        period: Duration,
        outs: Outputs,
        statistics: EmitterStatistics,
    ) -> Result<Self> {
        let context = Arc::new(EmitterContext::new(name, group, outs, statistics));

        let ticker_context = context.clone();
        let stop_handle = start(&context, move |stop_receiver| {
            run_ticker(ticker_context, period, stop_receiver)
        })?;

        info!(
            "Create PeriodicEmitter {} for group {}, period={}ms",
            name,
            context.group().id,
            period.as_millis()
        );

        Ok(PeriodicEmitter {
            context,
            period,
            stop_handle,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

fn run_ticker(context: Arc<EmitterContext>, period: Duration, stop: Receiver<()>) {
    let ticker = tick(period);
    loop {
        let running = select! {
            recv(stop) -> _ => false,
            recv(ticker) -> _ => {
                context.emit_barrier();
                true
            }
        };

        if !running {
            break;
        }
    }
    debug!("ticker of {} exit", context.name());
}

impl ForwardReceiver for PeriodicEmitter {
    fn begin_batch(&mut self, begin: BeginBatch) -> Option<Element> {
        Some(Element::BeginBatch(begin))
    }

    fn batch_point(&mut self, point: BatchPoint) -> Option<Element> {
        self.context
            .pass(point.timestamp, Element::BatchPoint(point))
    }

    fn end_batch(&mut self, end: EndBatch) -> Option<Element> {
        Some(Element::EndBatch(end))
    }

    fn barrier(&mut self, barrier: Barrier) -> Option<Element> {
        self.context
            .pass(barrier.timestamp, Element::Barrier(barrier))
    }

    fn delete_group(&mut self, delete: DeleteGroup) -> Option<Element> {
        if delete.group_id == self.context.group().id {
            self.stop_handle.stop();
        }
        Some(Element::DeleteGroup(delete))
    }

    fn point(&mut self, point: Point) -> Option<Element> {
        self.context.pass(point.timestamp, Element::Point(point))
    }
}

impl BarrierEmitter for PeriodicEmitter {
    fn name(&self) -> &str {
        self.context.name()
    }

    fn group(&self) -> &GroupInfo {
        self.context.group()
    }

    fn last_barrier(&self) -> u64 {
        self.context.last_barrier()
    }

    fn stop_handle(&self) -> Arc<StopHandle> {
        self.stop_handle.clone()
    }
}
