use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::select;

use crate::api::element::{BatchPoint, Barrier, BeginBatch, DeleteGroup, Element, EndBatch, Point};
use crate::api::error::Result;
use crate::api::group::GroupInfo;
use crate::channel::{bounded, Receiver, Sender};
use crate::runtime::emitter::{start, BarrierEmitter, EmitterContext, EmitterStatistics, StopHandle};
use crate::runtime::forward::ForwardReceiver;
use crate::runtime::Outputs;

/// Emits a barrier once the group has received no in-time data for `idle`,
/// then again every `idle` for as long as the silence lasts.
pub struct IdleEmitter {
    context: Arc<EmitterContext>,
    idle: Duration,
    reset_signal: Sender<()>,
    stop_handle: Arc<StopHandle>,
}

impl IdleEmitter {
    pub fn new(
        name: &str,
        group: GroupInfo,
        idle: Duration,
        outs: Outputs,
        statistics: EmitterStatistics,
    ) -> Result<Self> {
        let context = Arc::new(EmitterContext::new(name, group, outs, statistics));
        // a pending reset is enough, further ones collapse into it
        let (reset_signal, reset_receiver) = bounded::<()>(1);

        let timer_context = context.clone();
        let stop_handle = start(&context, move |stop_receiver| {
            run_idle_timer(timer_context, idle, reset_receiver, stop_receiver)
        })?;

        info!(
            "Create IdleEmitter {} for group {}, idle={}ms",
            name,
            context.group().id,
            idle.as_millis()
        );

        Ok(IdleEmitter {
            context,
            idle,
            reset_signal,
            stop_handle,
        })
    }

    pub fn idle(&self) -> Duration {
        self.idle
    }

    fn reset_timer(&self) {
        // Full: a reset is already pending. Disconnected: the timer thread is gone.
        let _ = self.reset_signal.try_send(());
    }

    fn on_timestamped(&self, timestamp: u64, element: Element) -> Option<Element> {
        let output = self.context.pass(timestamp, element);
        if output.is_some() {
            self.reset_timer();
        }
        output
    }
}

fn run_idle_timer(
    context: Arc<EmitterContext>,
    idle: Duration,
    reset: Receiver<()>,
    stop: Receiver<()>,
) {
    loop {
        let running = select! {
            recv(stop) -> _ => false,
            recv(reset) -> signal => signal.is_ok(),
            default(idle) => {
                context.emit_barrier();
                true
            }
        };

        if !running {
            break;
        }
    }
    debug!("idle timer of {} exit", context.name());
}

impl ForwardReceiver for IdleEmitter {
    fn begin_batch(&mut self, begin: BeginBatch) -> Option<Element> {
        Some(Element::BeginBatch(begin))
    }

    fn batch_point(&mut self, point: BatchPoint) -> Option<Element> {
        self.on_timestamped(point.timestamp, Element::BatchPoint(point))
    }

    fn end_batch(&mut self, end: EndBatch) -> Option<Element> {
        Some(Element::EndBatch(end))
    }

    fn barrier(&mut self, barrier: Barrier) -> Option<Element> {
        self.on_timestamped(barrier.timestamp, Element::Barrier(barrier))
    }

    fn delete_group(&mut self, delete: DeleteGroup) -> Option<Element> {
        if delete.group_id == self.context.group().id {
            self.stop_handle.stop();
        }
        Some(Element::DeleteGroup(delete))
    }

    fn point(&mut self, point: Point) -> Option<Element> {
        self.on_timestamped(point.timestamp, Element::Point(point))
    }
}

impl BarrierEmitter for IdleEmitter {
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
