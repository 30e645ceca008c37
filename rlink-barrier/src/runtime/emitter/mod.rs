use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::api::element::Element;
use crate::api::error::{BarrierError, Result};
use crate::api::group::GroupInfo;
use crate::api::properties::{BarrierProperties, Properties};
use crate::channel::{bounded, Receiver, Sender};
use crate::metrics::{register_counter, Counter, Tag};
use crate::runtime::forward::{forward, ForwardReceiver};
use crate::runtime::Outputs;
use crate::utils::date_time::current_timestamp_millis;
use crate::utils::thread;

pub mod idle_emitter;
pub mod periodic_emitter;

pub use idle_emitter::IdleEmitter;
pub use periodic_emitter::PeriodicEmitter;

/// How the barriers of a node are triggered
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BarrierTrigger {
    /// emit after the group has been silent for the duration
    Idle(Duration),
    /// emit on a fixed cadence
    Periodic(Duration),
}

impl BarrierTrigger {
    /// `idle` takes precedence when both are set.
    pub fn new(idle: Duration, period: Duration) -> Result<Self> {
        if !idle.is_zero() {
            if !period.is_zero() {
                warn!(
                    "both idle({}ms) and period({}ms) are set, the period is ignored",
                    idle.as_millis(),
                    period.as_millis()
                );
            }
            Ok(BarrierTrigger::Idle(idle))
        } else if !period.is_zero() {
            Ok(BarrierTrigger::Periodic(period))
        } else {
            Err(BarrierError::NoTrigger)
        }
    }

    pub fn from_properties(properties: &Properties) -> Result<Self> {
        let idle = properties.get_barrier_idle()?;
        let period = properties.get_barrier_period()?;
        BarrierTrigger::new(idle, period)
    }
}

/// Shared by every emitter of a node
#[derive(Clone, Debug, Default)]
pub struct EmitterStatistics {
    pub emitted: Counter,
    pub failures: Counter,
}

impl EmitterStatistics {
    pub fn register(node_name: &str) -> Self {
        let tags = vec![Tag::new("node", node_name)];
        EmitterStatistics {
            emitted: register_counter("Barrier.Emitted", tags.clone()),
            failures: register_counter("Barrier.EmitFailure", tags),
        }
    }
}

/// Per group barrier source. The message path runs on the caller's thread, barriers are
/// emitted from a background thread owned by the emitter.
pub trait BarrierEmitter: ForwardReceiver {
    fn name(&self) -> &str;

    fn group(&self) -> &GroupInfo;

    /// Timestamp of the most recent barrier, 0 before the first one
    fn last_barrier(&self) -> u64;

    fn stop_handle(&self) -> Arc<StopHandle>;

    fn stop(&self) {
        self.stop_handle().stop()
    }
}

/// State shared between the message path and the background thread of an emitter
pub(crate) struct EmitterContext {
    name: String,
    group: GroupInfo,
    last_barrier: AtomicU64,
    outs: Outputs,
    statistics: EmitterStatistics,
}

impl EmitterContext {
    pub(crate) fn new(
        name: &str,
        group: GroupInfo,
        outs: Outputs,
        statistics: EmitterStatistics,
    ) -> Self {
        EmitterContext {
            name: name.to_string(),
            group,
            last_barrier: AtomicU64::new(0),
            outs,
            statistics,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.name.as_str()
    }

    pub(crate) fn group(&self) -> &GroupInfo {
        &self.group
    }

    pub(crate) fn last_barrier(&self) -> u64 {
        self.last_barrier.load(Ordering::Acquire)
    }

    /// Strictly earlier than the last emitted barrier
    pub(crate) fn is_late(&self, timestamp: u64) -> bool {
        timestamp < self.last_barrier()
    }

    /// Pass `element` on unless it is late
    pub(crate) fn pass(&self, timestamp: u64, element: Element) -> Option<Element> {
        if self.is_late(timestamp) {
            debug!(
                "{} drop late element of group {}, timestamp {} < barrier {}",
                self.name,
                self.group.id,
                timestamp,
                self.last_barrier()
            );
            None
        } else {
            Some(element)
        }
    }

    /// Record the current wall clock as the last barrier and forward a barrier carrying it.
    /// Failures are logged, the emitter keeps running.
    pub(crate) fn emit_barrier(&self) {
        let now = current_timestamp_millis();
        // never move backwards if the wall clock does
        let previous = self.last_barrier.fetch_max(now, Ordering::AcqRel);
        let timestamp = previous.max(now);

        let barrier = Element::new_barrier(self.group.clone(), timestamp);
        match forward(&self.outs, barrier) {
            Ok(()) => {
                self.statistics.emitted.fetch_add(1);
                debug!("{} emit barrier {} for group {}", self.name, timestamp, self.group.id);
            }
            Err(e) => {
                self.statistics.failures.fetch_add(1);
                warn!("{} failed to emit barrier. {}", self.name, e);
            }
        }
    }
}

struct Worker {
    stop_signal: Sender<()>,
    join_handle: JoinHandle<()>,
}

/// Stops the background thread of an emitter.
/// `stop` blocks until the thread has exited; calling it again is a no-op.
pub struct StopHandle {
    name: String,
    worker: Mutex<Option<Worker>>,
}

impl StopHandle {
    fn new(name: String, stop_signal: Sender<()>, join_handle: JoinHandle<()>) -> Self {
        StopHandle {
            name,
            worker: Mutex::new(Some(Worker {
                stop_signal,
                join_handle,
            })),
        }
    }

    pub fn stop(&self) {
        // the lock is held across the join so a concurrent caller also waits for the exit
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(Worker {
            stop_signal,
            join_handle,
        }) = worker.take()
        {
            drop(stop_signal);
            if join_handle.join().is_err() {
                error!("barrier emitter {} panicked", self.name);
            }
            info!("barrier emitter {} stopped", self.name);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle")
            .field("name", &self.name)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Spawn the background thread of an emitter. `run` gets the stop signal receiver,
/// which disconnects when the handle is stopped.
pub(crate) fn start<F>(context: &EmitterContext, run: F) -> Result<Arc<StopHandle>>
where
    F: FnOnce(Receiver<()>) + Send + 'static,
{
    let (stop_signal, stop_receiver) = bounded::<()>(1);
    let thread_name = format!("barrier-{}", context.group.id);
    let join_handle =
        thread::spawn(thread_name.as_str(), move || run(stop_receiver)).map_err(|e| {
            BarrierError::Spawn {
                group_id: context.group.id.clone(),
                source: e,
            }
        })?;

    let handle_name = format!("{}[{}]", context.name, context.group.id);
    Ok(Arc::new(StopHandle::new(
        handle_name,
        stop_signal,
        join_handle,
    )))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::api::error::BarrierError;
    use crate::api::properties::{BarrierProperties, Properties};
    use crate::runtime::emitter::{
        start, BarrierTrigger, EmitterContext, EmitterStatistics,
    };
    use crate::runtime::test_utils::{drain, group, outputs};

    #[test]
    pub fn barrier_trigger_test() {
        let ms = Duration::from_millis;
        assert_eq!(
            BarrierTrigger::new(ms(10), ms(0)).unwrap(),
            BarrierTrigger::Idle(ms(10))
        );
        assert_eq!(
            BarrierTrigger::new(ms(0), ms(20)).unwrap(),
            BarrierTrigger::Periodic(ms(20))
        );
        // idle wins
        assert_eq!(
            BarrierTrigger::new(ms(10), ms(20)).unwrap(),
            BarrierTrigger::Idle(ms(10))
        );
        assert!(matches!(
            BarrierTrigger::new(ms(0), ms(0)),
            Err(BarrierError::NoTrigger)
        ));

        let mut properties = Properties::new();
        properties.set_barrier_period(ms(30));
        assert_eq!(
            BarrierTrigger::from_properties(&properties).unwrap(),
            BarrierTrigger::Periodic(ms(30))
        );
        assert!(matches!(
            BarrierTrigger::from_properties(&Properties::new()),
            Err(BarrierError::NoTrigger)
        ));
    }

    #[test]
    pub fn emit_barrier_test() {
        let (outs, receiver) = outputs("emit_barrier_test");
        let statistics = EmitterStatistics::default();
        let context = EmitterContext::new("cpu", group("a"), outs, statistics.clone());

        assert_eq!(context.last_barrier(), 0);
        context.emit_barrier();
        let last = context.last_barrier();
        assert!(last > 0);

        let elements = drain(&receiver);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].as_barrier().map(|b| b.timestamp), Some(last));
        assert!(context.is_late(last - 1));
        assert!(!context.is_late(last));
        assert_eq!(statistics.emitted.load(), 1);

        // a closed output is logged and counted, nothing else
        drop(receiver);
        context.emit_barrier();
        assert_eq!(statistics.failures.load(), 1);
        assert!(context.last_barrier() >= last);
    }

    #[test]
    pub fn stop_handle_test() {
        let (outs, _receiver) = outputs("stop_handle_test");
        let context = EmitterContext::new("cpu", group("a"), outs, EmitterStatistics::default());

        let handle = start(&context, |stop| {
            // returns once the signal sender is dropped
            let _ = stop.recv();
        })
        .unwrap();

        assert!(!handle.is_stopped());
        handle.stop();
        assert!(handle.is_stopped());
        handle.stop();
        assert!(handle.is_stopped());
    }
}
