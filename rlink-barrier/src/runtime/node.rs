use std::sync::Arc;

use crate::api::error::Result;
use crate::api::properties::Properties;
use crate::channel::{ElementReceiver, ElementSender};
use crate::metrics::Gauge;
use crate::runtime::consumer::GroupedConsumer;
use crate::runtime::controller::GroupController;
use crate::runtime::emitter::BarrierTrigger;
use crate::runtime::forward::ExecStatistics;

/// Injects per group barriers into a grouped stream.
///
/// Data elements are passed from `input` to every output in arrival order, minus those
/// timestamped before the last barrier of their group. The barriers are emitted from a
/// background thread per group, created when the group is first seen and stopped when the
/// group is deleted or the node finishes.
pub struct BarrierNode {
    name: String,
    trigger: BarrierTrigger,
    controller: Arc<GroupController>,
    consumer: GroupedConsumer<Arc<GroupController>>,
}

impl BarrierNode {
    /// Fails when neither a positive `barrier.idle.ms` nor a positive `barrier.period.ms` is set.
    pub fn new(
        name: &str,
        properties: &Properties,
        input: ElementReceiver,
        outs: Vec<ElementSender>,
    ) -> Result<Self> {
        let trigger = BarrierTrigger::from_properties(properties)?;
        let outs = Arc::new(outs);

        let controller = Arc::new(GroupController::new(name, trigger, outs.clone()));
        let consumer = GroupedConsumer::new(name, input, controller.clone(), outs);

        info!("Create BarrierNode {} with {:?}", name, trigger);
        Ok(BarrierNode {
            name: name.to_string(),
            trigger,
            controller,
            consumer,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn trigger(&self) -> BarrierTrigger {
        self.trigger
    }

    /// Number of groups currently tracked, shared with the metrics registry
    pub fn cardinality(&self) -> Gauge {
        self.consumer.cardinality()
    }

    pub fn statistics(&self) -> ExecStatistics {
        self.consumer.statistics()
    }

    pub fn controller(&self) -> Arc<GroupController> {
        self.controller.clone()
    }

    /// Consume the input until it is closed. Every emitter is stopped before returning,
    /// also when forwarding failed.
    pub fn run(mut self) -> Result<()> {
        info!("BarrierNode {} running", self.name);

        let result = self.consumer.consume();
        self.controller.shutdown();

        match &result {
            Ok(()) => info!("BarrierNode {} finished", self.name),
            Err(e) => error!("BarrierNode {} terminated. {}", self.name, e),
        }
        result
    }
}
