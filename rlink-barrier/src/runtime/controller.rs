use std::sync::Arc;

use dashmap::DashMap;

use crate::api::element::Element;
use crate::api::error::Result;
use crate::api::group::{GroupId, GroupInfo};
use crate::runtime::consumer::GroupedReceiver;
use crate::runtime::emitter::{
    BarrierEmitter, BarrierTrigger, EmitterStatistics, IdleEmitter, PeriodicEmitter, StopHandle,
};
use crate::runtime::forward::ForwardReceiver;
use crate::runtime::Outputs;

/// Owns the lifecycle of the per group emitters of a node
pub struct GroupController {
    name: String,
    trigger: BarrierTrigger,
    outs: Outputs,
    statistics: EmitterStatistics,

    stop_handles: DashMap<GroupId, Arc<StopHandle>>,
}

impl GroupController {
    pub fn new(name: &str, trigger: BarrierTrigger, outs: Outputs) -> Self {
        GroupController {
            name: name.to_string(),
            trigger,
            outs,
            statistics: EmitterStatistics::register(name),
            stop_handles: DashMap::new(),
        }
    }

    pub fn trigger(&self) -> BarrierTrigger {
        self.trigger
    }

    pub fn statistics(&self) -> EmitterStatistics {
        self.statistics.clone()
    }

    /// Create the emitter of a new group and remember how to stop it
    pub fn new_group(&self, group: GroupInfo, first: &Element) -> Result<Box<dyn ForwardReceiver>> {
        let name = if first.name().is_empty() {
            self.name.as_str()
        } else {
            first.name()
        };

        match self.trigger {
            BarrierTrigger::Idle(idle) => {
                let emitter =
                    IdleEmitter::new(name, group, idle, self.outs.clone(), self.statistics.clone())?;
                Ok(self.register(emitter))
            }
            BarrierTrigger::Periodic(period) => {
                let emitter = PeriodicEmitter::new(
                    name,
                    group,
                    period,
                    self.outs.clone(),
                    self.statistics.clone(),
                )?;
                Ok(self.register(emitter))
            }
        }
    }

    fn register<E>(&self, emitter: E) -> Box<dyn ForwardReceiver>
    where
        E: BarrierEmitter + 'static,
    {
        let group_id = emitter.group().id.clone();
        if let Some(previous) = self.stop_handles.insert(group_id, emitter.stop_handle()) {
            // only one live emitter per group
            previous.stop();
        }
        Box::new(emitter)
    }

    /// Stop and forget the emitter of `group_id`, no-op when there is none
    pub fn delete_group(&self, group_id: &GroupId) {
        if let Some((_, stop_handle)) = self.stop_handles.remove(group_id) {
            stop_handle.stop();
        }
    }

    /// Stop every remaining emitter. Safe to call more than once.
    pub fn shutdown(&self) {
        let group_ids: Vec<GroupId> = self
            .stop_handles
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let len = group_ids.len();
        for group_id in group_ids {
            self.delete_group(&group_id);
        }
        info!("{} shutdown, {} emitters stopped", self.name, len);
    }

    pub fn active_groups(&self) -> usize {
        self.stop_handles.len()
    }
}

impl GroupedReceiver for GroupController {
    fn new_group(&self, group: GroupInfo, first: &Element) -> Result<Box<dyn ForwardReceiver>> {
        GroupController::new_group(self, group, first)
    }

    fn delete_group(&self, group_id: &GroupId) {
        GroupController::delete_group(self, group_id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::api::element::{Element, Point};
    use crate::runtime::controller::GroupController;
    use crate::runtime::emitter::BarrierTrigger;
    use crate::runtime::test_utils::{barriers, collect_until, drain, group, outputs};

    fn point(host: &str) -> Element {
        Element::new_point(Point::new("cpu", group(host), 0))
    }

    #[test]
    pub fn controller_shutdown_test() {
        let (outs, receiver) = outputs("controller_shutdown_test");
        let trigger = BarrierTrigger::Periodic(Duration::from_millis(20));
        let controller = GroupController::new("shutdown_test", trigger, outs);

        let _a = controller.new_group(group("a"), &point("a")).unwrap();
        let _b = controller.new_group(group("b"), &point("b")).unwrap();
        assert_eq!(controller.active_groups(), 2);

        let elements = collect_until(&receiver, Instant::now() + Duration::from_millis(100));
        assert!(!barriers(&elements).is_empty());

        controller.shutdown();
        assert_eq!(controller.active_groups(), 0);
        drain(&receiver);
        let elements = collect_until(&receiver, Instant::now() + Duration::from_millis(100));
        assert!(barriers(&elements).is_empty());

        controller.shutdown();
    }

    #[test]
    pub fn controller_delete_group_test() {
        let (outs, receiver) = outputs("controller_delete_test");
        let trigger = BarrierTrigger::Idle(Duration::from_millis(20));
        let controller = GroupController::new("delete_test", trigger, outs);

        let _a = controller.new_group(group("a"), &point("a")).unwrap();
        let _b = controller.new_group(group("b"), &point("b")).unwrap();

        controller.delete_group(&group("a").id);
        // unknown or already deleted
        controller.delete_group(&group("a").id);
        controller.delete_group(&group("c").id);
        assert_eq!(controller.active_groups(), 1);

        drain(&receiver);
        let elements = collect_until(&receiver, Instant::now() + Duration::from_millis(150));
        assert!(!elements.is_empty());
        for element in &elements {
            assert_eq!(element.group_id(), &group("b").id);
        }

        controller.shutdown();
        assert_eq!(controller.active_groups(), 0);
    }

    #[test]
    pub fn controller_recreate_group_test() {
        let (outs, _receiver) = outputs("controller_recreate_test");
        let trigger = BarrierTrigger::Idle(Duration::from_millis(50));
        let controller = GroupController::new("recreate_test", trigger, outs);

        let _first = controller.new_group(group("a"), &point("a")).unwrap();
        let _second = controller.new_group(group("a"), &point("a")).unwrap();
        assert_eq!(controller.active_groups(), 1);

        controller.shutdown();
    }
}
