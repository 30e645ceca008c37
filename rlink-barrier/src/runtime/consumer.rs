use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::element::Element;
use crate::api::error::Result;
use crate::api::group::{GroupId, GroupInfo, Tags};
use crate::channel::ElementReceiver;
use crate::metrics::{register_gauge, Gauge, Tag};
use crate::runtime::forward::{forward, ExecStatistics, ForwardReceiver, TimedForwarder};
use crate::runtime::Outputs;

/// Creates the handler of a group the first time the group is seen
/// and is told when the group goes away.
pub trait GroupedReceiver {
    fn new_group(&self, group: GroupInfo, first: &Element) -> Result<Box<dyn ForwardReceiver>>;

    fn delete_group(&self, _group_id: &GroupId) {}
}

impl<R> GroupedReceiver for Arc<R>
where
    R: GroupedReceiver + ?Sized,
{
    fn new_group(&self, group: GroupInfo, first: &Element) -> Result<Box<dyn ForwardReceiver>> {
        self.as_ref().new_group(group, first)
    }

    fn delete_group(&self, group_id: &GroupId) {
        self.as_ref().delete_group(group_id)
    }
}

/// Reads an input edge and routes every element to the handler of its group
pub struct GroupedConsumer<R: GroupedReceiver> {
    name: String,
    input: ElementReceiver,
    receiver: R,
    outs: Outputs,

    groups: HashMap<GroupId, TimedForwarder>,
    cardinality: Gauge,
    statistics: ExecStatistics,
}

impl<R: GroupedReceiver> GroupedConsumer<R> {
    pub fn new(name: &str, input: ElementReceiver, receiver: R, outs: Outputs) -> Self {
        let tags = vec![Tag::new("node", name)];
        GroupedConsumer {
            name: name.to_string(),
            input,
            receiver,
            outs,
            groups: HashMap::new(),
            cardinality: register_gauge("Barrier.Cardinality", tags),
            statistics: ExecStatistics::register(name),
        }
    }

    /// Number of groups currently tracked
    pub fn cardinality(&self) -> Gauge {
        self.cardinality.clone()
    }

    pub fn statistics(&self) -> ExecStatistics {
        self.statistics.clone()
    }

    /// Consume until the input disconnects or an element cannot be forwarded
    pub fn consume(&mut self) -> Result<()> {
        loop {
            match self.input.recv() {
                Ok(element) => self.on_element(element)?,
                Err(_e) => {
                    info!("{} input channel {} closed", self.name, self.input.name());
                    return Ok(());
                }
            }
        }
    }

    pub fn on_element(&mut self, element: Element) -> Result<()> {
        let group_id = element.group_id().clone();

        if let Element::DeleteGroup(_) = &element {
            return match self.groups.remove(&group_id) {
                Some(mut forwarder) => {
                    let result = forwarder.process(element);
                    self.receiver.delete_group(&group_id);
                    self.cardinality.store(self.groups.len() as i64);
                    debug!("{} delete group {}", self.name, group_id);
                    result
                }
                // nothing was created for it, pass it on
                None => forward(&self.outs, element),
            };
        }

        let forwarder = match self.groups.entry(group_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let group = group_info(&element, entry.key());
                let receiver = self.receiver.new_group(group, &element)?;
                debug!("{} new group {}", self.name, entry.key());
                entry.insert(TimedForwarder::new(
                    receiver,
                    self.outs.clone(),
                    self.statistics.clone(),
                ))
            }
        };
        let result = forwarder.process(element);
        self.cardinality.store(self.groups.len() as i64);
        result
    }
}

fn group_info(element: &Element, group_id: &GroupId) -> GroupInfo {
    match element {
        Element::Point(point) => point.group.clone(),
        Element::BeginBatch(begin) => begin.group.clone(),
        Element::Barrier(barrier) => barrier.group.clone(),
        _ => GroupInfo::with_id(group_id.clone(), Tags::new()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::api::element::{
        BatchPoint, Barrier, BeginBatch, DeleteGroup, Element, EndBatch, Point,
    };
    use crate::api::error::Result;
    use crate::api::group::{GroupId, GroupInfo};
    use crate::channel::{named_channel_with_base, ChannelBaseOn};
    use crate::runtime::consumer::{GroupedConsumer, GroupedReceiver};
    use crate::runtime::forward::ForwardReceiver;
    use crate::runtime::test_utils::{drain, group, outputs};

    struct Passthrough;

    impl ForwardReceiver for Passthrough {
        fn begin_batch(&mut self, begin: BeginBatch) -> Option<Element> {
            Some(Element::BeginBatch(begin))
        }
        fn batch_point(&mut self, point: BatchPoint) -> Option<Element> {
            Some(Element::BatchPoint(point))
        }
        fn end_batch(&mut self, end: EndBatch) -> Option<Element> {
            Some(Element::EndBatch(end))
        }
        fn barrier(&mut self, barrier: Barrier) -> Option<Element> {
            Some(Element::Barrier(barrier))
        }
        fn delete_group(&mut self, delete: DeleteGroup) -> Option<Element> {
            Some(Element::DeleteGroup(delete))
        }
        fn point(&mut self, point: Point) -> Option<Element> {
            Some(Element::Point(point))
        }
    }

    #[derive(Default)]
    struct Recorder {
        created: Mutex<Vec<GroupInfo>>,
        deleted: Mutex<Vec<GroupId>>,
    }

    impl GroupedReceiver for Recorder {
        fn new_group(&self, group: GroupInfo, _first: &Element) -> Result<Box<dyn ForwardReceiver>> {
            self.created.lock().unwrap().push(group);
            Ok(Box::new(Passthrough))
        }

        fn delete_group(&self, group_id: &GroupId) {
            self.deleted.lock().unwrap().push(group_id.clone());
        }
    }

    #[test]
    pub fn grouped_consumer_test() {
        let (input_sender, input_receiver) =
            named_channel_with_base("grouped_input_test", vec![], 0, ChannelBaseOn::Unbounded);
        let (outs, output) = outputs("grouped_output_test");
        let recorder = Arc::new(Recorder::default());

        let mut consumer = GroupedConsumer::new("grouped_test", input_receiver, recorder.clone(), outs);
        let cardinality = consumer.cardinality();

        let a = group("a");
        let b = group("b");
        let elements = vec![
            Element::new_point(Point::new("cpu", a.clone(), 1)),
            Element::new_point(Point::new("cpu", b.clone(), 1)),
            Element::new_point(Point::new("cpu", a.clone(), 2)),
            Element::BatchPoint(BatchPoint::new(b.id.clone(), 2)),
            Element::new_delete_group(a.id.clone()),
            // unknown group, forwarded untouched
            Element::new_delete_group(GroupId::new("host=c")),
        ];
        for element in elements.clone() {
            input_sender.send(element).unwrap();
        }
        drop(input_sender);

        consumer.consume().unwrap();

        assert_eq!(drain(&output), elements);
        assert_eq!(*recorder.created.lock().unwrap(), vec![a.clone(), b.clone()]);
        assert_eq!(*recorder.deleted.lock().unwrap(), vec![a.id.clone()]);
        assert_eq!(cardinality.load(), 1);
        assert_eq!(consumer.statistics().processed.load(), 5);
    }

    #[test]
    pub fn recreate_deleted_group_test() {
        let (_input_sender, input_receiver) =
            named_channel_with_base("recreate_input_test", vec![], 0, ChannelBaseOn::Unbounded);
        let (outs, _output) = outputs("recreate_output_test");
        let recorder = Arc::new(Recorder::default());
        let mut consumer = GroupedConsumer::new("recreate_test", input_receiver, recorder.clone(), outs);

        let a = group("a");
        consumer
            .on_element(Element::new_point(Point::new("cpu", a.clone(), 1)))
            .unwrap();
        consumer
            .on_element(Element::new_delete_group(a.id.clone()))
            .unwrap();
        assert_eq!(consumer.cardinality().load(), 0);

        // the first element of a group without tags only knows the id
        consumer
            .on_element(Element::EndBatch(EndBatch::new(a.id.clone())))
            .unwrap();
        assert_eq!(consumer.cardinality().load(), 1);

        let created = recorder.created.lock().unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[1].id, a.id);
        assert!(created[1].tags.is_empty());
    }
}
