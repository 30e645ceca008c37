use std::collections::BTreeMap;

use crate::api::group::{GroupId, GroupInfo, Tags};
use crate::utils::date_time::timestamp_str;

pub type Fields = BTreeMap<String, serde_json::Value>;

/// A single data point of a stream
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Point {
    pub name: String,
    pub group: GroupInfo,
    pub fields: Fields,
    /// event time, unix epoch millis
    pub timestamp: u64,
}

impl Point {
    pub fn new<S: ToString>(name: S, group: GroupInfo, timestamp: u64) -> Self {
        Point {
            name: name.to_string(),
            group,
            fields: Fields::new(),
            timestamp,
        }
    }

    pub fn with_field<K: ToString, V: Into<serde_json::Value>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct BeginBatch {
    pub name: String,
    pub group: GroupInfo,
    pub size_hint: usize,
    pub timestamp: u64,
}

impl BeginBatch {
    pub fn new<S: ToString>(name: S, group: GroupInfo, size_hint: usize, timestamp: u64) -> Self {
        BeginBatch {
            name: name.to_string(),
            group,
            size_hint,
            timestamp,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct BatchPoint {
    pub group_id: GroupId,
    pub tags: Tags,
    pub fields: Fields,
    pub timestamp: u64,
}

impl BatchPoint {
    pub fn new(group_id: GroupId, timestamp: u64) -> Self {
        BatchPoint {
            group_id,
            tags: Tags::new(),
            fields: Fields::new(),
            timestamp,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct EndBatch {
    pub group_id: GroupId,
}

impl EndBatch {
    pub fn new(group_id: GroupId) -> Self {
        EndBatch { group_id }
    }
}

/// Asserts that no more data at or before `timestamp` will arrive for `group`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct Barrier {
    pub group: GroupInfo,
    /// wall clock time when the barrier was created, unix epoch millis
    pub timestamp: u64,
}

impl Barrier {
    pub fn new(group: GroupInfo, timestamp: u64) -> Self {
        Barrier { group, timestamp }
    }
}

impl std::fmt::Display for Barrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Barrier(group={}, timestamp={})",
            self.group.id,
            timestamp_str(self.timestamp)
        )
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct DeleteGroup {
    pub group_id: GroupId,
}

impl DeleteGroup {
    pub fn new(group_id: GroupId) -> Self {
        DeleteGroup { group_id }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Element {
    Point(Point),
    BeginBatch(BeginBatch),
    BatchPoint(BatchPoint),
    EndBatch(EndBatch),
    Barrier(Barrier),
    DeleteGroup(DeleteGroup),
}

impl Element {
    pub fn new_point(point: Point) -> Self {
        Element::Point(point)
    }

    pub fn new_barrier(group: GroupInfo, timestamp: u64) -> Self {
        Element::Barrier(Barrier::new(group, timestamp))
    }

    pub fn new_delete_group(group_id: GroupId) -> Self {
        Element::DeleteGroup(DeleteGroup::new(group_id))
    }

    /// The group this element is routed by
    pub fn group_id(&self) -> &GroupId {
        match self {
            Element::Point(point) => &point.group.id,
            Element::BeginBatch(begin) => &begin.group.id,
            Element::BatchPoint(point) => &point.group_id,
            Element::EndBatch(end) => &end.group_id,
            Element::Barrier(barrier) => &barrier.group.id,
            Element::DeleteGroup(delete) => &delete.group_id,
        }
    }

    /// Measurement name, empty for the kinds that carry none
    pub fn name(&self) -> &str {
        match self {
            Element::Point(point) => point.name.as_str(),
            Element::BeginBatch(begin) => begin.name.as_str(),
            _ => "",
        }
    }

    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Element::Point(point) => Some(point.timestamp),
            Element::BeginBatch(begin) => Some(begin.timestamp),
            Element::BatchPoint(point) => Some(point.timestamp),
            Element::Barrier(barrier) => Some(barrier.timestamp),
            Element::EndBatch(_) | Element::DeleteGroup(_) => None,
        }
    }

    pub fn is_barrier(&self) -> bool {
        matches!(self, Element::Barrier(_))
    }

    pub fn as_barrier(&self) -> Option<&Barrier> {
        match self {
            Element::Barrier(barrier) => Some(barrier),
            _ => None,
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Element::Point(_))
    }
}

#[cfg(test)]
mod tests {
    use crate::api::element::{BatchPoint, BeginBatch, Element, EndBatch, Point};
    use crate::api::group::{GroupId, GroupInfo, Tags};

    fn group(host: &str) -> GroupInfo {
        let mut tags = Tags::new();
        tags.insert("host".to_string(), host.to_string());
        GroupInfo::new(tags)
    }

    #[test]
    pub fn element_group_id_test() {
        let g = group("a");
        let elements = vec![
            Element::new_point(Point::new("cpu", g.clone(), 1).with_field("usage", 0.5)),
            Element::BeginBatch(BeginBatch::new("cpu", g.clone(), 2, 1)),
            Element::BatchPoint(BatchPoint::new(g.id.clone(), 1)),
            Element::EndBatch(EndBatch::new(g.id.clone())),
            Element::new_barrier(g.clone(), 1),
            Element::new_delete_group(g.id.clone()),
        ];

        for element in &elements {
            assert_eq!(element.group_id(), &GroupId::new("host=a"));
        }
    }

    #[test]
    pub fn element_timestamp_test() {
        let g = group("a");
        assert_eq!(
            Element::new_point(Point::new("cpu", g.clone(), 10)).timestamp(),
            Some(10)
        );
        assert_eq!(Element::EndBatch(EndBatch::new(g.id.clone())).timestamp(), None);
        assert_eq!(Element::new_delete_group(g.id.clone()).timestamp(), None);

        let barrier = Element::new_barrier(g, 20);
        assert!(barrier.is_barrier());
        assert_eq!(barrier.as_barrier().map(|b| b.timestamp), Some(20));
        assert_eq!(barrier.name(), "");
    }
}
