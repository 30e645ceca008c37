use std::collections::BTreeMap;

pub type Tags = BTreeMap<String, String>;

/// Identity of a stream partition, usually the rendered tag set the stream was grouped by.
#[derive(
    Clone, Serialize, Deserialize, Debug, Eq, PartialEq, Hash, Default, Ord, PartialOrd,
)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new<S: ToString>(id: S) -> Self {
        GroupId(id.to_string())
    }

    /// Build the id from the grouping dimensions, `key=value` pairs joined by `,`.
    /// An empty tag set is the "no group" id.
    pub fn from_tags(tags: &Tags) -> Self {
        let id = tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<String>>()
            .join(",");
        GroupId(id)
    }
}

impl std::ops::Deref for GroupId {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "nil")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Eq, PartialEq, Hash, Default)]
pub struct GroupInfo {
    pub id: GroupId,
    pub tags: Tags,
}

impl GroupInfo {
    pub fn new(tags: Tags) -> Self {
        GroupInfo {
            id: GroupId::from_tags(&tags),
            tags,
        }
    }

    pub fn with_id(id: GroupId, tags: Tags) -> Self {
        GroupInfo { id, tags }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::group::{GroupId, GroupInfo, Tags};

    #[test]
    pub fn group_id_from_tags_test() {
        let mut tags = Tags::new();
        tags.insert("host".to_string(), "server01".to_string());
        tags.insert("cpu".to_string(), "cpu0".to_string());

        let group = GroupInfo::new(tags);
        assert_eq!(group.id, GroupId::new("cpu=cpu0,host=server01"));
        assert_eq!(group.id.to_string(), "cpu=cpu0,host=server01");
    }

    #[test]
    pub fn empty_group_id_test() {
        let group = GroupInfo::new(Tags::new());
        assert!(group.id.is_empty());
        assert_eq!(group.id.to_string(), "nil");
    }
}
