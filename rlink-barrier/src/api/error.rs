use thiserror::Error;

use crate::api::group::GroupId;
use crate::api::properties::PropertiesError;

pub type Result<T> = core::result::Result<T, BarrierError>;

#[derive(Error, Debug)]
pub enum BarrierError {
    #[error("barrier node must have either a non zero idle or a non zero period")]
    NoTrigger,
    #[error("invalid barrier properties: {0}")]
    Properties(#[from] PropertiesError),
    #[error("failed to forward element of group `{group_id}` to channel `{channel}`")]
    Forward { group_id: GroupId, channel: String },
    #[error("failed to spawn emitter thread for group `{group_id}`: {source}")]
    Spawn {
        group_id: GroupId,
        source: std::io::Error,
    },
}
