pub mod data_types;
pub mod summary;

pub use data_types::DataTypes;
pub use summary::{LastMessage, Membership, RoomSummary, SentStatus, SpaceChildInfo};
