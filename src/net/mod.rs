//! Online play: wire protocol and the snapshot-resync synchronizer.

pub mod protocol;
pub mod sync;

pub use protocol::{
    DescriptorError, InputMap, MatchDescriptor, MatchMode, NetMessage, OnlineMatchSnapshot,
    ProtocolError,
};
pub use sync::{OnlineSynchronizer, PeerRole, SyncError, SyncNotice};
