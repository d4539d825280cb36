pub mod loc;

// 重新导出常用类型，方便外部使用
pub use loc::{
    client::{ClientConfig, LocShareClient},
    friend::{EmptyFriendListener, FriendListSyncer, FriendListSyncerConfig, FriendListener},
    location::Location,
    types::ApiError,
};
