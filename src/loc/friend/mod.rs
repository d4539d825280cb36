//! 好友（联系人）模块
//!
//! 维护当前用户的好友列表：从服务器拉取、取代在途请求、本地移除、逐行解析昵称

pub mod api;
pub mod listener;
pub mod models;
pub mod service;
pub mod types;

// 重新导出主要类型
pub use api::{FriendApi, FriendQuery};
pub use listener::{EmptyFriendListener, FriendListener};
pub use models::FriendListSyncerConfig;
pub use service::FriendListSyncer;
pub use types::{FriendsResp, NameResp};
