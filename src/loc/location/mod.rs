//! 位置模块
//!
//! 上报本机位置、查询好友位置、开关位置共享

pub mod api;
pub mod models;

pub use api::LocationApi;
pub use models::Location;
