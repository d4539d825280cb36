pub mod building;
pub mod client;
pub mod friend;
pub mod location;
pub mod types;

// 重新导出客户端入口和错误类型
pub use client::{ClientConfig, LocShareClient};
pub use types::ApiError;
