//! 好友同步器配置

/// 好友列表同步器配置
#[derive(Clone, Debug)]
pub struct FriendListSyncerConfig {
    /// 当前用户标识（观测到的形态是邮箱地址）
    pub user_id: String,
    /// API 基础 URL
    pub api_base_url: String,
}
