//! 好友 HTTP API 客户端
//!
//! 负责所有好友相关的 HTTP 请求

use crate::loc::friend::types::{FriendsResp, NameResp};
use crate::loc::types::{handle_json_response, handle_plain_response, ApiError};
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

/// 好友查询服务接口
///
/// 同步器只依赖这个契约；生产实现是 [`FriendApi`]，测试用进程内假实现替换。
#[async_trait]
pub trait FriendQuery: Send + Sync {
    /// 拉取某用户的完整好友列表（有序）
    async fn get_friends(&self, user_name: &str) -> Result<Vec<String>, ApiError>;

    /// 查询某用户的显示昵称（逐行调用，互相独立、不保证顺序）
    async fn get_name(&self, user_name: &str) -> Result<String, ApiError>;

    /// 向某用户的好友列表添加一个好友
    async fn add_friend(&self, user_name: &str, friend_name: &str) -> Result<(), ApiError>;

    /// 从某用户的好友列表删除一个好友（服务端）
    async fn delete_friend(&self, user_name: &str, friend_name: &str) -> Result<(), ApiError>;
}

/// 好友相关的 HTTP API 客户端
#[derive(Clone)]
pub struct FriendApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl FriendApi {
    /// 创建新的好友 API 客户端
    ///
    /// `client` 由外部构造并在各 API 客户端之间共享
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }
}

#[async_trait]
impl FriendQuery for FriendApi {
    async fn get_friends(&self, user_name: &str) -> Result<Vec<String>, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/getFriends", self.api_base_url);

        info!("[FriendAPI] 📡 请求好友列表");
        debug!(
            "[FriendAPI]   请求URL: {}, 用户: {}, 操作ID: {}",
            url, user_name, operation_id
        );

        let response = self
            .client
            .get(&url)
            .query(&[("user_name", user_name)])
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{}", e)))?;

        let resp: FriendsResp = handle_json_response(response, "好友列表").await?;

        info!("[FriendAPI] ✅ 好友列表响应，好友数: {}", resp.friends.len());
        Ok(resp.friends)
    }

    async fn get_name(&self, user_name: &str) -> Result<String, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/getName", self.api_base_url);

        debug!(
            "[FriendAPI] 📡 请求昵称，用户: {}, 操作ID: {}",
            user_name, operation_id
        );

        let response = self
            .client
            .get(&url)
            .query(&[("user_name", user_name)])
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{}", e)))?;

        let resp: NameResp = handle_json_response(response, "昵称查询").await?;

        debug!("[FriendAPI] 昵称响应: {} -> {}", user_name, resp.name);
        Ok(resp.name)
    }

    async fn add_friend(&self, user_name: &str, friend_name: &str) -> Result<(), ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/addFriend", self.api_base_url);

        info!(
            "[FriendAPI] 📡 添加好友: {} -> {}, 操作ID: {}",
            user_name, friend_name, operation_id
        );

        let response = self
            .client
            .get(&url)
            .query(&[("user_name", user_name), ("friend_name", friend_name)])
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{}", e)))?;

        handle_plain_response(response, "添加好友").await?;

        info!("[FriendAPI] ✅ 添加好友成功: {}", friend_name);
        Ok(())
    }

    async fn delete_friend(&self, user_name: &str, friend_name: &str) -> Result<(), ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/deleteFriend", self.api_base_url);

        info!(
            "[FriendAPI] 📡 删除好友: {} -> {}, 操作ID: {}",
            user_name, friend_name, operation_id
        );

        let response = self
            .client
            .get(&url)
            .query(&[("user_name", user_name), ("friend_name", friend_name)])
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{}", e)))?;

        handle_plain_response(response, "删除好友").await?;

        info!("[FriendAPI] ✅ 删除好友成功: {}", friend_name);
        Ok(())
    }
}
