//! 位置 HTTP API 客户端

use crate::loc::location::models::Location;
use crate::loc::types::{handle_json_response, handle_plain_response, ApiError};
use tracing::{debug, info};
use uuid::Uuid;

/// 位置相关的 HTTP API 客户端
#[derive(Clone)]
pub struct LocationApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl LocationApi {
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 上报某用户的最新位置
    pub async fn register_location(
        &self,
        user_name: &str,
        location: &Location,
    ) -> Result<(), ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/registerLocation", self.api_base_url);

        debug!(
            "[LocationAPI] 📡 上报位置，用户: {}, 操作ID: {}",
            user_name, operation_id
        );

        let response = self
            .client
            .post(&url)
            .query(&[("user_name", user_name)])
            .header("operationID", &operation_id)
            .json(location)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{}", e)))?;

        handle_plain_response(response, "上报位置").await?;

        debug!("[LocationAPI] ✅ 位置上报成功");
        Ok(())
    }

    /// 查询某个好友的位置
    ///
    /// 401 表示无权查看（不在对方好友列表中，或对方关闭了位置共享），
    /// 以 `Server` 错误原样上抛，由表示层决定提示文案。
    pub async fn lookup_friend(
        &self,
        user_name: &str,
        friend_name: &str,
    ) -> Result<Location, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/lookup", self.api_base_url);

        info!(
            "[LocationAPI] 📡 查询好友位置: {} -> {}, 操作ID: {}",
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

        let location: Location = handle_json_response(response, "位置查询").await?;

        info!("[LocationAPI] ✅ 好友位置响应: {:?}", location);
        Ok(location)
    }

    /// 开关当前用户的位置共享
    pub async fn toggle_sharing(&self, user_name: &str) -> Result<(), ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/toggle", self.api_base_url);

        info!(
            "[LocationAPI] 📡 切换位置共享，用户: {}, 操作ID: {}",
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

        handle_plain_response(response, "切换位置共享").await?;

        info!("[LocationAPI] ✅ 位置共享已切换");
        Ok(())
    }
}
