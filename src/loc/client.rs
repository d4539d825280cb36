//! 位置共享客户端核心实现模块
//!
//! 组合好友同步器和各 API 客户端，向宿主应用（UI 壳层）提供统一入口。

use crate::loc::building::api::BuildingApi;
use crate::loc::building::models::BuildingMetadata;
use crate::loc::friend::api::{FriendApi, FriendQuery};
use crate::loc::friend::listener::{EmptyFriendListener, FriendListener};
use crate::loc::friend::models::FriendListSyncerConfig;
use crate::loc::friend::service::FriendListSyncer;
use crate::loc::location::api::LocationApi;
use crate::loc::location::models::Location;
use crate::loc::types::ApiError;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 当前用户标识（邮箱）
    pub user_id: String,
    /// HTTP API 基础地址
    pub api_base_url: String,
    /// 单个请求的超时时间
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            api_base_url: "http://localhost:3001".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// 位置共享客户端
///
/// 好友列表状态由内部的同步器独占持有；宿主通过本类型的透传方法读写，
/// 不存在跨界面共享的全局可变状态。
#[derive(Clone)]
pub struct LocShareClient {
    pub(crate) config: ClientConfig,
    friend_api: Arc<FriendApi>,
    friend_syncer: Arc<FriendListSyncer>,
    location_api: LocationApi,
    building_api: BuildingApi,
}

impl LocShareClient {
    /// 创建新的客户端（使用默认空监听器）
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_friend_listener(config, Arc::new(EmptyFriendListener))
    }

    /// 创建新的客户端（带好友监听器）
    pub fn with_friend_listener(
        config: ClientConfig,
        listener: Arc<dyn FriendListener>,
    ) -> Result<Self> {
        info!(
            "[Client] 创建位置共享客户端，用户: {}, API: {}",
            config.user_id, config.api_base_url
        );

        let http_client = reqwest::ClientBuilder::new()
            .timeout(config.request_timeout)
            .build()
            .context("创建 HTTP 客户端失败")?;

        let friend_api = Arc::new(FriendApi::new(
            http_client.clone(),
            config.api_base_url.clone(),
        ));
        let syncer_config = FriendListSyncerConfig {
            user_id: config.user_id.clone(),
            api_base_url: config.api_base_url.clone(),
        };
        let friend_syncer = Arc::new(FriendListSyncer::with_query(
            syncer_config,
            friend_api.clone() as Arc<dyn FriendQuery>,
            listener,
        ));
        let location_api = LocationApi::new(http_client.clone(), config.api_base_url.clone());
        let building_api = BuildingApi::new(http_client, config.api_base_url.clone());

        Ok(Self {
            config,
            friend_api,
            friend_syncer,
            location_api,
            building_api,
        })
    }

    // ========== 好友 ==========

    /// 刷新好友列表（取代仍在途的上一次刷新）
    pub async fn refresh_friends(&self) -> Result<Vec<String>, ApiError> {
        self.friend_syncer.refresh().await
    }

    /// 返回最近一次提交的好友列表快照
    pub fn get_friends(&self) -> Vec<String> {
        self.friend_syncer.current_list()
    }

    /// 只在本地移除好友条目，不调用服务端
    pub async fn remove_friend_local(&self, friend_name: &str) {
        self.friend_syncer.remove(friend_name).await;
    }

    /// 服务端删除好友，成功后同步移除本地条目
    pub async fn delete_friend(&self, friend_name: &str) -> Result<(), ApiError> {
        self.friend_api
            .delete_friend(&self.config.user_id, friend_name)
            .await?;
        self.friend_syncer.remove(friend_name).await;
        Ok(())
    }

    /// 服务端添加好友
    ///
    /// 成功后列表不会自动刷新，由宿主决定何时调用 `refresh_friends`。
    pub async fn add_friend(&self, friend_name: &str) -> Result<(), ApiError> {
        self.friend_api
            .add_friend(&self.config.user_id, friend_name)
            .await
    }

    /// 解析某个好友的显示昵称（逐行、互相独立）
    pub async fn resolve_friend_name(
        &self,
        friend_name: &str,
    ) -> Result<Option<String>, ApiError> {
        self.friend_syncer.resolve_name(friend_name).await
    }

    /// 返回已缓存的显示昵称
    pub fn friend_display_name(&self, friend_name: &str) -> Option<String> {
        self.friend_syncer.display_name(friend_name)
    }

    // ========== 位置 ==========

    /// 后台上报本机位置（即发即忘，失败只记日志）
    pub fn report_location(&self, location: Location) {
        let api = self.location_api.clone();
        let user = self.config.user_id.clone();
        tokio::spawn(async move {
            if let Err(e) = api.register_location(&user, &location).await {
                error!("[Client] 位置上报失败: {}", e);
            }
        });
    }

    /// 上报本机位置并等待结果
    pub async fn register_location(&self, location: &Location) -> Result<(), ApiError> {
        self.location_api
            .register_location(&self.config.user_id, location)
            .await
    }

    /// 查询某个好友的位置
    pub async fn lookup_friend(&self, friend_name: &str) -> Result<Location, ApiError> {
        self.location_api
            .lookup_friend(&self.config.user_id, friend_name)
            .await
    }

    /// 开关当前用户的位置共享
    pub async fn toggle_sharing(&self) -> Result<(), ApiError> {
        self.location_api.toggle_sharing(&self.config.user_id).await
    }

    // ========== 楼宇 ==========

    /// 查询楼宇元数据
    pub async fn get_building_metadata(
        &self,
        building_name: &str,
    ) -> Result<Option<BuildingMetadata>, ApiError> {
        self.building_api.get_building_metadata(building_name).await
    }

    /// 获取楼层平面图
    pub async fn get_floor_image(
        &self,
        building_name: &str,
        floor: i32,
    ) -> Result<Option<Vec<u8>>, ApiError> {
        self.building_api
            .get_floor_image(building_name, floor)
            .await
    }
}
