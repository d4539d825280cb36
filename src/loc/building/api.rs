//! 楼宇 HTTP API 客户端

use crate::loc::building::models::BuildingMetadata;
use crate::loc::types::{decode_json_body, ApiError};
use tracing::{debug, info};
use uuid::Uuid;

/// 楼宇相关的 HTTP API 客户端
#[derive(Clone)]
pub struct BuildingApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl BuildingApi {
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 查询楼宇元数据，未收录的楼宇返回 `None`
    pub async fn get_building_metadata(
        &self,
        building_name: &str,
    ) -> Result<Option<BuildingMetadata>, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/getBuildingMetadata", self.api_base_url);

        debug!(
            "[BuildingAPI] 📡 请求楼宇元数据: {}, 操作ID: {}",
            building_name, operation_id
        );

        let response = self
            .client
            .get(&url)
            .query(&[("building_name", building_name)])
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("[BuildingAPI] 楼宇 {} 未收录", building_name);
            return Ok(None);
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("读取响应 body 失败: {}", e)))?;
        let metadata: BuildingMetadata =
            decode_json_body(status.as_u16(), &body_bytes, "楼宇元数据")?;

        info!(
            "[BuildingAPI] ✅ 楼宇元数据响应: {}, 楼层数: {}",
            metadata.building_name, metadata.floors
        );
        Ok(Some(metadata))
    }

    /// 获取某楼层的平面图（原始图片字节），无此楼层返回 `None`
    pub async fn get_floor_image(
        &self,
        building_name: &str,
        floor: i32,
    ) -> Result<Option<Vec<u8>>, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/getFloorImage", self.api_base_url);

        debug!(
            "[BuildingAPI] 📡 请求楼层平面图: {} 第 {} 层, 操作ID: {}",
            building_name, floor, operation_id
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("building_name", building_name.to_string()),
                ("floor", floor.to_string()),
            ])
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(
                "[BuildingAPI] 楼层平面图不存在: {} 第 {} 层",
                building_name, floor
            );
            return Ok(None);
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("读取响应 body 失败: {}", e)))?;

        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body_bytes).into_owned(),
            });
        }

        info!(
            "[BuildingAPI] ✅ 楼层平面图响应: {} 第 {} 层, {} 字节",
            building_name,
            floor,
            body_bytes.len()
        );
        Ok(Some(body_bytes.to_vec()))
    }
}
