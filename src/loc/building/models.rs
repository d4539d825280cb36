//! 楼宇数据模型

use serde::{Deserialize, Serialize};

/// 楼宇元数据
///
/// `floors` 是楼层总数，楼层平面图按 1..=floors 编号请求。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingMetadata {
    pub building_name: String,
    pub floors: i32,
    /// 楼宇地理锚点，用于把室内坐标对齐到地图
    pub latitude: f64,
    pub longitude: f64,
}
