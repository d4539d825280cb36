//! 位置数据模型

use serde::{Deserialize, Serialize};

/// 位置数据
///
/// 室外是 GPS 定位，室内是楼宇定位（楼名 + 楼层 + 平面坐标）。JSON 编码不带
/// 标签，按字段形态区分，与服务端存储的原始 JSON 对象一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    /// 室内定位
    Indoor {
        building: String,
        floor: i32,
        x: f64,
        y: f64,
    },
    /// 室外 GPS 定位
    Gps { latitude: f64, longitude: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gps_body_decodes_to_gps_variant() {
        let loc: Location =
            serde_json::from_str(r#"{"latitude": 43.0731, "longitude": -89.4012}"#).unwrap();
        assert_eq!(
            loc,
            Location::Gps {
                latitude: 43.0731,
                longitude: -89.4012
            }
        );
    }

    #[test]
    fn indoor_body_decodes_to_indoor_variant() {
        let loc: Location = serde_json::from_str(
            r#"{"building": "Computer Sciences", "floor": 2, "x": 13.5, "y": 40.25}"#,
        )
        .unwrap();
        assert_eq!(
            loc,
            Location::Indoor {
                building: "Computer Sciences".to_string(),
                floor: 2,
                x: 13.5,
                y: 40.25
            }
        );
    }
}
