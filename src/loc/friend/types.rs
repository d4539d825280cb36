//! 好友 API DTO（响应结构体）

use serde::{Deserialize, Deserializer};

/// 反序列化数组字段，处理 null 值
///
/// 字段缺失仍然是解码错误；只有显式的 null 被当作空数组。
pub(crate) fn deserialize_vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// `/getFriends` 响应：`{"friends": ["a@example.com", ...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct FriendsResp {
    #[serde(deserialize_with = "deserialize_vec_or_null")]
    pub friends: Vec<String>,
}

/// `/getName` 响应：`{"name": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct NameResp {
    pub name: String,
}
