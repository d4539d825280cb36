//! 共享类型与通用 HTTP 响应处理
//!
//! 后端是一个普通的 HTTP+JSON 服务：成功时返回 200 和 JSON（或纯文本）body，
//! 失败时返回非 200 状态码和错误说明文本。这里集中做状态码检查和反序列化，
//! 所有 API 客户端共用。

use thiserror::Error;
use tracing::{debug, error};

/// API 错误分类
///
/// 三类线上错误（传输 / 服务器 / 解码）都是可恢复的，表示层可以直接重试；
/// 另外两类是客户端本地判定，不触网。
#[derive(Debug, Error)]
pub enum ApiError {
    /// 连接、超时等传输层失败
    #[error("请求失败: {0}")]
    Transport(String),

    /// 服务器返回非成功状态码
    #[error("HTTP 错误 {status}: {message}")]
    Server { status: u16, message: String },

    /// 响应 body 不是合法 JSON，或缺少约定字段
    #[error("解析响应失败: {0}")]
    Decode(String),

    /// 用户名为空，拒绝发起请求
    #[error("用户名不能为空")]
    EmptyUserName,

    /// 本次拉取已被更新的拉取取代，结果被丢弃
    #[error("请求已被更新的刷新取代")]
    Superseded,
}

/// 从状态码和 body 字节解码 JSON 响应
///
/// 非成功状态码优先于解码错误：先归类为 `Server`，再尝试反序列化。
pub(crate) fn decode_json_body<T: serde::de::DeserializeOwned>(
    status: u16,
    body: &[u8],
    operation_name: &str,
) -> Result<T, ApiError> {
    let body_str = String::from_utf8_lossy(body);

    if !(200..300).contains(&status) {
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Err(ApiError::Server {
            status,
            message: body_str.into_owned(),
        });
    }
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    serde_json::from_slice(body).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body_str
        );
        ApiError::Decode(format!("{:?}", e))
    })
}

/// 通用 JSON 响应处理：读取 body 并解码
pub(crate) async fn handle_json_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(format!("读取响应 body 失败: {}", e)))?;
    decode_json_body(status, &body_bytes, operation_name)
}

/// 通用纯文本响应处理：只检查状态码
///
/// 后端的写操作（addFriend / deleteFriend / registerLocation / toggle）成功时
/// 返回 "Added!" 这类纯文本，body 内容对客户端没有意义。
pub(crate) async fn handle_plain_response(
    response: reqwest::Response,
    operation_name: &str,
) -> Result<(), ApiError> {
    let status = response.status();
    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(format!("读取响应 body 失败: {}", e)))?;
    let body_str = String::from_utf8_lossy(&body_bytes);

    if !status.is_success() {
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Err(ApiError::Server {
            status: status.as_u16(),
            message: body_str.into_owned(),
        });
    }
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        value: i32,
    }

    #[test]
    fn decode_ok_body() {
        let p: Payload = decode_json_body(200, br#"{"value": 7}"#, "测试").unwrap();
        assert_eq!(p.value, 7);
    }

    #[test]
    fn non_success_status_is_server_error() {
        let res: Result<Payload, _> = decode_json_body(400, b"Must provide user name", "测试");
        match res {
            Err(ApiError::Server { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Must provide user name");
            }
            other => panic!("期望 Server 错误，实际: {:?}", other),
        }
    }

    #[test]
    fn invalid_json_is_decode_error() {
        let res: Result<Payload, _> = decode_json_body(200, b"not json", "测试");
        assert!(matches!(res, Err(ApiError::Decode(_))));
    }

    #[test]
    fn status_wins_over_body_shape() {
        // 非 200 时即使 body 恰好是 JSON，也归类为服务器错误
        let res: Result<Payload, _> = decode_json_body(500, br#"{"value": 1}"#, "测试");
        assert!(matches!(res, Err(ApiError::Server { status: 500, .. })));
    }
}
