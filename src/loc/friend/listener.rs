//! 好友监听器回调接口

use async_trait::async_trait;

/// 好友监听器回调接口，由表示层注册
#[async_trait]
pub trait FriendListener: Send + Sync {
    /// 好友列表发生变更（刷新提交或本地移除），参数为 JSON 数组字符串
    async fn on_friend_list_changed(&self, friends_json: String);

    /// 某个好友的昵称解析完成，且该好友仍在当前列表中
    async fn on_friend_name_resolved(&self, friend_user_id: String, name: String);
}

/// 默认空实现（无操作）
pub struct EmptyFriendListener;

#[async_trait]
impl FriendListener for EmptyFriendListener {
    async fn on_friend_list_changed(&self, _friends_json: String) {
        // 默认不做任何处理
    }

    async fn on_friend_name_resolved(&self, _friend_user_id: String, _name: String) {
        // 默认不做任何处理
    }
}
