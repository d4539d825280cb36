//! 好友列表同步服务层
//!
//! 维护当前用户的好友列表并调度刷新请求，保证同一时刻至多一个在途拉取。
//! 新的刷新会取消仍在途的上一次拉取（取代，不排队）；被取代的拉取即使最终
//! 完成，其结果也会在提交点被代次检查丢弃，不会覆盖更新的状态。

use crate::loc::friend::api::{FriendApi, FriendQuery};
use crate::loc::friend::listener::{EmptyFriendListener, FriendListener};
use crate::loc::friend::models::FriendListSyncerConfig;
use crate::loc::types::ApiError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 同步器的可变状态，整体由一把锁保护
///
/// 锁内不做任何 await，网络 I/O 全部在锁外进行。
#[derive(Default)]
struct SyncState {
    /// 最近一次提交的好友列表（有序，整体替换）
    friends: Vec<String>,
    /// 已解析的昵称缓存
    names: HashMap<String, String>,
    /// 拉取代次：只有代次仍然最新的拉取才允许提交
    generation: u64,
    /// 在途拉取的取消令牌
    inflight: Option<CancellationToken>,
}

/// 好友列表同步器
pub struct FriendListSyncer {
    config: FriendListSyncerConfig,
    /// 好友查询服务
    api: Arc<dyn FriendQuery>,
    /// 好友监听器
    listener: Arc<dyn FriendListener>,
    state: Mutex<SyncState>,
}

impl FriendListSyncer {
    /// 创建新的同步器（使用默认空监听器）
    pub fn new(config: FriendListSyncerConfig, client: reqwest::Client) -> Self {
        Self::with_listener(config, client, Arc::new(EmptyFriendListener))
    }

    /// 创建新的同步器（带自定义监听器）
    pub fn with_listener(
        config: FriendListSyncerConfig,
        client: reqwest::Client,
        listener: Arc<dyn FriendListener>,
    ) -> Self {
        let api = Arc::new(FriendApi::new(client, config.api_base_url.clone()));
        Self::with_query(config, api, listener)
    }

    /// 创建新的同步器（注入查询服务实现）
    pub fn with_query(
        config: FriendListSyncerConfig,
        api: Arc<dyn FriendQuery>,
        listener: Arc<dyn FriendListener>,
    ) -> Self {
        info!("[FriendSync] 创建好友列表同步器，用户: {}", config.user_id);
        Self {
            config,
            api,
            listener,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// 锁中毒时直接接管内部数据继续使用
    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 刷新好友列表
    ///
    /// 成功时整体替换当前列表并通过监听器发出"列表已更新"信号；失败时当前
    /// 列表保持最后一次已知的好状态不变。不做自动重试，重试策略由表示层
    /// 决定（下拉刷新、周期通知等）。
    pub async fn refresh(&self) -> Result<Vec<String>, ApiError> {
        if self.config.user_id.is_empty() {
            warn!("[FriendSync] 用户名为空，拒绝刷新");
            return Err(ApiError::EmptyUserName);
        }

        // 取代仍在途的上一次拉取，并登记本次拉取的代次与取消令牌
        let (token, my_generation) = {
            let mut st = self.state();
            if let Some(prev) = st.inflight.take() {
                info!("[FriendSync] 取消仍在途的上一次好友拉取");
                prev.cancel();
            }
            st.generation += 1;
            let token = CancellationToken::new();
            st.inflight = Some(token.clone());
            (token, st.generation)
        };

        info!(
            "[FriendSync] 🔄 开始刷新好友列表，用户: {}",
            self.config.user_id
        );

        let fetched = tokio::select! {
            _ = token.cancelled() => {
                debug!("[FriendSync] 本次拉取已被更新的刷新取代");
                return Err(ApiError::Superseded);
            }
            res = self.api.get_friends(&self.config.user_id) => res,
        };

        match fetched {
            Ok(friends) => {
                {
                    let mut st = self.state();
                    // 提交点：只有本次拉取仍是最新一代时才允许覆盖
                    if st.generation != my_generation {
                        debug!(
                            "[FriendSync] 丢弃过期拉取结果（代次 {} != {}）",
                            my_generation, st.generation
                        );
                        return Err(ApiError::Superseded);
                    }
                    st.friends = friends.clone();
                    st.inflight = None;
                    // 昵称缓存跟随整体替换收缩
                    let SyncState {
                        friends: committed,
                        names,
                        ..
                    } = &mut *st;
                    names.retain(|id, _| committed.contains(id));
                }

                info!(
                    "[FriendSync] ✅ 好友列表刷新完成，共 {} 个",
                    friends.len()
                );
                self.notify_list_changed().await;
                Ok(friends)
            }
            Err(e) => {
                error!("[FriendSync] 好友列表刷新失败: {}", e);
                let mut st = self.state();
                if st.generation == my_generation {
                    st.inflight = None;
                }
                Err(e)
            }
        }
    }

    /// 返回最近一次提交的好友列表快照
    ///
    /// 在途拉取提交之前，返回值不受其影响。
    pub fn current_list(&self) -> Vec<String> {
        self.state().friends.clone()
    }

    /// 本地移除一个好友条目
    ///
    /// 纯本地状态变更，不触发任何网络调用；服务端删除是独立操作
    /// （`FriendQuery::delete_friend`）。
    pub async fn remove(&self, friend_user_id: &str) {
        let removed = {
            let mut st = self.state();
            let before = st.friends.len();
            st.friends.retain(|f| f != friend_user_id);
            st.names.remove(friend_user_id);
            st.friends.len() != before
        };

        if removed {
            info!("[FriendSync] 本地移除好友: {}", friend_user_id);
            self.notify_list_changed().await;
        } else {
            debug!(
                "[FriendSync] 本地移除好友 {} 时未找到对应条目",
                friend_user_id
            );
        }
    }

    /// 解析某个好友的显示昵称
    ///
    /// 逐行调用，互相独立、数量不限、不保证顺序，列表整体替换时也不会取消。
    /// 结果只在该好友仍在当前列表中时才被应用；返回 `Ok(None)` 表示结果因
    /// 目标行已不存在而被丢弃。
    pub async fn resolve_name(&self, friend_user_id: &str) -> Result<Option<String>, ApiError> {
        let name = self.api.get_name(friend_user_id).await?;

        let applied = {
            let mut st = self.state();
            if st.friends.iter().any(|f| f == friend_user_id) {
                st.names.insert(friend_user_id.to_string(), name.clone());
                true
            } else {
                false
            }
        };

        if applied {
            debug!(
                "[FriendSync] 昵称解析完成: {} -> {}",
                friend_user_id, name
            );
            self.listener
                .on_friend_name_resolved(friend_user_id.to_string(), name.clone())
                .await;
            Ok(Some(name))
        } else {
            debug!(
                "[FriendSync] 好友 {} 已不在列表中，丢弃过期昵称结果",
                friend_user_id
            );
            Ok(None)
        }
    }

    /// 返回已缓存的显示昵称
    pub fn display_name(&self, friend_user_id: &str) -> Option<String> {
        self.state().names.get(friend_user_id).cloned()
    }

    async fn notify_list_changed(&self) {
        let snapshot = self.current_list();
        if let Ok(json) = serde_json::to_string(&snapshot) {
            self.listener.on_friend_list_changed(json).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn cfg(user_id: &str) -> FriendListSyncerConfig {
        FriendListSyncerConfig {
            user_id: user_id.to_string(),
            api_base_url: "http://localhost:3001".to_string(),
        }
    }

    fn strs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    /// 预置响应的脚本式假查询服务
    ///
    /// `wait_for` 为 Some 时，调用在返回前先等测试方放行，用来制造在途状态。
    struct ScriptedCall<T> {
        result: Result<T, ApiError>,
        wait_for: Option<Arc<Notify>>,
    }

    struct FakeFriendQuery {
        friends_calls: Mutex<VecDeque<ScriptedCall<Vec<String>>>>,
        name_calls: Mutex<VecDeque<ScriptedCall<String>>>,
        get_friends_count: AtomicUsize,
        get_name_count: AtomicUsize,
        delete_friend_count: AtomicUsize,
        add_friend_count: AtomicUsize,
    }

    impl FakeFriendQuery {
        fn new() -> Self {
            Self {
                friends_calls: Mutex::new(VecDeque::new()),
                name_calls: Mutex::new(VecDeque::new()),
                get_friends_count: AtomicUsize::new(0),
                get_name_count: AtomicUsize::new(0),
                delete_friend_count: AtomicUsize::new(0),
                add_friend_count: AtomicUsize::new(0),
            }
        }

        fn push_friends(&self, result: Result<Vec<String>, ApiError>) {
            self.friends_calls.lock().unwrap().push_back(ScriptedCall {
                result,
                wait_for: None,
            });
        }

        fn push_friends_gated(&self, result: Result<Vec<String>, ApiError>, gate: Arc<Notify>) {
            self.friends_calls.lock().unwrap().push_back(ScriptedCall {
                result,
                wait_for: Some(gate),
            });
        }

        fn push_name_gated(&self, result: Result<String, ApiError>, gate: Arc<Notify>) {
            self.name_calls.lock().unwrap().push_back(ScriptedCall {
                result,
                wait_for: Some(gate),
            });
        }
    }

    #[async_trait]
    impl FriendQuery for FakeFriendQuery {
        async fn get_friends(&self, _user_name: &str) -> Result<Vec<String>, ApiError> {
            self.get_friends_count.fetch_add(1, Ordering::SeqCst);
            let call = self
                .friends_calls
                .lock()
                .unwrap()
                .pop_front()
                .expect("脚本中没有剩余的 get_friends 响应");
            if let Some(gate) = call.wait_for {
                gate.notified().await;
            }
            call.result
        }

        async fn get_name(&self, _user_name: &str) -> Result<String, ApiError> {
            self.get_name_count.fetch_add(1, Ordering::SeqCst);
            let call = self
                .name_calls
                .lock()
                .unwrap()
                .pop_front()
                .expect("脚本中没有剩余的 get_name 响应");
            if let Some(gate) = call.wait_for {
                gate.notified().await;
            }
            call.result
        }

        async fn add_friend(&self, _user_name: &str, _friend_name: &str) -> Result<(), ApiError> {
            self.add_friend_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete_friend(
            &self,
            _user_name: &str,
            _friend_name: &str,
        ) -> Result<(), ApiError> {
            self.delete_friend_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn syncer_with(fake: Arc<FakeFriendQuery>, user_id: &str) -> Arc<FriendListSyncer> {
        Arc::new(FriendListSyncer::with_query(
            cfg(user_id),
            fake,
            Arc::new(EmptyFriendListener),
        ))
    }

    #[tokio::test]
    async fn refresh_commits_list_in_order() {
        let fake = Arc::new(FakeFriendQuery::new());
        fake.push_friends(Ok(strs(&["x@example.com", "y@example.com"])));
        let syncer = syncer_with(fake, "me@example.com");

        let list = syncer.refresh().await.unwrap();
        assert_eq!(list, strs(&["x@example.com", "y@example.com"]));
        assert_eq!(
            syncer.current_list(),
            strs(&["x@example.com", "y@example.com"])
        );
    }

    #[tokio::test]
    async fn refresh_twice_is_idempotent() {
        let fake = Arc::new(FakeFriendQuery::new());
        fake.push_friends(Ok(strs(&["a", "b"])));
        fake.push_friends(Ok(strs(&["a", "b"])));
        let syncer = syncer_with(fake.clone(), "me@example.com");

        syncer.refresh().await.unwrap();
        syncer.refresh().await.unwrap();

        assert_eq!(syncer.current_list(), strs(&["a", "b"]));
        assert_eq!(fake.get_friends_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_known_good_list() {
        let fake = Arc::new(FakeFriendQuery::new());
        fake.push_friends(Ok(strs(&["a", "b"])));
        fake.push_friends(Err(ApiError::Server {
            status: 500,
            message: "boom".to_string(),
        }));
        let syncer = syncer_with(fake, "me@example.com");

        syncer.refresh().await.unwrap();
        let err = syncer.refresh().await.unwrap_err();

        assert!(matches!(err, ApiError::Server { status: 500, .. }));
        assert_eq!(syncer.current_list(), strs(&["a", "b"]));
    }

    #[tokio::test]
    async fn decode_failure_keeps_prior_list() {
        let fake = Arc::new(FakeFriendQuery::new());
        fake.push_friends(Ok(strs(&["a"])));
        fake.push_friends(Err(ApiError::Decode("missing field `friends`".to_string())));
        let syncer = syncer_with(fake, "me@example.com");

        syncer.refresh().await.unwrap();
        let err = syncer.refresh().await.unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(syncer.current_list(), strs(&["a"]));
    }

    #[tokio::test]
    async fn new_refresh_supersedes_inflight_fetch() {
        let fake = Arc::new(FakeFriendQuery::new());
        let gate = Arc::new(Notify::new());
        // 第一次拉取被卡住，第二次立即返回
        fake.push_friends_gated(Ok(strs(&["a"])), gate.clone());
        fake.push_friends(Ok(strs(&["b"])));
        let syncer = syncer_with(fake.clone(), "me@example.com");

        let first = {
            let syncer = syncer.clone();
            tokio::spawn(async move { syncer.refresh().await })
        };
        // 等第一次拉取真正进入在途状态
        while fake.get_friends_count.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let second = syncer.refresh().await.unwrap();
        assert_eq!(second, strs(&["b"]));

        // 放行被取代的拉取：无论它走取消分支还是提交点的代次检查，
        // 都只能以 Superseded 告终，且不会覆盖已提交的结果
        gate.notify_one();
        let first_result = first.await.unwrap();
        assert!(matches!(first_result, Err(ApiError::Superseded)));
        assert_eq!(syncer.current_list(), strs(&["b"]));
    }

    #[tokio::test]
    async fn remove_is_local_only() {
        let fake = Arc::new(FakeFriendQuery::new());
        fake.push_friends(Ok(strs(&["a", "b", "c"])));
        let syncer = syncer_with(fake.clone(), "me@example.com");

        syncer.refresh().await.unwrap();
        syncer.remove("b").await;

        assert_eq!(syncer.current_list(), strs(&["a", "c"]));
        // 本地移除不得触发任何网络调用
        assert_eq!(fake.get_friends_count.load(Ordering::SeqCst), 1);
        assert_eq!(fake.delete_friend_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_user_is_rejected_without_network() {
        let fake = Arc::new(FakeFriendQuery::new());
        let syncer = syncer_with(fake.clone(), "");

        let err = syncer.refresh().await.unwrap_err();

        assert!(matches!(err, ApiError::EmptyUserName));
        assert_eq!(fake.get_friends_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_name_result_is_dropped_when_row_removed() {
        let fake = Arc::new(FakeFriendQuery::new());
        fake.push_friends(Ok(strs(&["a", "b"])));
        let gate = Arc::new(Notify::new());
        fake.push_name_gated(Ok("小北".to_string()), gate.clone());
        let syncer = syncer_with(fake.clone(), "me@example.com");

        syncer.refresh().await.unwrap();

        let lookup = {
            let syncer = syncer.clone();
            tokio::spawn(async move { syncer.resolve_name("b").await })
        };
        while fake.get_name_count.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // 查询在途时目标行被移除，完成后的结果必须被丢弃
        syncer.remove("b").await;
        gate.notify_one();

        let resolved = lookup.await.unwrap().unwrap();
        assert_eq!(resolved, None);
        assert_eq!(syncer.display_name("b"), None);
    }

    #[tokio::test]
    async fn resolved_name_is_cached_and_signaled() {
        struct RecordingListener {
            resolved: Mutex<Vec<(String, String)>>,
            changes: Mutex<Vec<String>>,
        }

        #[async_trait]
        impl FriendListener for RecordingListener {
            async fn on_friend_list_changed(&self, friends_json: String) {
                self.changes.lock().unwrap().push(friends_json);
            }

            async fn on_friend_name_resolved(&self, friend_user_id: String, name: String) {
                self.resolved
                    .lock()
                    .unwrap()
                    .push((friend_user_id, name));
            }
        }

        let fake = Arc::new(FakeFriendQuery::new());
        fake.push_friends(Ok(strs(&["a"])));
        fake.name_calls.lock().unwrap().push_back(ScriptedCall {
            result: Ok("阿安".to_string()),
            wait_for: None,
        });
        let listener = Arc::new(RecordingListener {
            resolved: Mutex::new(Vec::new()),
            changes: Mutex::new(Vec::new()),
        });
        let syncer = Arc::new(FriendListSyncer::with_query(
            cfg("me@example.com"),
            fake,
            listener.clone(),
        ));

        syncer.refresh().await.unwrap();
        let resolved = syncer.resolve_name("a").await.unwrap();

        assert_eq!(resolved.as_deref(), Some("阿安"));
        assert_eq!(syncer.display_name("a").as_deref(), Some("阿安"));
        assert_eq!(
            listener.resolved.lock().unwrap().as_slice(),
            &[("a".to_string(), "阿安".to_string())]
        );
        // 提交时发出过一次"列表已更新"信号
        assert_eq!(
            listener.changes.lock().unwrap().as_slice(),
            &[r#"["a"]"#.to_string()]
        );
    }
}
