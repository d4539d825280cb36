//! 位置共享 CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试和展示 SDK 功能
//! 启动时通过命令行参数指定用户，周期性刷新好友列表并展示回调内容

use anyhow::Result;
use clap::Parser;
use locshare_sdk_core_rust::loc::client::{ClientConfig, LocShareClient};
use locshare_sdk_core_rust::loc::friend::FriendListener;
use locshare_sdk_core_rust::loc::location::Location;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// 位置共享 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "locshare-cli")]
#[command(about = "位置共享 CLI 客户端 - 用于测试和展示 SDK 功能", long_about = None)]
struct Args {
    /// 当前用户（邮箱）
    #[arg(short, long)]
    user: String,

    /// 要查询位置的好友（可选）
    #[arg(short, long)]
    friend: Option<String>,

    /// HTTP API 基础地址
    #[arg(long, default_value = "http://localhost:3001")]
    api_url: String,

    /// 好友列表刷新间隔（秒）
    #[arg(short, long, default_value = "15")]
    interval: u64,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别（默认: info,locshare_sdk_core_rust=debug）
    #[arg(long, default_value = "info,locshare_sdk_core_rust=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    // 输出到 stdout（控制台），保留 ANSI 颜色代码用于终端显示
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
}

/// 好友监听器：输出所有回调内容
struct CliFriendListener;

#[async_trait::async_trait]
impl FriendListener for CliFriendListener {
    async fn on_friend_list_changed(&self, friends_json: String) {
        info!("[CLI/Friend] 👥 好友列表变更: {}", friends_json);
    }

    async fn on_friend_name_resolved(&self, friend_user_id: String, name: String) {
        info!("[CLI/Friend] 📛 昵称解析: {} -> {}", friend_user_id, name);
    }
}

/// 刷新一轮：拉好友列表、解析昵称、查询指定好友的位置
async fn refresh_once(client: &LocShareClient, lookup_target: Option<&str>) {
    match client.refresh_friends().await {
        Ok(friends) => {
            info!("[CLI] 📋 好友列表（共 {} 个）:", friends.len());
            for friend in &friends {
                let name = client
                    .friend_display_name(friend)
                    .unwrap_or_else(|| "<未解析>".to_string());
                info!("[CLI]   - {} | 昵称: {}", friend, name);
            }

            // 逐行解析昵称，互相独立，不等待彼此
            for friend in friends {
                let client = client.clone();
                tokio::spawn(async move {
                    if let Err(e) = client.resolve_friend_name(&friend).await {
                        error!("[CLI] 昵称解析失败 {}: {}", friend, e);
                    }
                });
            }
        }
        Err(e) => {
            // 列表保持最后一次已知的好状态，下一轮重试
            error!("[CLI] 刷新好友列表失败: {}", e);
        }
    }

    if let Some(friend) = lookup_target {
        match client.lookup_friend(friend).await {
            Ok(Location::Gps {
                latitude,
                longitude,
            }) => {
                info!("[CLI] 📍 {} 在室外: ({}, {})", friend, latitude, longitude);
            }
            Ok(Location::Indoor {
                building,
                floor,
                x,
                y,
            }) => {
                info!(
                    "[CLI] 🏢 {} 在 {} 第 {} 层 ({}, {})",
                    friend, building, floor, x, y
                );
                match client.get_building_metadata(&building).await {
                    Ok(Some(meta)) => info!(
                        "[CLI]   楼宇: {} 共 {} 层, 锚点 ({}, {})",
                        meta.building_name, meta.floors, meta.latitude, meta.longitude
                    ),
                    Ok(None) => info!("[CLI]   楼宇 {} 未收录", building),
                    Err(e) => error!("[CLI] 查询楼宇元数据失败: {}", e),
                }
            }
            Err(e) => error!("[CLI] 查询 {} 的位置失败: {}", friend, e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(&args.log_level);

    info!("[CLI] 🚀 位置共享 CLI 客户端（测试模式）");
    info!("[CLI] 👤 用户: {}", args.user);
    info!("[CLI] 🌐 API 地址: {}", args.api_url);
    info!("[CLI] ⏱️  刷新间隔: {} 秒", args.interval);

    let mut config = ClientConfig::new(args.user.clone());
    config.api_base_url = args.api_url.clone();
    let client = LocShareClient::with_friend_listener(config, Arc::new(CliFriendListener))
        .map_err(|e| anyhow::anyhow!("创建客户端失败: {}", e))?;

    // 周期性刷新由表示层负责，SDK 自身不做重试
    let refresh_client = client.clone();
    let lookup_target = args.friend.clone();
    let interval = args.interval.max(1);
    tokio::spawn(async move {
        loop {
            refresh_once(&refresh_client, lookup_target.as_deref()).await;
            sleep(Duration::from_secs(interval)).await;
        }
    });

    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        sleep(Duration::from_secs(args.duration)).await;
        info!("[CLI] 👋 程序退出");
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        loop {
            sleep(Duration::from_secs(3600)).await;
        }
    }

    Ok(())
}
