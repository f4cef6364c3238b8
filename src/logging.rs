use tracing_subscriber::EnvFilter;

/// 初始化日志输出，`RUST_LOG` 未设置时默认 info 级别；重复调用无副作用
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
