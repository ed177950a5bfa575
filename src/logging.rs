// ==========================================
// 人员目录批量导入 - 日志初始化
// ==========================================
// 过滤器: SAU_IMPORT_LOG > RUST_LOG > 默认值
// 输出格式: SAU_IMPORT_LOG_FORMAT=json 时输出 JSON 行，否则文本
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 应用专用的过滤器环境变量
pub const LOG_ENV: &str = "SAU_IMPORT_LOG";

/// 输出格式环境变量
pub const LOG_FORMAT_ENV: &str = "SAU_IMPORT_LOG_FORMAT";

/// 默认过滤器: 依赖库只输出 warn，本 crate 输出 info
pub const DEFAULT_FILTER: &str = "warn,sau_import=info";

const TEST_FILTER: &str = "warn,sau_import=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// 未设置或无法识别时为 Text
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// 选择过滤器指令（空白值视为未设置）
pub fn filter_directive(app_env: Option<&str>, rust_log: Option<&str>) -> String {
    [app_env, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("日志过滤器无效 ({}): {}，使用默认值", directive, e);
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// 初始化命令行日志
///
/// ```no_run
/// // SAU_IMPORT_LOG=sau_import=debug SAU_IMPORT_LOG_FORMAT=json sau-import roles
/// sau_import::logging::init();
/// ```
pub fn init() {
    let app_env = std::env::var(LOG_ENV).ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(&filter_directive(app_env.as_deref(), rust_log.as_deref()));
    let format = LogFormat::from_env_value(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    // 日志写 stderr，stdout 留给预览和文件名输出
    match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init(),
    }
}

/// 测试日志（可重复调用）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new(TEST_FILTER))
        .with_test_writer()
        .try_init();
}
