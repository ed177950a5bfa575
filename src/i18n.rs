// ==========================================
// 人员目录批量导入 - 操作员消息 (i18n)
// ==========================================
// 语言: zh-CN（默认）、en；文案见 locales/*.yml
// 占位符: %{name}
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use tracing::warn;

pub const DEFAULT_LOCALE: &str = "zh-CN";

pub const SUPPORTED_LOCALES: &[&str] = &["zh-CN", "en"];

/// 语言代码归一化: "en_US" / "EN-us" → "en"，"zh" / "zh_CN" → "zh-CN"
pub fn normalize_locale(raw: &str) -> Option<&'static str> {
    let lowered = raw.trim().to_ascii_lowercase().replace('_', "-");
    let primary = lowered.split('-').next().unwrap_or("");
    match primary {
        "zh" => Some("zh-CN"),
        "en" => Some("en"),
        _ => None,
    }
}

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换语言；不支持的语言保持当前设置并返回 false
pub fn set_locale(raw: &str) -> bool {
    match normalize_locale(raw) {
        Some(locale) => {
            rust_i18n::set_locale(locale);
            true
        }
        None => {
            warn!(locale = %raw, current = %current_locale(), "不支持的语言，保持当前设置");
            false
        }
    }
}

pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 带参数的消息
///
/// ```no_run
/// use sau_import::i18n::t_with_args;
/// let msg = t_with_args("commit.summary_success", &[("success", "3")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(key), |msg, (name, value)| {
        msg.replace(&format!("%{{{}}}", name), value)
    })
}

// locale 为进程级全局状态，依赖它的单元测试共用此锁
#[cfg(test)]
pub(crate) static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
