// ==========================================
// 人员目录批量导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 文件/表头错误在建立任何行状态之前中止导入；
//       行级失败（RowFailure）不中止批次
// ==========================================

use crate::domain::types::{RowId, SessionState};
use crate::i18n::{t, t_with_args};
use serde::Serialize;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件为空: 没有非空数据行")]
    EmptyFile,

    #[error("表头与角色 {role} 不兼容: 期望 [{expected}]，实际 [{actual}]")]
    HeaderIncompatible {
        role: String,
        expected: String,
        actual: String,
    },

    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 会话状态错误 =====
    #[error("无效的状态转换: 状态 {from} 下不允许 {action}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },

    #[error("未选择任何行")]
    NoRowsSelected,

    #[error("行不存在: {0}")]
    UnknownRow(RowId),

    #[error("列不存在: {0}")]
    UnknownColumn(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 数据库错误 =====
    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

impl ImportError {
    /// 面向操作员的本地化消息（上传类错误走 locales，其余沿用 Display）
    pub fn operator_message(&self) -> String {
        match self {
            ImportError::EmptyFile => t("import.empty_file"),
            ImportError::HeaderIncompatible { role, expected, .. } => t_with_args(
                "import.header_incompatible",
                &[("role", role), ("expected", expected)],
            ),
            ImportError::FileNotFound(path) => {
                t_with_args("import.file_not_found", &[("path", path)])
            }
            ImportError::UnsupportedFormat(ext) => {
                t_with_args("import.unsupported_format", &[("ext", ext)])
            }
            other => other.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// RowFailure - 行级失败（提交阶段）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row_id: RowId,
    pub kind: RowFailureKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowFailureKind {
    /// 必填单元格仍为 NOVALUE/空白，未提交
    MissingRequiredField,
    /// 组装时身份字段为空（不应发生的防御路径）
    AssemblyValidationFailure,
    /// 目录服务返回失败
    SubmissionFailure(String),
}

impl std::fmt::Display for RowFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowFailureKind::MissingRequiredField => write!(f, "必填字段缺失"),
            RowFailureKind::AssemblyValidationFailure => write!(f, "身份字段校验失败"),
            RowFailureKind::SubmissionFailure(msg) => write!(f, "提交失败: {}", msg),
        }
    }
}
