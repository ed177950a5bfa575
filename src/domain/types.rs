// ==========================================
// 人员目录批量导入 - 领域类型定义
// ==========================================
// 职责: 会话状态、单元格、行类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 必填单元格缺失时写入的占位文本
pub const NOVALUE: &str = "NOVALUE";

/// 行标识（数据行在文件中的序号，从 0 开始，不含表头）
pub type RowId = usize;

/// 一行数据：按列位置与表头对齐（同名列互不覆盖）
pub type CsvRow = Vec<Cell>;

// ==========================================
// 单元格 (Cell)
// ==========================================
// Missing 只存在于导入会话内部，序列化时输出 NOVALUE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Value(String), // 已去除首尾空白的值
    Missing,       // 必填但为空
}

impl Cell {
    /// 由用户输入构造（TRIM）
    pub fn from_input(raw: &str) -> Self {
        Cell::Value(raw.trim().to_string())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// 空白或缺失
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Value(v) => v.trim().is_empty(),
            Cell::Missing => true,
        }
    }

    /// 导出文本（Missing → NOVALUE）
    pub fn as_str(&self) -> &str {
        match self {
            Cell::Value(v) => v.as_str(),
            Cell::Missing => NOVALUE,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Value(String::new())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 会话状态 (Session State)
// ==========================================
// Selecting → Previewing ⇄ Editing; 提交/返回/重置后回到 Selecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Selecting,  // 选择角色与文件
    Previewing, // 已导入，预览/标记
    Editing,    // 编辑缓冲区中修复
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Selecting => write!(f, "SELECTING"),
            SessionState::Previewing => write!(f, "PREVIEWING"),
            SessionState::Editing => write!(f, "EDITING"),
        }
    }
}
