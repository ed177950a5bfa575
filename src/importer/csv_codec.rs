// ==========================================
// 人员目录批量导入 - CSV 编解码
// ==========================================
// 导入: CRLF/LF 分行，逗号分列，不处理引号（已知限制）
// 导出: CRLF 连接；含逗号/引号/换行的单元格加引号，内部引号加倍
// ==========================================

use crate::domain::schema::Schema;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::label_canonicalizer::{canonicalize, same_field};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use std::path::Path;

// ==========================================
// 解析
// ==========================================

/// 解析 CSV 文本为行列表（第一行为表头）
///
/// - 单元格 TRIM
/// - 全部单元格为空的行被丢弃
pub fn parse(text: &str) -> ImportResult<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // 允许行长度不一致
        .quoting(false) // 导入不支持引号转义
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();

        // 跳过完全空白的行
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(cells);
    }

    Ok(rows)
}

/// 读取上传文件（UTF-8）
pub async fn read_upload<P: AsRef<Path>>(file_path: P) -> ImportResult<String> {
    let path = file_path.as_ref();

    // 检查扩展名
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext != "csv" {
        return Err(ImportError::UnsupportedFormat(ext));
    }

    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ImportError::FileNotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

// ==========================================
// 序列化
// ==========================================

/// 行列表 → CSV 文本（行之间 CRLF，末尾不追加换行）
pub fn serialize(rows: &[Vec<String>]) -> ImportResult<String> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::CsvParseError(e.to_string()))?;
    let mut text =
        String::from_utf8(bytes).map_err(|e| ImportError::CsvParseError(e.to_string()))?;

    if text.ends_with("\r\n") {
        text.truncate(text.len() - 2);
    }
    Ok(text)
}

/// 角色导入模板（仅表头）
pub fn template_csv(schema: &Schema) -> ImportResult<String> {
    serialize(&[schema.labels()])
}

/// 模板文件名: <role>_SAU_IMPORT.csv
pub fn template_file_name(role: &str) -> String {
    format!("{}_SAU_IMPORT.csv", role)
}

/// 失败行文件名: <prefix><role>_SAU.csv
pub fn failed_rows_file_name(prefix: &str, role: &str) -> String {
    format!("{}{}_SAU.csv", prefix, role)
}

// ==========================================
// 表头兼容性
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMatch {
    /// 与期望表头一致
    Exact,
    /// 多出一列角色列（列下标），剥离后一致
    HasRolesColumn(usize),
    /// 不兼容
    Mismatch,
}

impl HeaderMatch {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, HeaderMatch::Mismatch)
    }
}

/// 比较上传表头与 Schema 期望表头（逐列按规范键比较）
pub fn header_matches(header: &[String], schema: &Schema, roles_column_label: &str) -> HeaderMatch {
    let expected = schema.labels();

    if labels_equal(header, &expected) {
        return HeaderMatch::Exact;
    }

    if header.len() == expected.len() + 1 {
        let roles_positions: Vec<usize> = header
            .iter()
            .enumerate()
            .filter(|(_, label)| same_field(label, roles_column_label))
            .map(|(idx, _)| idx)
            .collect();

        if let [idx] = roles_positions.as_slice() {
            let mut stripped = header.to_vec();
            stripped.remove(*idx);
            if labels_equal(&stripped, &expected) {
                return HeaderMatch::HasRolesColumn(*idx);
            }
        }
    }

    HeaderMatch::Mismatch
}

fn labels_equal(actual: &[String], expected: &[String]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, e)| canonicalize(a) == canonicalize(e))
}

/// 从一行中移除指定列（行长度不足时不变）
pub fn strip_column(row: &mut Vec<String>, idx: usize) {
    if idx < row.len() {
        row.remove(idx);
    }
}
