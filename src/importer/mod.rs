// ==========================================
// 人员目录批量导入 - 导入层
// ==========================================
// 职责: Schema 解析、表头匹配、CSV 编解码、会话状态机、记录组装
// 流程: 解析 → 表头校验 → 缺失标记 → 编辑修复 → 组装 → 顺序提交
// ==========================================

// 模块声明
pub mod csv_codec;
pub mod error;
pub mod label_canonicalizer;
pub mod reconciler;
pub mod record_assembler;
pub mod schema_registry;

// 重导出核心类型
pub use csv_codec::HeaderMatch;
pub use error::{ImportError, ImportResult, RowFailure, RowFailureKind};
pub use label_canonicalizer::{canonicalize, same_field};
pub use reconciler::{CommitReport, CsvDownload, ImportSession, PreviewRow};
pub use record_assembler::RecordAssembler;
pub use schema_registry::SchemaRegistry;
