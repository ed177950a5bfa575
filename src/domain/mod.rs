// ==========================================
// 人员目录批量导入 - 领域模型层
// ==========================================
// 职责: 定义字段、Schema、会话类型、人员记录
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod person;
pub mod schema;
pub mod types;

// 重导出核心类型
pub use person::{FieldValue, PersonRecord};
pub use schema::{
    identity_fields, is_identity_field, FieldDefinition, FieldType, Schema, FIELD_EMAIL,
    FIELD_FIRSTNAME, FIELD_LASTNAME, IDENTITY_FIELD_NAMES,
};
pub use types::{Cell, CsvRow, RowId, SessionState, NOVALUE};
