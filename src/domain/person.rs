// ==========================================
// 人员目录批量导入 - 人员记录（提交载荷）
// ==========================================
// 用途: RecordAssembler 产出，提交给目录服务 create-record
// 红线: 只包含外部约定的键，未定义的值不输出
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// FieldValue - 强制类型转换后的字段值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

// ==========================================
// PersonRecord - 人员记录
// ==========================================
// JSON 形如:
// {"firstName":"Max","lastName":"Mustermann","email":"max@x.com",
//  "roles":["Student"],"drivesCar":true,"studentNumber":123}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    // ===== 身份字段 =====
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    // ===== 角色 =====
    pub roles: Vec<String>,

    // ===== 布尔标志（缺省 true）=====
    pub drives_car: bool,

    // ===== 其余外部约定字段（外部键 → 值）=====
    #[serde(flatten)]
    pub attributes: BTreeMap<String, FieldValue>,
}

impl PersonRecord {
    pub fn attribute(&self, key: &str) -> Option<&FieldValue> {
        self.attributes.get(key)
    }
}
