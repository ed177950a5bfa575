// ==========================================
// 人员目录批量导入 - 字段定义与 Schema
// ==========================================
// 职责: 角色字段定义（由角色目录提供，不可变）
// 红线: Schema 内 name 唯一（先出现者保留）
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ==========================================
// FieldType - 字段类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Select,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Number => write!(f, "number"),
            FieldType::Date => write!(f, "date"),
            FieldType::Select => write!(f, "select"),
        }
    }
}

// ==========================================
// FieldDefinition - 字段定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,  // 规范键
    pub label: String, // 显示文本（CSV 表头）
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

fn default_field_type() -> FieldType {
    FieldType::Text
}

impl FieldDefinition {
    pub fn new(name: &str, label: &str, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type,
            required,
        }
    }

    pub fn text(name: &str, label: &str, required: bool) -> Self {
        Self::new(name, label, FieldType::Text, required)
    }
}

// ===== 身份字段（每个角色固定在最前，且始终必填）=====
pub const FIELD_FIRSTNAME: &str = "firstname";
pub const FIELD_LASTNAME: &str = "lastname";
pub const FIELD_EMAIL: &str = "email";

pub const IDENTITY_FIELD_NAMES: [&str; 3] = [FIELD_FIRSTNAME, FIELD_LASTNAME, FIELD_EMAIL];

/// 身份字段定义（Vorname / Nachname / E-Mail）
pub fn identity_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::text(FIELD_FIRSTNAME, "Vorname", true),
        FieldDefinition::text(FIELD_LASTNAME, "Nachname", true),
        FieldDefinition::text(FIELD_EMAIL, "E-Mail", true),
    ]
}

pub fn is_identity_field(name: &str) -> bool {
    IDENTITY_FIELD_NAMES.contains(&name)
}

// ==========================================
// Schema - 有序、去重的字段列表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    fields: Vec<FieldDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加字段；name 已存在时丢弃并返回 false
    pub fn push(&mut self, field: FieldDefinition) -> bool {
        if self.contains(&field.name) {
            return false;
        }
        self.fields.push(field);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 期望表头（按 Schema 顺序的 label）
    pub fn labels(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.label.clone()).collect()
    }

    /// 必填字段（身份字段始终必填）
    pub fn is_required_at(&self, index: usize) -> bool {
        self.fields
            .get(index)
            .map(|f| f.required || is_identity_field(&f.name))
            .unwrap_or(false)
    }

    pub fn has_unique_names(&self) -> bool {
        let mut seen = HashSet::new();
        self.fields.iter().all(|f| seen.insert(f.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_drops_duplicate_name() {
        let mut schema = Schema::new();
        assert!(schema.push(FieldDefinition::text("email", "E-Mail", true)));
        assert!(!schema.push(FieldDefinition::text("email", "Mail", false)));
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.fields()[0].label, "E-Mail");
    }

    #[test]
    fn test_identity_fields_always_required() {
        let mut schema = Schema::new();
        schema.push(FieldDefinition::text(FIELD_FIRSTNAME, "Vorname", false));
        schema.push(FieldDefinition::text("telefon", "Telefon", false));
        assert!(schema.is_required_at(0));
        assert!(!schema.is_required_at(1));
        assert!(!schema.is_required_at(5));
    }

    #[test]
    fn test_field_definition_from_json() {
        let json = r#"{"name":"fachsemester","label":"Fachsemester","type":"number","required":true}"#;
        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(field.field_type, FieldType::Number);
        assert!(field.required);

        let minimal: FieldDefinition =
            serde_json::from_str(r#"{"name":"buro","label":"Büro"}"#).unwrap();
        assert_eq!(minimal.field_type, FieldType::Text);
        assert!(!minimal.required);
    }
}
