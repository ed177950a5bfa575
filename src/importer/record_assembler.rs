// ==========================================
// 人员目录批量导入 - 记录组装器
// ==========================================
// 职责: Schema 顺序的扁平行 → PersonRecord（提交载荷）
// 流程: label 规范化 → 键值表（首个非空值优先）→ 身份校验 → 类型转换 → 外部键重命名
// 红线: 不在外部约定键集合内的字段在此丢弃
// ==========================================

use crate::domain::person::{FieldValue, PersonRecord};
use crate::domain::schema::{FieldType, Schema, FIELD_EMAIL, FIELD_FIRSTNAME, FIELD_LASTNAME};
use crate::importer::label_canonicalizer::canonicalize;
use crate::importer::schema_registry::SchemaRegistry;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// "Fährt Auto" 缺省值
pub const DEFAULT_DRIVES_CAR: bool = true;

/// 布尔字段规范键
const DRIVES_CAR_KEY: &str = "fahrtauto";

/// 角色列规范键（由载荷 roles 承载，不作为属性）
const ROLES_KEY: &str = "roles";

/// 规范键 → 外部载荷键
const PAYLOAD_KEYS: &[(&str, &str)] = &[
    ("telefon", "phone"),
    ("geburtsdatum", "birthDate"),
    ("strasse", "street"),
    ("ort", "city"),
    ("plz", "postalCode"),
    ("matrikelnummer", "studentNumber"),
    ("studiengang", "program"),
    ("fachsemester", "semester"),
    ("personalnummer", "employeeNumber"),
    ("abteilung", "department"),
    ("eintrittsdatum", "startDate"),
    ("lehrgebiet", "subjectArea"),
    ("buro", "office"),
];

/// 接受的日期输入格式
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y%m%d"];

pub fn payload_key_for(canonical_key: &str) -> Option<&'static str> {
    PAYLOAD_KEYS
        .iter()
        .find(|(key, _)| *key == canonical_key)
        .map(|(_, payload)| *payload)
}

// ==========================================
// RecordAssembler
// ==========================================
pub struct RecordAssembler {
    registry: Arc<SchemaRegistry>,
}

impl RecordAssembler {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// 按角色 Schema 组装记录
    ///
    /// # 返回
    /// - Some(PersonRecord): 组装成功
    /// - None: 身份字段（Vorname/Nachname/E-Mail）为空
    pub fn assemble(&self, ordered_values: &[String], role: &str) -> Option<PersonRecord> {
        let schema = self.registry.resolve_schema(role);
        assemble_with_schema(ordered_values, role, &schema)
    }
}

/// 按给定 Schema 组装记录（ordered_values 与 Schema 字段一一对应）
pub fn assemble_with_schema(
    ordered_values: &[String],
    role: &str,
    schema: &Schema,
) -> Option<PersonRecord> {
    // 规范键 → (值, 字段类型)；首个非空值优先
    let mut by_key: HashMap<String, (String, FieldType)> = HashMap::new();
    for (field, value) in schema.fields().iter().zip(ordered_values) {
        let key = canonicalize(&field.label);
        let value = value.trim();
        if let Some((existing, _)) = by_key.get(&key) {
            if !existing.is_empty() {
                continue;
            }
        }
        by_key.insert(key, (value.to_string(), field.field_type));
    }

    let identity = |key: &str| -> Option<String> {
        by_key
            .get(key)
            .map(|(v, _)| v.clone())
            .filter(|v| !v.is_empty())
    };

    let (first_name, last_name, email) = match (
        identity(FIELD_FIRSTNAME),
        identity(FIELD_LASTNAME),
        identity(FIELD_EMAIL),
    ) {
        (Some(f), Some(l), Some(e)) => (f, l, e),
        _ => {
            debug!(role = %role, "身份字段为空，拒绝组装");
            return None;
        }
    };

    let drives_car = by_key
        .get(DRIVES_CAR_KEY)
        .and_then(|(v, _)| parse_bool(v))
        .unwrap_or(DEFAULT_DRIVES_CAR);

    let mut attributes = BTreeMap::new();
    for (key, (value, field_type)) in &by_key {
        if matches!(
            key.as_str(),
            FIELD_FIRSTNAME | FIELD_LASTNAME | FIELD_EMAIL | DRIVES_CAR_KEY | ROLES_KEY
        ) {
            continue;
        }

        let payload_key = match payload_key_for(key) {
            Some(k) => k,
            None => {
                debug!(role = %role, field = %key, "字段不在外部约定键集合内，已丢弃");
                continue;
            }
        };

        if let Some(coerced) = coerce(value, *field_type) {
            attributes.insert(payload_key.to_string(), coerced);
        }
    }

    Some(PersonRecord {
        first_name,
        last_name,
        email,
        roles: vec![role.to_string()],
        drives_car,
        attributes,
    })
}

// ==========================================
// 类型转换
// ==========================================

/// 按字段类型转换；None 表示值未定义（不输出）
fn coerce(value: &str, field_type: FieldType) -> Option<FieldValue> {
    match field_type {
        FieldType::Number => {
            if value.is_empty() {
                return None;
            }
            Some(
                parse_number(value)
                    .map(FieldValue::Number)
                    .unwrap_or_else(|| FieldValue::Text(value.to_string())),
            )
        }
        // 无法解析的日期输出空串
        FieldType::Date => Some(FieldValue::Text(
            parse_date(value)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        )),
        FieldType::Text | FieldType::Select => {
            if value.is_empty() {
                None
            } else {
                Some(FieldValue::Text(value.to_string()))
            }
        }
    }
}

/// 解析数值（接受逗号作小数点）
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// 解析日期（多种输入格式 → NaiveDate）
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// 解析布尔（大小写不敏感 "true"/"false"）
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
