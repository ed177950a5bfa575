// ==========================================
// 人员目录批量导入 - 角色目录
// ==========================================
// 职责: 提供角色列表及各角色字段定义（外部配置，只读）
// 存储: config_kv.role_catalog（JSON），缺省使用内置目录
// ==========================================

use crate::domain::schema::{FieldDefinition, FieldType};
use serde::{Deserialize, Serialize};

// ==========================================
// RoleCatalog Trait
// ==========================================
// 用途: SchemaRegistry 的原始配置来源
// 实现者: StaticRoleCatalog
pub trait RoleCatalog: Send + Sync {
    /// 已配置角色（按配置顺序）
    fn list_roles(&self) -> Vec<String>;

    /// 角色专属字段；未知角色返回空列表
    fn fields_for(&self, role: &str) -> Vec<FieldDefinition>;

    /// 所有角色共享的字段（第 1 页字段）
    fn shared_fields(&self) -> Vec<FieldDefinition>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub role: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

// ==========================================
// StaticRoleCatalog - 内存角色目录
// ==========================================
// JSON 格式:
// {"shared_fields":[...],"roles":[{"role":"Student","fields":[...]}]}
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoleCatalog {
    #[serde(default)]
    pub shared_fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub roles: Vec<RoleDefinition>,
}

impl StaticRoleCatalog {
    pub fn new(shared_fields: Vec<FieldDefinition>, roles: Vec<RoleDefinition>) -> Self {
        Self {
            shared_fields,
            roles,
        }
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// 添加角色（同名角色覆盖）
    pub fn with_role(mut self, role: &str, fields: Vec<FieldDefinition>) -> Self {
        self.roles.retain(|r| r.role != role);
        self.roles.push(RoleDefinition {
            role: role.to_string(),
            fields,
        });
        self
    }

    /// 内置默认目录
    pub fn default_catalog() -> Self {
        let shared = vec![
            FieldDefinition::text("telefon", "Telefon", false),
            FieldDefinition::new("geburtsdatum", "Geburtsdatum", FieldType::Date, false),
            FieldDefinition::new("fahrtauto", "Fährt Auto", FieldType::Select, false),
        ];

        Self::new(shared, Vec::new())
            .with_role(
                "Student",
                vec![
                    FieldDefinition::new("matrikelnummer", "Matrikelnummer", FieldType::Number, true),
                    FieldDefinition::new("studiengang", "Studiengang", FieldType::Select, true),
                    FieldDefinition::new("fachsemester", "Fachsemester", FieldType::Number, true),
                ],
            )
            .with_role(
                "Mitarbeiter",
                vec![
                    FieldDefinition::text("personalnummer", "Personalnummer", true),
                    FieldDefinition::text("abteilung", "Abteilung", true),
                    FieldDefinition::new("eintrittsdatum", "Eintrittsdatum", FieldType::Date, false),
                ],
            )
            .with_role(
                "Dozent",
                vec![
                    FieldDefinition::text("lehrgebiet", "Lehrgebiet", true),
                    FieldDefinition::text("buro", "Büro", false),
                    // 与共享字段重名，Schema 解析时丢弃
                    FieldDefinition::text("telefon", "Telefon (dienstlich)", false),
                ],
            )
    }
}

impl RoleCatalog for StaticRoleCatalog {
    fn list_roles(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.role.clone()).collect()
    }

    fn fields_for(&self, role: &str) -> Vec<FieldDefinition> {
        self.roles
            .iter()
            .find(|r| r.role == role)
            .map(|r| r.fields.clone())
            .unwrap_or_default()
    }

    fn shared_fields(&self) -> Vec<FieldDefinition> {
        self.shared_fields.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_roles_in_order() {
        let catalog = StaticRoleCatalog::default_catalog();
        assert_eq!(catalog.list_roles(), vec!["Student", "Mitarbeiter", "Dozent"]);
        assert_eq!(catalog.fields_for("Student").len(), 3);
        assert!(catalog.fields_for("Unbekannt").is_empty());
    }

    #[test]
    fn test_catalog_json_roundtrip_keeps_role_order() {
        let catalog = StaticRoleCatalog::default_catalog();
        let json = catalog.to_json().unwrap();
        let parsed = StaticRoleCatalog::from_json(&json).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_with_role_replaces_existing() {
        let catalog = StaticRoleCatalog::default()
            .with_role("Student", vec![FieldDefinition::text("a", "A", true)])
            .with_role("Student", vec![FieldDefinition::text("b", "B", true)]);
        assert_eq!(catalog.list_roles(), vec!["Student"]);
        assert_eq!(catalog.fields_for("Student")[0].name, "b");
    }
}
