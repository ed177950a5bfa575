// ==========================================
// 人员目录批量导入 - Schema 注册表
// ==========================================
// 职责: 解析角色的有序字段列表
// 规则: 身份字段 ++ 共享字段 ++ 角色字段，按 name 去重（先出现者保留）
// 红线: 纯函数，仅依赖角色目录配置
// ==========================================

use crate::config::role_catalog::RoleCatalog;
use crate::domain::schema::{identity_fields, FieldDefinition, Schema};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SchemaRegistry {
    catalog: Arc<dyn RoleCatalog>,
}

impl SchemaRegistry {
    pub fn new(catalog: Arc<dyn RoleCatalog>) -> Self {
        Self { catalog }
    }

    /// 已配置角色
    pub fn roles(&self) -> Vec<String> {
        self.catalog.list_roles()
    }

    pub fn is_known_role(&self, role: &str) -> bool {
        self.catalog.list_roles().iter().any(|r| r == role)
    }

    /// 解析单个角色的 Schema
    ///
    /// 未知角色不报错：角色段为空，只返回身份字段 + 共享字段
    pub fn resolve_schema(&self, role: &str) -> Schema {
        if !self.is_known_role(role) {
            warn!(role = %role, "未知角色，角色字段段为空");
        }

        let mut schema = Schema::new();
        let segments = [
            identity_fields(),
            self.catalog.shared_fields(),
            self.catalog.fields_for(role),
        ];
        for field in segments.into_iter().flatten() {
            push_dedup(&mut schema, field, role);
        }
        schema
    }

    /// 多角色合并 Schema（按角色迭代顺序，首次出现者保留）
    pub fn resolve_merged_schema<I, S>(&self, roles: I) -> Schema
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merged = Schema::new();
        for role in roles {
            let role = role.as_ref();
            for field in self.resolve_schema(role).fields() {
                push_dedup(&mut merged, field.clone(), role);
            }
        }
        merged
    }

    /// 期望表头
    pub fn expected_header(&self, role: &str) -> Vec<String> {
        self.resolve_schema(role).labels()
    }
}

fn push_dedup(schema: &mut Schema, field: FieldDefinition, role: &str) {
    let name = field.name.clone();
    if !schema.push(field) {
        debug!(role = %role, field = %name, "重复字段已丢弃");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::role_catalog::StaticRoleCatalog;
    use crate::domain::schema::FieldType;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(Arc::new(StaticRoleCatalog::default_catalog()))
    }

    #[test]
    fn test_resolve_schema_order() {
        let schema = registry().resolve_schema("Student");
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "firstname",
                "lastname",
                "email",
                "telefon",
                "geburtsdatum",
                "fahrtauto",
                "matrikelnummer",
                "studiengang",
                "fachsemester"
            ]
        );
    }

    #[test]
    fn test_duplicate_role_field_dropped() {
        // Dozent 定义了与共享字段同名的 telefon
        let schema = registry().resolve_schema("Dozent");
        assert!(schema.has_unique_names());
        assert_eq!(schema.get("telefon").unwrap().label, "Telefon");
    }

    #[test]
    fn test_all_roles_have_unique_names() {
        let registry = registry();
        for role in registry.roles() {
            assert!(registry.resolve_schema(&role).has_unique_names(), "role={}", role);
        }
    }

    #[test]
    fn test_unknown_role_yields_identity_and_shared_only() {
        let schema = registry().resolve_schema("Astronaut");
        assert_eq!(schema.len(), 6);
        assert_eq!(schema.fields()[0].name, "firstname");
    }

    #[test]
    fn test_identity_field_in_shared_list_is_deduplicated() {
        let catalog = StaticRoleCatalog::new(
            vec![FieldDefinition::text("email", "Mail", false)],
            Vec::new(),
        )
        .with_role("Gast", vec![FieldDefinition::new("alter", "Alter", FieldType::Number, false)]);
        let schema = SchemaRegistry::new(Arc::new(catalog)).resolve_schema("Gast");
        assert_eq!(schema.labels(), vec!["Vorname", "Nachname", "E-Mail", "Alter"]);
    }

    #[test]
    fn test_merged_schema_first_seen_order() {
        let registry = registry();
        let merged = registry.resolve_merged_schema(["Mitarbeiter", "Student"]);
        assert!(merged.has_unique_names());

        let names: Vec<&str> = merged.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(&names[..6], &["firstname", "lastname", "email", "telefon", "geburtsdatum", "fahrtauto"]);
        assert_eq!(
            &names[6..],
            &["personalnummer", "abteilung", "eintrittsdatum", "matrikelnummer", "studiengang", "fachsemester"]
        );
    }

    #[test]
    fn test_merged_schema_of_single_role_equals_schema() {
        let registry = registry();
        assert_eq!(
            registry.resolve_merged_schema(["Student"]),
            registry.resolve_schema("Student")
        );
    }
}
