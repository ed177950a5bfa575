// ==========================================
// 人员目录批量导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{
    ImportConfigReader, DEFAULT_FAILED_ROWS_PREFIX, DEFAULT_ROLES_COLUMN_LABEL,
};
use crate::config::role_catalog::StaticRoleCatalog;
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（建表幂等）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            crate::db::configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> ImportResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ImportError::ConfigReadError {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::debug!(config_key = key, "配置已更新");
        Ok(())
    }

    /// 保存角色目录（JSON）
    pub fn set_role_catalog(&self, catalog: &StaticRoleCatalog) -> ImportResult<()> {
        let raw = catalog.to_json().map_err(|e| ImportError::ConfigValueError {
            key: config_keys::ROLE_CATALOG.to_string(),
            value: String::new(),
            message: e.to_string(),
        })?;
        self.set_global_config_value(config_keys::ROLE_CATALOG, &raw)
    }

    /// 从 config_kv 表读取配置值，带默认值（空白视为未配置）
    fn get_config_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        Ok(self
            .get_config_value(key)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        let conn = self.lock()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        serde_json::to_string(&json_value).map_err(|e| ImportError::InternalError(e.to_string()))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_failed_rows_prefix(&self) -> ImportResult<String> {
        // 前缀允许为空字符串，不走空白回退
        Ok(self
            .get_config_value(config_keys::FAILED_ROWS_PREFIX)?
            .unwrap_or_else(|| DEFAULT_FAILED_ROWS_PREFIX.to_string()))
    }

    async fn get_roles_column_label(&self) -> ImportResult<String> {
        self.get_config_or_default(config_keys::ROLES_COLUMN_LABEL, DEFAULT_ROLES_COLUMN_LABEL)
    }

    async fn get_role_catalog(&self) -> ImportResult<StaticRoleCatalog> {
        let raw = match self.get_config_value(config_keys::ROLE_CATALOG)? {
            Some(v) => v,
            None => return Ok(StaticRoleCatalog::default_catalog()),
        };

        match StaticRoleCatalog::from_json(&raw) {
            Ok(catalog) => Ok(catalog),
            Err(e) => {
                tracing::warn!(
                    config_key = config_keys::ROLE_CATALOG,
                    error = %e,
                    "角色目录配置格式错误，使用内置目录"
                );
                Ok(StaticRoleCatalog::default_catalog())
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导出文件
    pub const FAILED_ROWS_PREFIX: &str = "failed_rows_prefix";

    // 表头兼容
    pub const ROLES_COLUMN_LABEL: &str = "roles_column_label";

    // 角色目录（JSON）
    pub const ROLE_CATALOG: &str = "role_catalog";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::role_catalog::RoleCatalog;
    use tempfile::NamedTempFile;

    fn test_manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, manager)
    }

    #[tokio::test]
    async fn test_defaults_when_not_configured() {
        let (_tmp, manager) = test_manager();

        let settings = manager.load_import_settings().await.unwrap();
        assert_eq!(settings.failed_rows_prefix, "FEHLER_");
        assert_eq!(settings.roles_column_label, "Rollen");

        let catalog = manager.get_role_catalog().await.unwrap();
        assert_eq!(catalog, StaticRoleCatalog::default_catalog());
    }

    #[tokio::test]
    async fn test_configured_values_override_defaults() {
        let (_tmp, manager) = test_manager();
        manager
            .set_global_config_value(config_keys::FAILED_ROWS_PREFIX, "failed_")
            .unwrap();
        manager
            .set_global_config_value(config_keys::ROLES_COLUMN_LABEL, "Roles")
            .unwrap();

        let settings = manager.load_import_settings().await.unwrap();
        assert_eq!(settings.failed_rows_prefix, "failed_");
        assert_eq!(settings.roles_column_label, "Roles");
    }

    #[tokio::test]
    async fn test_malformed_catalog_falls_back_to_default() {
        let (_tmp, manager) = test_manager();
        manager
            .set_global_config_value(config_keys::ROLE_CATALOG, "{not json")
            .unwrap();

        let catalog = manager.get_role_catalog().await.unwrap();
        assert_eq!(catalog.list_roles(), vec!["Student", "Mitarbeiter", "Dozent"]);
    }

    #[tokio::test]
    async fn test_role_catalog_roundtrip_through_config_kv() {
        let (_tmp, manager) = test_manager();
        let catalog = StaticRoleCatalog::default().with_role("Gast", Vec::new());
        manager.set_role_catalog(&catalog).unwrap();

        let loaded = manager.get_role_catalog().await.unwrap();
        assert_eq!(loaded.list_roles(), vec!["Gast"]);

        let snapshot = manager.get_config_snapshot().unwrap();
        assert!(snapshot.contains("role_catalog"));
    }
}
