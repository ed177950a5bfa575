// ==========================================
// 人员目录批量导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::role_catalog::StaticRoleCatalog;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 默认失败行文件名前缀
pub const DEFAULT_FAILED_ROWS_PREFIX: &str = "FEHLER_";

/// 默认角色列表头
pub const DEFAULT_ROLES_COLUMN_LABEL: &str = "Rollen";

// ==========================================
// ImportSettings - 导入会话配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub failed_rows_prefix: String,
    pub roles_column_label: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            failed_rows_prefix: DEFAULT_FAILED_ROWS_PREFIX.to_string(),
            roles_column_label: DEFAULT_ROLES_COLUMN_LABEL.to_string(),
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取失败行文件名前缀
    ///
    /// # 默认值
    /// - "FEHLER_"
    ///
    /// # 用途
    /// - 失败行文件名: <prefix><role>_SAU.csv
    async fn get_failed_rows_prefix(&self) -> ImportResult<String>;

    /// 获取角色列表头（再次导入导出文件时剥离）
    ///
    /// # 默认值
    /// - "Rollen"
    async fn get_roles_column_label(&self) -> ImportResult<String>;

    /// 获取角色目录
    ///
    /// # 返回
    /// - 配置中的目录；未配置或格式错误时返回内置默认目录
    async fn get_role_catalog(&self) -> ImportResult<StaticRoleCatalog>;

    /// 读取完整导入配置
    async fn load_import_settings(&self) -> ImportResult<ImportSettings> {
        Ok(ImportSettings {
            failed_rows_prefix: self.get_failed_rows_prefix().await?,
            roles_column_label: self.get_roles_column_label().await?,
        })
    }
}
