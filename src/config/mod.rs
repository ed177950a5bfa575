// ==========================================
// 人员目录批量导入 - 配置层
// ==========================================
// 职责: 导入配置与角色目录
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod role_catalog;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{
    ImportConfigReader, ImportSettings, DEFAULT_FAILED_ROWS_PREFIX, DEFAULT_ROLES_COLUMN_LABEL,
};
pub use role_catalog::{RoleCatalog, RoleDefinition, StaticRoleCatalog};
