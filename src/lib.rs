// ==========================================
// 人员目录批量导入 (SAU Import) - 核心库
// ==========================================
// 职责: 按角色导入人员 CSV，标记缺失必填字段，
//       人工修复后逐行提交到目录服务
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 字段/Schema/会话类型
pub mod domain;

// 数据仓储层 - 目录服务
pub mod repository;

// 导入层 - 核心流程
pub mod importer;

// 配置层 - 导入配置与角色目录
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{Cell, FieldDefinition, FieldType, PersonRecord, Schema, SessionState, NOVALUE};

// 配置
pub use config::{ConfigManager, ImportConfigReader, ImportSettings, RoleCatalog, StaticRoleCatalog};

// 导入
pub use importer::{
    canonicalize, CommitReport, CsvDownload, ImportError, ImportResult, ImportSession,
    RecordAssembler, SchemaRegistry,
};

// 仓储
pub use repository::{DirectoryService, SqliteDirectoryRepository};

// ==========================================
// 系统常量
// ==========================================

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "SAU 人员批量导入";
