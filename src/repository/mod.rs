// ==========================================
// 人员目录批量导入 - 数据仓储层
// ==========================================
// 职责: 目录服务接口与本地 SQLite 实现
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod directory_repo;
pub mod directory_repo_impl;
pub mod error;

// 重导出核心仓储
pub use directory_repo::{DirectoryService, StoredPerson};
pub use directory_repo_impl::SqliteDirectoryRepository;
pub use error::{RepositoryError, RepositoryResult};
