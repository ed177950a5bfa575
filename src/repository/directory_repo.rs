// ==========================================
// 人员目录批量导入 - 目录服务 Trait
// ==========================================
// 职责: 定义 create-record 接口（不包含实现）
// 红线: 每次调用只返回成功或失败，不存在单次调用内的部分成功
// ==========================================

use crate::domain::person::PersonRecord;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// StoredPerson - 目录中已创建的人员
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPerson {
    pub person_id: String,
    pub record: PersonRecord,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// DirectoryService Trait
// ==========================================
// 用途: 提交阶段逐行调用（顺序执行）
// 实现者: SqliteDirectoryRepository；测试中为内存实现
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// 创建人员记录
    ///
    /// # 返回
    /// - Ok(StoredPerson): 创建成功
    /// - Err: 创建失败（如邮箱已存在），调用方计入失败行
    async fn create_record(&self, record: &PersonRecord) -> RepositoryResult<StoredPerson>;
}
