// ==========================================
// 人员目录批量导入 - 本地目录 Repository 实现
// ==========================================
// 职责: 实现 DirectoryService（使用 rusqlite）
// 约束: email 唯一（目录库自身规则，重复时 create_record 失败）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::person::PersonRecord;
use crate::repository::directory_repo::{DirectoryService, StoredPerson};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

// ==========================================
// SqliteDirectoryRepository
// ==========================================
pub struct SqliteDirectoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDirectoryRepository {
    /// 创建新的 Repository 实例（建表幂等）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn insert_person(&self, record: &PersonRecord) -> RepositoryResult<StoredPerson> {
        let person_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let roles_json = serde_json::to_string(&record.roles)?;
        let payload_json = serde_json::to_string(record)?;

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO person (
                person_id, email, first_name, last_name, roles_json, payload_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                person_id,
                record.email,
                record.first_name,
                record.last_name,
                roles_json,
                payload_json,
                created_at,
            ],
        )?;

        Ok(StoredPerson {
            person_id,
            record: record.clone(),
            created_at,
        })
    }

    /// 按邮箱查询
    pub fn find_by_email(&self, email: &str) -> RepositoryResult<Option<StoredPerson>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT person_id, payload_json, created_at FROM person WHERE email = ?1",
                params![email],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, DateTime<Utc>>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((person_id, payload_json, created_at)) => Ok(Some(StoredPerson {
                person_id,
                record: serde_json::from_str(&payload_json)?,
                created_at,
            })),
            None => Ok(None),
        }
    }

    /// 人员总数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM person", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// 全部人员（按创建时间）
    pub fn list_all(&self) -> RepositoryResult<Vec<StoredPerson>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT person_id, payload_json, created_at FROM person ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, DateTime<Utc>>(2)?,
            ))
        })?;

        let mut people = Vec::new();
        for row in rows {
            let (person_id, payload_json, created_at) = row?;
            people.push(StoredPerson {
                person_id,
                record: serde_json::from_str(&payload_json)?,
                created_at,
            });
        }
        Ok(people)
    }
}

#[async_trait]
impl DirectoryService for SqliteDirectoryRepository {
    async fn create_record(&self, record: &PersonRecord) -> RepositoryResult<StoredPerson> {
        let stored = self.insert_person(record)?;
        tracing::debug!(person_id = %stored.person_id, email = %record.email, "人员记录已创建");
        Ok(stored)
    }
}
