// ==========================================
// 人员目录批量导入 - 导入会话状态机
// ==========================================
// 职责: 持有单个导入会话，负责导入 → 标记 → 编辑修复 → 提交
// 状态: Selecting → Previewing ⇄ Editing；Back/提交/重置后回到 Selecting
// 红线: 会话只由本模块的转换方法修改；提交严格顺序执行（逐行 await）
// ==========================================

use crate::config::import_config_trait::ImportSettings;
use crate::domain::schema::Schema;
use crate::domain::types::{Cell, CsvRow, RowId, SessionState};
use crate::i18n::t_with_args;
use crate::importer::csv_codec::{self, HeaderMatch};
use crate::importer::error::{ImportError, ImportResult, RowFailure, RowFailureKind};
use crate::importer::record_assembler::assemble_with_schema;
use crate::importer::schema_registry::SchemaRegistry;
use crate::repository::directory_repo::DirectoryService;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 输出类型
// ==========================================

/// 供下载的 CSV 文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvDownload {
    pub file_name: String,
    pub content: String,
}

/// 提交结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub success_count: usize,
    pub failed_count: usize,
    pub failures: Vec<RowFailure>,
    /// 仅当存在失败行时生成
    pub failed_export: Option<CsvDownload>,
}

impl CommitReport {
    pub fn has_failures(&self) -> bool {
        self.failed_count > 0
    }

    /// 面向操作员的本地化摘要
    pub fn summary_message(&self) -> String {
        let success = self.success_count.to_string();
        if self.has_failures() {
            let failed = self.failed_count.to_string();
            t_with_args(
                "commit.summary_partial",
                &[("success", &success), ("failed", &failed)],
            )
        } else {
            t_with_args("commit.summary_success", &[("success", &success)])
        }
    }
}

/// 预览行（按表头顺序渲染）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRow {
    pub row_id: RowId,
    pub cells: Vec<String>,
    pub flagged: bool,
}

// ==========================================
// ImportSession
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportSession {
    session_id: String,
    settings: ImportSettings,
    state: SessionState,

    // ===== 导入结果 =====
    role: Option<String>,
    schema: Schema,
    header: Vec<String>,
    rows: BTreeMap<RowId, CsvRow>,
    // 与 header 按位置对齐
    required_columns: Vec<bool>,

    // ===== 选择与编辑 =====
    selected_row_ids: BTreeSet<RowId>,
    edit_buffer: Option<BTreeMap<RowId, CsvRow>>,
}

impl ImportSession {
    pub fn new(settings: ImportSettings) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            settings,
            state: SessionState::Selecting,
            role: None,
            schema: Schema::new(),
            header: Vec::new(),
            rows: BTreeMap::new(),
            required_columns: Vec::new(),
            selected_row_ids: BTreeSet::new(),
            edit_buffer: None,
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &BTreeMap<RowId, CsvRow> {
        &self.rows
    }

    pub fn row(&self, row_id: RowId) -> Option<&CsvRow> {
        self.rows.get(&row_id)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 指定列是否必填
    pub fn is_required_at(&self, column: usize) -> bool {
        self.required_columns.get(column).copied().unwrap_or(false)
    }

    /// 按表头文本取单元格（同名列取第一列）
    pub fn cell(&self, row_id: RowId, label: &str) -> Option<&Cell> {
        let column = self.column_index(label)?;
        self.rows.get(&row_id).and_then(|row| row.get(column))
    }

    pub fn selected_row_ids(&self) -> &BTreeSet<RowId> {
        &self.selected_row_ids
    }

    pub fn edit_buffer(&self) -> Option<&BTreeMap<RowId, CsvRow>> {
        self.edit_buffer.as_ref()
    }

    /// 含有必填缺失单元格的行
    pub fn flagged_row_ids(&self) -> Vec<RowId> {
        self.rows
            .iter()
            .filter(|(_, row)| self.row_has_missing(row))
            .map(|(id, _)| *id)
            .collect()
    }

    /// 必填缺失单元格总数
    pub fn missing_cell_count(&self) -> usize {
        self.rows
            .values()
            .map(|row| {
                row.iter()
                    .zip(&self.required_columns)
                    .filter(|(cell, required)| **required && cell.is_missing())
                    .count()
            })
            .sum()
    }

    /// 预览数据（表头顺序）
    pub fn preview(&self) -> Vec<PreviewRow> {
        self.rows
            .iter()
            .map(|(id, row)| PreviewRow {
                row_id: *id,
                cells: self.row_values(row),
                flagged: self.row_has_missing(row),
            })
            .collect()
    }

    /// 提交闸门: 仅在 Previewing 且全部必填单元格已修复时为 true
    pub fn can_commit(&self) -> bool {
        self.state == SessionState::Previewing
            && !self.rows.is_empty()
            && self.flagged_row_ids().is_empty()
    }

    // ==========================================
    // Selecting → Previewing
    // ==========================================

    /// 导入 CSV 文本
    ///
    /// # 错误
    /// - EmptyFile: 没有数据行
    /// - HeaderIncompatible: 表头与角色 Schema 不兼容
    ///
    /// 以上两种情况会话保持 Selecting，且不建立任何行
    #[instrument(skip(self, text, registry), fields(session_id = %self.session_id))]
    pub fn ingest(&mut self, role: &str, text: &str, registry: &SchemaRegistry) -> ImportResult<()> {
        self.ensure_state(SessionState::Selecting, "ingest")?;

        let mut lines = csv_codec::parse(text)?;
        if lines.len() < 2 {
            warn!(role = %role, "文件没有数据行");
            return Err(ImportError::EmptyFile);
        }
        let mut header = lines.remove(0);
        let schema = registry.resolve_schema(role);

        match csv_codec::header_matches(&header, &schema, &self.settings.roles_column_label) {
            HeaderMatch::Exact => {}
            HeaderMatch::HasRolesColumn(idx) => {
                debug!(column = idx, "剥离角色列");
                csv_codec::strip_column(&mut header, idx);
                for line in lines.iter_mut() {
                    csv_codec::strip_column(line, idx);
                }
            }
            HeaderMatch::Mismatch => {
                warn!(role = %role, header = ?header, "表头不兼容");
                return Err(ImportError::HeaderIncompatible {
                    role: role.to_string(),
                    expected: schema.labels().join(","),
                    actual: header.join(","),
                });
            }
        }

        let required_columns: Vec<bool> =
            (0..header.len()).map(|idx| schema.is_required_at(idx)).collect();

        let mut rows = BTreeMap::new();
        for (row_id, line) in lines.iter().enumerate() {
            let row: CsvRow = required_columns
                .iter()
                .enumerate()
                .map(|(idx, required)| {
                    let raw = line.get(idx).map(String::as_str).unwrap_or("");
                    if *required && raw.trim().is_empty() {
                        Cell::Missing
                    } else {
                        Cell::from_input(raw)
                    }
                })
                .collect();
            rows.insert(row_id, row);
        }

        self.role = Some(role.to_string());
        self.schema = schema;
        self.header = header;
        self.rows = rows;
        self.required_columns = required_columns;
        self.selected_row_ids.clear();
        self.state = SessionState::Previewing;

        info!(
            role = %role,
            rows = self.rows.len(),
            flagged_rows = self.flagged_row_ids().len(),
            missing_cells = self.missing_cell_count(),
            "导入完成，进入预览"
        );
        Ok(())
    }

    /// 读取上传文件并导入
    pub async fn ingest_file<P: AsRef<Path>>(
        &mut self,
        role: &str,
        file_path: P,
        registry: &SchemaRegistry,
    ) -> ImportResult<()> {
        self.ensure_state(SessionState::Selecting, "ingest")?;
        let text = csv_codec::read_upload(file_path).await?;
        self.ingest(role, &text, registry)
    }

    // ==========================================
    // Previewing: 选择
    // ==========================================

    /// 替换当前选择
    pub fn select_rows<I>(&mut self, row_ids: I) -> ImportResult<()>
    where
        I: IntoIterator<Item = RowId>,
    {
        self.ensure_state(SessionState::Previewing, "select_rows")?;

        let mut selected = BTreeSet::new();
        for row_id in row_ids {
            if !self.rows.contains_key(&row_id) {
                return Err(ImportError::UnknownRow(row_id));
            }
            selected.insert(row_id);
        }
        self.selected_row_ids = selected;
        Ok(())
    }

    /// 切换单行选择，返回切换后是否选中
    pub fn toggle_row(&mut self, row_id: RowId) -> ImportResult<bool> {
        self.ensure_state(SessionState::Previewing, "toggle_row")?;
        if !self.rows.contains_key(&row_id) {
            return Err(ImportError::UnknownRow(row_id));
        }

        if self.selected_row_ids.remove(&row_id) {
            Ok(false)
        } else {
            self.selected_row_ids.insert(row_id);
            Ok(true)
        }
    }

    pub fn clear_selection(&mut self) -> ImportResult<()> {
        self.ensure_state(SessionState::Previewing, "clear_selection")?;
        self.selected_row_ids.clear();
        Ok(())
    }

    // ==========================================
    // Previewing → Editing
    // ==========================================

    /// 将已选行复制到编辑缓冲区
    pub fn begin_edit(&mut self) -> ImportResult<()> {
        self.ensure_state(SessionState::Previewing, "begin_edit")?;
        if self.selected_row_ids.is_empty() {
            return Err(ImportError::NoRowsSelected);
        }

        let buffer: BTreeMap<RowId, CsvRow> = self
            .selected_row_ids
            .iter()
            .filter_map(|id| self.rows.get(id).map(|row| (*id, row.clone())))
            .collect();

        debug!(rows = buffer.len(), "进入编辑");
        self.edit_buffer = Some(buffer);
        self.state = SessionState::Editing;
        Ok(())
    }

    /// 选中全部标记行并进入编辑
    pub fn begin_edit_flagged(&mut self) -> ImportResult<()> {
        self.ensure_state(SessionState::Previewing, "begin_edit_flagged")?;
        let flagged = self.flagged_row_ids();
        // 无标记行时保留当前选择
        if flagged.is_empty() {
            return Err(ImportError::NoRowsSelected);
        }
        self.select_rows(flagged)?;
        self.begin_edit()
    }

    // ==========================================
    // Editing
    // ==========================================

    /// 按表头文本修改缓冲区中的单元格（同名列取第一列，其余用 edit_cell_at）
    pub fn edit_cell(&mut self, row_id: RowId, label: &str, value: &str) -> ImportResult<()> {
        self.ensure_state(SessionState::Editing, "edit_cell")?;
        let column = self
            .column_index(label)
            .ok_or_else(|| ImportError::UnknownColumn(label.to_string()))?;
        self.edit_cell_at(row_id, column, value)
    }

    /// 按列位置修改缓冲区中的单元格
    ///
    /// 必填列写入空值时重新标记为缺失
    pub fn edit_cell_at(&mut self, row_id: RowId, column: usize, value: &str) -> ImportResult<()> {
        self.ensure_state(SessionState::Editing, "edit_cell")?;
        if column >= self.header.len() {
            return Err(ImportError::UnknownColumn(column.to_string()));
        }

        let required = self.is_required_at(column);
        let row = self
            .edit_buffer
            .as_mut()
            .and_then(|buffer| buffer.get_mut(&row_id))
            .ok_or(ImportError::UnknownRow(row_id))?;

        row[column] = if required && value.trim().is_empty() {
            Cell::Missing
        } else {
            Cell::from_input(value)
        };
        Ok(())
    }

    /// 缓冲区内是否仍有必填缺失
    pub fn buffer_has_missing(&self) -> bool {
        self.edit_buffer
            .as_ref()
            .map_or(false, |buffer| buffer.values().any(|row| self.row_has_missing(row)))
    }

    /// 保存编辑
    ///
    /// # 返回
    /// - Ok(true): 已合并，回到 Previewing
    /// - Ok(false): 缓冲区仍有必填缺失，保持 Editing
    pub fn save_edits(&mut self) -> ImportResult<bool> {
        self.ensure_state(SessionState::Editing, "save_edits")?;
        if self.buffer_has_missing() {
            debug!("缓冲区仍有必填缺失，保存被阻止");
            return Ok(false);
        }

        if let Some(buffer) = self.edit_buffer.take() {
            debug!(rows = buffer.len(), "合并编辑缓冲区");
            self.rows.extend(buffer);
        }
        self.selected_row_ids.clear();
        self.state = SessionState::Previewing;
        Ok(true)
    }

    /// 放弃编辑
    pub fn cancel_edits(&mut self) -> ImportResult<()> {
        self.ensure_state(SessionState::Editing, "cancel_edits")?;
        self.edit_buffer = None;
        self.state = SessionState::Previewing;
        Ok(())
    }

    // ==========================================
    // 返回/重置/导出
    // ==========================================

    /// Previewing → Selecting，丢弃已导入数据
    pub fn back(&mut self) -> ImportResult<()> {
        self.ensure_state(SessionState::Previewing, "back")?;
        self.reset();
        Ok(())
    }

    /// 整体替换为新会话（保留配置）
    pub fn reset(&mut self) {
        *self = Self::new(self.settings.clone());
    }

    /// 导出当前行（可附加角色列，用于再次导入）
    pub fn export_csv(&self, include_roles_column: bool) -> ImportResult<CsvDownload> {
        self.ensure_state(SessionState::Previewing, "export_csv")?;
        let role = self.current_role()?;

        let mut header = self.header.clone();
        if include_roles_column {
            header.push(self.settings.roles_column_label.clone());
        }

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(header);
        for row in self.rows.values() {
            let mut values = self.row_values(row);
            if include_roles_column {
                values.push(role.to_string());
            }
            lines.push(values);
        }

        Ok(CsvDownload {
            file_name: csv_codec::template_file_name(role),
            content: csv_codec::serialize(&lines)?,
        })
    }

    // ==========================================
    // Previewing → Selecting (提交)
    // ==========================================

    /// 提交全部行（逐行顺序提交）
    ///
    /// 不可提交的行、组装失败与提交失败的行原样进入失败文件；
    /// 无论结果如何，会话都会被重置
    #[instrument(skip(self, directory), fields(session_id = %self.session_id))]
    pub async fn commit(&mut self, directory: &dyn DirectoryService) -> ImportResult<CommitReport> {
        self.ensure_state(SessionState::Previewing, "commit")?;
        let role = self.current_role()?.to_string();

        if !self.can_commit() {
            warn!(
                flagged_rows = self.flagged_row_ids().len(),
                "仍有必填缺失，未修复的行将计入失败"
            );
        }

        let mut success_count = 0usize;
        let mut failures = Vec::new();
        let mut failed_lines = Vec::new();

        for (row_id, row) in &self.rows {
            let values = self.row_values(row);

            let outcome = if self.row_is_committable(row) {
                // 使用导入时匹配表头的 Schema，保证值与 label 对齐
                match assemble_with_schema(&values, &role, &self.schema) {
                    Some(record) => match directory.create_record(&record).await {
                        Ok(stored) => {
                            debug!(row_id = row_id, person_id = %stored.person_id, "行提交成功");
                            Ok(())
                        }
                        Err(e) => Err(RowFailureKind::SubmissionFailure(e.to_string())),
                    },
                    None => Err(RowFailureKind::AssemblyValidationFailure),
                }
            } else {
                Err(RowFailureKind::MissingRequiredField)
            };

            match outcome {
                Ok(()) => success_count += 1,
                Err(kind) => {
                    warn!(row_id = row_id, reason = %kind, "行提交失败");
                    failures.push(RowFailure {
                        row_id: *row_id,
                        kind,
                    });
                    failed_lines.push(values);
                }
            }
        }

        let failed_export = if failed_lines.is_empty() {
            Ok(None)
        } else {
            let mut lines = Vec::with_capacity(failed_lines.len() + 1);
            lines.push(self.header.clone());
            lines.extend(failed_lines);
            csv_codec::serialize(&lines).map(|content| {
                Some(CsvDownload {
                    file_name: csv_codec::failed_rows_file_name(
                        &self.settings.failed_rows_prefix,
                        &role,
                    ),
                    content,
                })
            })
        };

        self.reset();

        let report = CommitReport {
            success_count,
            failed_count: failures.len(),
            failures,
            failed_export: failed_export?,
        };
        info!(
            role = %role,
            success = report.success_count,
            failed = report.failed_count,
            "提交完成"
        );
        Ok(report)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn ensure_state(&self, expected: SessionState, action: &'static str) -> ImportResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ImportError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    fn current_role(&self) -> ImportResult<&str> {
        self.role
            .as_deref()
            .ok_or_else(|| ImportError::InternalError("会话未绑定角色".to_string()))
    }

    fn column_index(&self, label: &str) -> Option<usize> {
        self.header.iter().position(|h| h == label)
    }

    /// 表头顺序的单元格文本（缺失 → NOVALUE）
    fn row_values(&self, row: &CsvRow) -> Vec<String> {
        (0..self.header.len())
            .map(|idx| row.get(idx).map(|c| c.as_str().to_string()).unwrap_or_default())
            .collect()
    }

    fn row_has_missing(&self, row: &CsvRow) -> bool {
        self.required_columns
            .iter()
            .enumerate()
            .any(|(idx, required)| *required && row.get(idx).map_or(true, Cell::is_missing))
    }

    fn row_is_committable(&self, row: &CsvRow) -> bool {
        self.required_columns
            .iter()
            .enumerate()
            .all(|(idx, required)| !*required || row.get(idx).map_or(false, |c| !c.is_blank()))
    }
}
