// ==========================================
// 人员目录批量导入 - 命令行入口
// ==========================================
// 用法:
//   sau-import roles [db_path]
//   sau-import template <role> [db_path]
//   sau-import import <role> <file.csv> [db_path]
// ==========================================

use anyhow::{bail, Context};
use sau_import::config::{ConfigManager, ImportConfigReader};
use sau_import::db::default_db_path;
use sau_import::i18n::{set_locale, t_with_args};
use sau_import::importer::{csv_codec, ImportSession, SchemaRegistry};
use sau_import::repository::SqliteDirectoryRepository;
use std::path::Path;
use std::sync::Arc;

const USAGE: &str = "用法:
  sau-import roles [db_path]
  sau-import template <role> [db_path]
  sau-import import <role> <file.csv> [db_path]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sau_import::logging::init();

    if let Ok(locale) = std::env::var("SAU_IMPORT_LOCALE") {
        set_locale(locale.trim());
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let db_arg = |idx: usize| args.get(idx).cloned().unwrap_or_else(default_db_path);

    match args.first().map(String::as_str) {
        Some("roles") => list_roles(&db_arg(1)).await,
        Some("template") => {
            let role = args.get(1).context(USAGE)?;
            write_template(role, &db_arg(2)).await
        }
        Some("import") => {
            let (role, file) = match (args.get(1), args.get(2)) {
                (Some(role), Some(file)) => (role, file),
                _ => bail!(USAGE),
            };
            run_import(role, Path::new(file), &db_arg(3)).await
        }
        _ => {
            eprintln!("{}", USAGE);
            Ok(())
        }
    }
}

async fn load_registry(config: &ConfigManager) -> anyhow::Result<Arc<SchemaRegistry>> {
    let catalog = config.get_role_catalog().await?;
    Ok(Arc::new(SchemaRegistry::new(Arc::new(catalog))))
}

async fn list_roles(db_path: &str) -> anyhow::Result<()> {
    let config = ConfigManager::new(db_path)?;
    let registry = load_registry(&config).await?;
    for role in registry.roles() {
        println!("{}: {}", role, registry.expected_header(&role).join(", "));
    }
    Ok(())
}

async fn write_template(role: &str, db_path: &str) -> anyhow::Result<()> {
    let config = ConfigManager::new(db_path)?;
    let registry = load_registry(&config).await?;
    if !registry.is_known_role(role) {
        bail!("未知角色: {}", role);
    }

    let file_name = csv_codec::template_file_name(role);
    let content = csv_codec::template_csv(&registry.resolve_schema(role))?;
    tokio::fs::write(&file_name, content)
        .await
        .with_context(|| format!("写入模板失败: {}", file_name))?;
    println!("{}", file_name);
    Ok(())
}

async fn run_import(role: &str, file: &Path, db_path: &str) -> anyhow::Result<()> {
    let config = ConfigManager::new(db_path)?;
    let settings = config.load_import_settings().await?;
    let registry = load_registry(&config).await?;
    let directory = SqliteDirectoryRepository::new(db_path)?;

    let mut session = ImportSession::new(settings);
    if let Err(e) = session.ingest_file(role, file, &registry).await {
        bail!(e.operator_message());
    }

    println!("{}", session.header().join(" | "));
    for row in session.preview() {
        let marker = if row.flagged { "!" } else { " " };
        println!("{} {:>4}  {}", marker, row.row_id + 1, row.cells.join(" | "));
    }
    println!(
        "{}",
        t_with_args(
            "import.preview",
            &[
                ("rows", &session.row_count().to_string()),
                ("flagged", &session.flagged_row_ids().len().to_string()),
            ],
        )
    );

    let report = session.commit(&directory).await?;
    println!("{}", report.summary_message());

    if let Some(export) = report.failed_export {
        let target = file
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&export.file_name);
        tokio::fs::write(&target, export.content)
            .await
            .with_context(|| format!("写入失败行文件失败: {}", target.display()))?;
        let path = target.display().to_string();
        println!(
            "{}",
            t_with_args("commit.failed_file_written", &[("path", &path)])
        );
    }
    Ok(())
}
