// ==========================================
// 导入会话集成测试
// ==========================================
// 测试目标: 导入 → 标记 → 修复 → 提交 的完整流程
// ==========================================


use sau_import::config::ImportSettings;
use sau_import::domain::{Cell, SessionState, NOVALUE};
use sau_import::importer::{ImportError, ImportSession, RowFailureKind};
use sau_import::logging;
use test_helpers::{
    ingested_student_session, student_registry, MockDirectoryService,
    STUDENT_CSV, STUDENT_HEADER,
};

// ==========================================
// 导入与标记
// ==========================================

#[test]
fn test_student_example_flags_missing_email() {
    logging::init_test();

    let session = ingested_student_session();

    assert_eq!(session.state(), SessionState::Previewing);
    assert_eq!(session.row_count(), 2);
    assert_eq!(*session.cell(0, "E-Mail").unwrap(), Cell::Value("max@x.com".to_string()));
    assert_eq!(*session.cell(1, "E-Mail").unwrap(), Cell::Missing);
    assert_eq!(session.preview()[1].cells[2], NOVALUE);
    assert_eq!(session.flagged_row_ids(), vec![1]);
    assert!(!session.can_commit());
}

#[test]
fn test_roles_column_is_stripped_from_every_row() {
    let csv = format!(
        "{},Rollen\nMax,Mustermann,max@x.com,123,CS,3,Student\nAnna,Muster,anna@x.com,456,Math,2,Student",
        STUDENT_HEADER
    );
    let mut session = ImportSession::new(ImportSettings::default());
    session.ingest("Student", &csv, &student_registry()).unwrap();

    assert_eq!(session.header().join(","), STUDENT_HEADER);
    for row in session.rows().values() {
        assert_eq!(row.len(), 6);
        assert!(!row.contains(&Cell::Value("Student".to_string())));
    }
    assert!(session.cell(0, "Rollen").is_none());
    assert!(session.can_commit());
}

#[test]
fn test_roles_column_in_the_middle_is_stripped() {
    let csv = "Vorname,Rollen,Nachname,E-Mail,Matrikelnummer,Studiengang,Fachsemester\n\
               Max,Student,Mustermann,max@x.com,123,CS,3";
    let mut session = ImportSession::new(ImportSettings::default());
    session.ingest("Student", csv, &student_registry()).unwrap();

    assert_eq!(
        *session.cell(0, "Nachname").unwrap(),
        Cell::Value("Mustermann".to_string())
    );
}

#[test]
fn test_configured_roles_column_label() {
    let settings = ImportSettings {
        roles_column_label: "Rolle".to_string(),
        ..ImportSettings::default()
    };
    let csv = format!("{},Rolle\nMax,Mustermann,max@x.com,123,CS,3,Student", STUDENT_HEADER);
    let mut session = ImportSession::new(settings);
    session.ingest("Student", &csv, &student_registry()).unwrap();
    assert_eq!(session.header().len(), 6);
}

#[test]
fn test_incompatible_headers_are_rejected() {
    let registry = student_registry();
    let cases = [
        // 少一列
        "Vorname,Nachname,E-Mail,Matrikelnummer,Studiengang\nMax,M,m@x.com,1,CS".to_string(),
        // 多出非角色列
        format!("{},Notiz\nMax,M,m@x.com,1,CS,3,hi", STUDENT_HEADER),
        // 两个角色列
        format!("{},Rollen,Rollen\nMax,M,m@x.com,1,CS,3,Student,Student", STUDENT_HEADER),
        // 内容不同
        "Vorname,Nachname,Mail-Adresse,Matrikelnummer,Studiengang,Fachsemester\nMax,M,m@x.com,1,CS,3"
            .to_string(),
    ];

    for csv in cases.iter() {
        let mut session = ImportSession::new(ImportSettings::default());
        let err = session.ingest("Student", csv, &registry).unwrap_err();
        assert!(
            matches!(err, ImportError::HeaderIncompatible { .. }),
            "csv={}",
            csv
        );
        assert!(session.rows().is_empty());
        assert_eq!(session.state(), SessionState::Selecting);
    }
}

#[test]
fn test_header_only_file_is_empty() {
    let mut session = ImportSession::new(ImportSettings::default());
    let err = session
        .ingest("Student", &format!("{}\r\n\r\n", STUDENT_HEADER), &student_registry())
        .unwrap_err();
    assert!(matches!(err, ImportError::EmptyFile));
    assert_eq!(session.state(), SessionState::Selecting);
}

#[test]
fn test_header_matching_is_accent_and_case_insensitive() {
    let csv = "\u{feff}\"VORNAME\",nachname,E-Mail (dienstlich),Matrikelnummer,Studiengang,Fachsemester\n\
               Max,Mustermann,max@x.com,123,CS,3";
    let mut session = ImportSession::new(ImportSettings::default());
    session.ingest("Student", csv, &student_registry()).unwrap();
    assert!(session.can_commit());
}

// ==========================================
// 编辑修复
// ==========================================

#[tokio::test]
async fn test_repair_then_commit_succeeds_for_all_rows() {
    let mut session = ingested_student_session();

    session.begin_edit_flagged().unwrap();
    session.edit_cell(1, "E-Mail", "anna@x.com").unwrap();
    assert!(session.save_edits().unwrap());

    assert!(session.flagged_row_ids().is_empty());
    assert!(session.can_commit());

    let directory = MockDirectoryService::new();
    let report = session
        .commit(&directory)
        .await
        .unwrap();

    assert_eq!(report.success_count, 2);
    assert_eq!(report.failed_count, 0);
    assert!(report.failed_export.is_none());
    assert_eq!(directory.calls(), vec!["max@x.com", "anna@x.com"]);
}

#[test]
fn test_save_is_blocked_while_buffer_has_missing_cell() {
    let mut session = ingested_student_session();
    session.begin_edit_flagged().unwrap();
    session.edit_cell(1, "Vorname", "Annalena").unwrap();

    assert!(!session.save_edits().unwrap());
    assert_eq!(session.state(), SessionState::Editing);

    // 清空必填字段会重新标记
    session.edit_cell(1, "E-Mail", "anna@x.com").unwrap();
    session.edit_cell(1, "Matrikelnummer", "").unwrap();
    assert!(!session.save_edits().unwrap());

    session.edit_cell(1, "Matrikelnummer", "456").unwrap();
    assert!(session.save_edits().unwrap());
    assert_eq!(
        *session.cell(1, "Vorname").unwrap(),
        Cell::Value("Annalena".to_string())
    );
}

#[test]
fn test_cancel_discards_buffer() {
    let mut session = ingested_student_session();
    session.select_rows([0, 1]).unwrap();
    session.begin_edit().unwrap();
    session.edit_cell(0, "Studiengang", "Physik").unwrap();
    session.cancel_edits().unwrap();

    assert_eq!(session.state(), SessionState::Previewing);
    assert_eq!(
        *session.cell(0, "Studiengang").unwrap(),
        Cell::Value("CS".to_string())
    );
}

// ==========================================
// 提交
// ==========================================

#[tokio::test]
async fn test_commit_without_repair_reports_failed_row() {
    let mut session = ingested_student_session();
    let directory = MockDirectoryService::new();

    let report = session
        .commit(&directory)
        .await
        .unwrap();

    assert_eq!(report.success_count, 1);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.failures[0].kind, RowFailureKind::MissingRequiredField);

    let export = report.failed_export.unwrap();
    assert_eq!(export.file_name, "FEHLER_Student_SAU.csv");
    let lines: Vec<&str> = export.content.split("\r\n").collect();
    assert_eq!(lines, vec![STUDENT_HEADER, "Anna,Muster,NOVALUE,456,Math,2"]);

    // 未提交的行不会调用目录服务
    assert_eq!(directory.calls(), vec!["max@x.com"]);
    assert_eq!(session.state(), SessionState::Selecting);
    assert!(session.rows().is_empty());
}

#[tokio::test]
async fn test_submission_failures_do_not_abort_batch() {
    let csv = format!(
        "{}\na,A,a@x.com,1,CS,1\nb,B,b@x.com,2,CS,1\nc,C,c@x.com,3,CS,1\nd,D,d@x.com,4,CS,1",
        STUDENT_HEADER
    );
    let mut session = ImportSession::new(ImportSettings::default());
    session.ingest("Student", &csv, &student_registry()).unwrap();

    let directory = MockDirectoryService::failing_on(&["b@x.com", "d@x.com"]);
    let report = session
        .commit(&directory)
        .await
        .unwrap();

    assert_eq!(report.success_count, 2);
    assert_eq!(report.failed_count, 2);
    let failed_ids: Vec<usize> = report.failures.iter().map(|f| f.row_id).collect();
    assert_eq!(failed_ids, vec![1, 3]);

    let content = report.failed_export.unwrap().content;
    assert_eq!(
        content,
        format!("{}\r\nb,B,b@x.com,2,CS,1\r\nd,D,d@x.com,4,CS,1", STUDENT_HEADER)
    );
}

#[tokio::test]
async fn test_commit_submits_sequentially_in_row_order() {
    let mut csv = STUDENT_HEADER.to_string();
    for i in 0..20 {
        csv.push_str(&format!("\nP{i},N{i},p{i}@x.com,{i},CS,1"));
    }
    let mut session = ImportSession::new(ImportSettings::default());
    session.ingest("Student", &csv, &student_registry()).unwrap();

    let directory = MockDirectoryService::new();
    let report = session
        .commit(&directory)
        .await
        .unwrap();

    assert_eq!(report.success_count, 20);
    assert_eq!(directory.max_in_flight(), 1);
    let expected: Vec<String> = (0..20).map(|i| format!("p{i}@x.com")).collect();
    assert_eq!(directory.calls(), expected);
}

#[tokio::test]
async fn test_summary_message_mentions_counts() {
    sau_import::i18n::set_locale("en");
    let mut session = ingested_student_session();
    let report = session
        .commit(&MockDirectoryService::new())
        .await
        .unwrap();
    let msg = report.summary_message();
    assert!(msg.contains('1'));
    sau_import::i18n::set_locale("zh-CN");
}

// ==========================================
// 往返
// ==========================================

#[test]
fn test_export_then_reimport_round_trip() {
    let csv = format!(
        "{}\nMax,Mustermann,max@x.com,123,CS,3\nAnna,Muster,anna@x.com,456,Math,2\nÖzlem,Şahin,oz@x.com,789,Bio,5",
        STUDENT_HEADER
    );
    let registry = student_registry();
    let mut session = ImportSession::new(ImportSettings::default());
    session.ingest("Student", &csv, &registry).unwrap();
    let original: Vec<Vec<String>> = session.preview().into_iter().map(|r| r.cells).collect();

    for include_roles_column in [false, true] {
        let export = session.export_csv(include_roles_column).unwrap();

        let mut reimported = ImportSession::new(ImportSettings::default());
        reimported.ingest("Student", &export.content, &registry).unwrap();

        assert_eq!(reimported.row_count(), 3);
        assert_eq!(reimported.missing_cell_count(), 0);
        let values: Vec<Vec<String>> =
            reimported.preview().into_iter().map(|r| r.cells).collect();
        assert_eq!(values, original);
    }
}

#[tokio::test]
async fn test_failed_rows_file_reimports_sentinel_as_literal_text() {
    // 失败行文件中的 NOVALUE 是普通文本，再次导入时不会被视为缺失
    let mut session = ingested_student_session();
    let report = session
        .commit(&MockDirectoryService::new())
        .await
        .unwrap();
    let failed = report.failed_export.unwrap();

    let mut reimported = ImportSession::new(ImportSettings::default());
    reimported
        .ingest("Student", &failed.content, &student_registry())
        .unwrap();

    assert_eq!(reimported.row_count(), 1);
    assert_eq!(
        *reimported.cell(0, "E-Mail").unwrap(),
        Cell::Value(NOVALUE.to_string())
    );
    assert_eq!(reimported.missing_cell_count(), 0);
    assert!(reimported.can_commit());
}

#[test]
fn test_csv_fixture_matches_header_constant() {
    assert!(STUDENT_CSV.starts_with(STUDENT_HEADER));
}
