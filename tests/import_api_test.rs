// ==========================================
// ImportApi 端到端测试
// ==========================================
// 测试目标: 本地文件 / 上传流 / 拒收映射 / 批次查询
// ==========================================


use membership_registry::api::{ApiError, ImportApi};
use membership_registry::domain::{ImportErrorType, ImportRunState};
use membership_registry::importer::ImportOptions;
use test_helpers::{create_seeded_db, write_csv};

#[tokio::test]
async fn test_import_file_through_api() {
    let (_db, db_path, org) = create_seeded_db().unwrap();
    let api = ImportApi::new(db_path);

    let csv = write_csv(
        "NAME,UNIT,DEPARTMENT\n\
         Jane Doe,UnitA,Finance\n\
         Nobody Here,UnitA,Finance\n",
    );
    let response = api
        .import_exco_file(csv.path().to_str().unwrap(), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(response.state, ImportRunState::Persisted);
    assert_eq!(response.successful_imports, 1);
    assert_eq!(response.failed_imports, 1);
    assert_eq!(response.errors_by_type.get("MemberNotFound"), Some(&1));
    assert!(!response.errors_truncated);

    let batches = api.list_import_batches(5).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].batch_id, response.batch_id);

    let assignments = api.list_member_assignments(org.jane_id).await.unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].level_department_id, org.finance_unit_a_ld);
}

#[tokio::test]
async fn test_rejected_file_maps_to_bad_request() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let api = ImportApi::new(db_path);

    let csv = write_csv("");
    let err = api
        .import_exco_file(csv.path().to_str().unwrap(), &ImportOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_bad_request());
    match err {
        ApiError::ImportRejected { errors, .. } => {
            assert_eq!(errors[0].error_type, ImportErrorType::EmptyFile);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_file_is_invalid_input() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let api = ImportApi::new(db_path);

    let err = api
        .import_exco_file("/nonexistent/exco.csv", &ImportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = api
        .import_exco_file("  ", &ImportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_upload_stream_is_staged_and_imported() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let api = ImportApi::new(db_path);

    let body = "NAME,UNIT,DEPARTMENT\nJane Doe,UnitA,Finance\nJohn Roe,UnitB,Welfare\n";
    let response = api
        .import_exco_upload(body.as_bytes(), Some("upload.csv"), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(response.successful_imports, 2);

    let batches = api.list_import_batches(5).await.unwrap();
    assert_eq!(batches[0].file_name.as_deref(), Some("upload.csv"));
}

#[tokio::test]
async fn test_empty_upload_rejected() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let api = ImportApi::new(db_path);

    let err = api
        .import_exco_upload(&b""[..], Some("empty.csv"), &ImportOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::ImportRejected { .. }));
}

#[tokio::test]
async fn test_invalid_batch_limit() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let api = ImportApi::new(db_path);

    assert!(matches!(
        api.list_import_batches(0).await,
        Err(ApiError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_upload_from_blocking_file_reader() {
    let (_db, db_path, org) = create_seeded_db().unwrap();
    let api = ImportApi::new(db_path);

    let source = write_csv("NAME,UNIT,DEPARTMENT\nJohn Roe,UnitB,Welfare\n");
    let reader = std::fs::File::open(source.path()).unwrap();
    let response = api
        .import_exco_upload(reader, Some("from-disk.csv"), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(response.state, ImportRunState::Persisted);
    assert_eq!(response.successful_imports, 1);

    let assignments = api.list_member_assignments(org.john_id).await.unwrap();
    assert_eq!(assignments[0].level_department_id, org.welfare_unit_b_ld);
}
