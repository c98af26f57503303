// ==========================================
// 文件结构校验集成测试
// ==========================================
// 测试目标: 空文件 / 超限 / 表头 / 编码 / 数据错位
// 任一 Error 级结构问题 → Rejected，不处理任何数据行，不写库
// ==========================================


use membership_registry::config::{config_keys, ConfigManager};
use membership_registry::domain::{ErrorSeverity, ImportErrorType, ImportRunState, Member};
use membership_registry::importer::{ExcoImporter, ImportOptions};
use membership_registry::repository::{
    MembershipRepository, MembershipRepositoryImpl, OrganizationRepository,
};
use test_helpers::{create_seeded_db, create_test_importer, write_csv, write_csv_bytes};

#[tokio::test]
async fn test_zero_byte_file_rejected() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let importer = create_test_importer(&db_path);

    let csv = write_csv_bytes(&[]);
    let result = importer
        .import_from_csv(csv.path(), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(result.state, ImportRunState::Rejected);
    assert_eq!(result.total_records, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].error_type, ImportErrorType::EmptyFile);
    assert_eq!(result.errors[0].row_number, 0);

    let repo = MembershipRepositoryImpl::new(&db_path).unwrap();
    assert!(repo.list_import_batches(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_file_rejected() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    ConfigManager::new(&db_path)
        .unwrap()
        .set_global_config_value(config_keys::MAX_FILE_SIZE_BYTES, "32")
        .unwrap();
    let importer = create_test_importer(&db_path);

    let csv = write_csv("NAME,UNIT,DEPARTMENT\nJane Doe,UnitA,Finance\n");
    let result = importer
        .import_from_csv(csv.path(), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(result.state, ImportRunState::Rejected);
    assert_eq!(result.errors[0].error_type, ImportErrorType::FileSizeExceeded);
}

#[tokio::test]
async fn test_missing_required_column_rejected() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let importer = create_test_importer(&db_path);

    let csv = write_csv("NAME,UNIT,ROLE\nJane Doe,UnitA,Finance\n");
    let result = importer
        .import_from_csv(csv.path(), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(result.state, ImportRunState::Rejected);
    assert_eq!(result.total_records, 0);
    let err = &result.errors[0];
    assert_eq!(err.error_type, ImportErrorType::HeaderValidationFailed);
    assert_eq!(err.severity, ErrorSeverity::Error);
    assert!(err.detailed_message.contains("DEPARTMENT"));
}

#[tokio::test]
async fn test_blank_header_rejected() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let importer = create_test_importer(&db_path);

    let csv = write_csv(" , , \nJane Doe,UnitA,Finance\n");
    let result = importer
        .import_from_csv(csv.path(), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(result.state, ImportRunState::Rejected);
    assert_eq!(
        result.errors[0].error_type,
        ImportErrorType::HeaderValidationFailed
    );
}

#[tokio::test]
async fn test_unknown_columns_warn_and_continue() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let importer = create_test_importer(&db_path);

    let csv = write_csv(
        "Name,Unit,Department,Remarks,mkan_id\n\
         Jane Doe,UnitA,Finance,treasurer,MK-001\n",
    );
    let result = importer
        .import_from_csv(csv.path(), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(result.state, ImportRunState::Persisted);
    assert_eq!(result.successful_imports, 1);
    assert_eq!(result.failed_imports, 0);
    assert_eq!(result.warning_count(), 1);
    assert_eq!(
        result.errors[0].error_type,
        ImportErrorType::HeaderValidationFailed
    );
    assert_eq!(result.errors[0].severity, ErrorSeverity::Warning);
}

#[tokio::test]
async fn test_utf8_bom_accepted_silently() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let importer = create_test_importer(&db_path);

    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(b"NAME,UNIT,DEPARTMENT\nJane Doe,UnitA,Finance\n");
    let csv = write_csv_bytes(&bytes);

    let result = importer
        .import_from_csv(csv.path(), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(result.successful_imports, 1);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_utf16_file_imports_with_warning() {
    let (_db, db_path, org) = create_seeded_db().unwrap();
    let importer = create_test_importer(&db_path);

    let mut bytes = vec![0xFF, 0xFE];
    for unit in "NAME,UNIT,DEPARTMENT\r\nJane Doe,UnitA,Finance\r\n".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let csv = write_csv_bytes(&bytes);

    let result = importer
        .import_from_csv(csv.path(), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(result.state, ImportRunState::Persisted);
    assert_eq!(result.total_records, 1);
    assert_eq!(result.successful_imports, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].error_type, ImportErrorType::UnicodeEncodingError);
    assert_eq!(result.errors[0].severity, ErrorSeverity::Warning);
    assert_eq!(result.imported_assignments[0].member_id, org.jane_id);
}

#[tokio::test]
async fn test_windows_1252_names_match_stored_members() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let org_repo = OrganizationRepository::new(&db_path).unwrap();
    let unit_a = org_repo
        .list_units()
        .unwrap()
        .into_iter()
        .find(|u| u.name == "UnitA")
        .unwrap();
    let jose = org_repo
        .create_member(&Member {
            member_id: 0,
            first_name: "José".to_string(),
            last_name: "Doe".to_string(),
            unit_id: unit_a.unit_id,
            email: None,
            phone: None,
            mkan_id: None,
        })
        .unwrap();
    let importer = create_test_importer(&db_path);

    // Latin-1 / Windows-1252 编码的 "José"
    let csv = write_csv_bytes(
        b"NAME,UNIT,DEPARTMENT\nJos\xe9 Doe,UnitA,Finance\nJane Doe,UnitA,Finance\n",
    );
    let result = importer
        .import_from_csv(csv.path(), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(result.state, ImportRunState::Persisted);
    assert_eq!(result.total_records, 2);
    assert_eq!(result.successful_imports, 2);
    assert_eq!(result.failed_imports, 0);
    assert_eq!(result.errors_of(ImportErrorType::UnicodeEncodingError).len(), 1);
    assert!(result
        .imported_assignments
        .iter()
        .any(|a| a.member_id == jose.member_id));
}

#[tokio::test]
async fn test_overflow_fields_reject_file() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let importer = create_test_importer(&db_path);

    let csv = write_csv(
        "NAME,UNIT,DEPARTMENT\n\
         Jane Doe,UnitA,Finance\n\
         Doe, Jane,UnitA,Finance\n",
    );
    let result = importer
        .import_from_csv(csv.path(), &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(result.state, ImportRunState::Rejected);
    assert_eq!(result.total_records, 0);
    assert_eq!(result.errors[0].error_type, ImportErrorType::MalformedData);
    assert_eq!(result.errors[0].row_number, 3);

    let repo = MembershipRepositoryImpl::new(&db_path).unwrap();
    assert_eq!(repo.count_assignments().await.unwrap(), 0);
}

#[tokio::test]
async fn test_header_only_file_processes_zero_rows() {
    let (_db, db_path, _org) = create_seeded_db().unwrap();
    let importer = create_test_importer(&db_path);

    let csv = write_csv("NAME,UNIT,DEPARTMENT\n");
    let result = importer
        .import_from_csv(csv.path(), &ImportOptions::validate_only())
        .await
        .unwrap();

    assert_eq!(result.state, ImportRunState::ValidatedOnly);
    assert_eq!(result.total_records, 0);
    assert!(result.errors.is_empty());
}
