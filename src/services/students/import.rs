//! 学生 CSV 导入

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::StreamExt;
use serde_json::json;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{error, info};

use super::{StudentService, find_or_create_parent};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    students::{
        requests::CreateStudentRequest,
        responses::{ImportRowError, StudentImportResponse},
    },
};
use crate::services::{
    audit, bad_request, current_user, not_found, storage_error, target_school,
};
use crate::utils::validate::validate_required_text;

const MAX_IMPORT_ROWS: usize = 1000;

/// 文件级解析错误，整个导入失败
#[derive(Debug, PartialEq)]
pub(crate) enum ImportParseError {
    MissingColumn(String),
    ParseFailed(String),
    Empty,
    TooManyRows,
}

impl ImportParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingColumn(_) => ErrorCode::ImportFileMissingColumn,
            Self::ParseFailed(_) => ErrorCode::ImportFileParseFailed,
            Self::Empty | Self::TooManyRows => ErrorCode::ImportFileDataInvalid,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingColumn(col) => format!("缺少必需列: {col}"),
            Self::ParseFailed(msg) => msg.clone(),
            Self::Empty => "文件中没有数据行".to_string(),
            Self::TooManyRows => format!("单次导入最多支持 {MAX_IMPORT_ROWS} 行"),
        }
    }
}

/// 导入行
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ImportRow {
    pub row: usize,
    pub first_name: String,
    pub last_name: String,
    pub grade: String,
    pub group_name: Option<String>,
    pub external_id: Option<String>,
    pub parent_email: Option<String>,
    pub parent_name: Option<String>,
}

/// 解析结果：有效行与行级错误
#[derive(Debug, Default)]
pub(crate) struct ParsedImport {
    pub rows: Vec<ImportRow>,
    pub errors: Vec<ImportRowError>,
}

pub async fn import_students(
    service: &StudentService,
    school_id: Option<i64>,
    mut payload: Multipart,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = current_user(request)?;
    let school_id = match target_school(&actor, school_id) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let storage = service.get_storage(request)?;
    match storage.get_school_by_id(school_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "学校不存在")),
        Err(e) => return Ok(storage_error("导入学生", e)),
    }

    let file_bytes = match read_file_from_multipart(&mut payload).await {
        Ok(bytes) => bytes,
        Err(msg) => return Ok(bad_request(ErrorCode::FileUploadFailed, msg)),
    };

    let parsed = match parse_import_csv(&file_bytes) {
        Ok(parsed) => parsed,
        Err(e) => return Ok(bad_request(e.error_code(), e.message())),
    };

    let mut response = StudentImportResponse {
        errors: parsed.errors,
        ..Default::default()
    };

    for row in parsed.rows {
        let row_num = row.row;

        // 外部编号已存在时复用学生，只补充家长关联
        let existing = match row.external_id.as_deref() {
            Some(external_id) => match storage.get_student_by_external_id(school_id, external_id).await {
                Ok(found) => found,
                Err(e) => {
                    error!("导入第 {} 行查询学生失败: {}", row_num, e);
                    push_error(&mut response, row_num, "查询学生失败");
                    continue;
                }
            },
            None => None,
        };

        let student = match existing {
            Some(student) => student,
            None => {
                let create = CreateStudentRequest {
                    school_id: Some(school_id),
                    first_name: row.first_name,
                    last_name: row.last_name,
                    grade: row.grade,
                    group_name: row.group_name,
                    external_id: row.external_id,
                };
                match storage.create_student(school_id, create).await {
                    Ok(student) => {
                        response.students_created += 1;
                        student
                    }
                    Err(e) => {
                        error!("导入第 {} 行创建学生失败: {}", row_num, e);
                        push_error(&mut response, row_num, "创建学生失败");
                        continue;
                    }
                }
            }
        };

        let Some(parent_email) = row.parent_email else {
            continue;
        };

        let (parent, created) = match find_or_create_parent(
            storage.as_ref(),
            school_id,
            &parent_email,
            row.parent_name.as_deref(),
        )
        .await
        {
            Ok(found) => found,
            Err(e) => {
                push_error(&mut response, row_num, &e.message());
                continue;
            }
        };
        if created {
            response.parents_created += 1;
        }

        match storage.link_parent(parent.id, student.id, None).await {
            Ok(true) => response.parents_linked += 1,
            Ok(false) => {}
            Err(e) => {
                error!("导入第 {} 行关联家长失败: {}", row_num, e);
                push_error(&mut response, row_num, "关联家长失败");
            }
        }
    }

    info!(
        "学校 {} 导入学生完成: 新建 {} 名学生, {} 名家长, {} 条关联, {} 行错误",
        school_id,
        response.students_created,
        response.parents_created,
        response.parents_linked,
        response.errors.len()
    );

    audit::record(
        storage.as_ref(),
        Some(request),
        NewAuditLog::new("student.import", "school", Some(school_id))
            .school(Some(school_id))
            .actor(actor.id)
            .details(json!({
                "students_created": response.students_created,
                "parents_created": response.parents_created,
                "parents_linked": response.parents_linked,
                "errors": response.errors.len(),
            })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "导入完成")))
}

fn push_error(response: &mut StudentImportResponse, row: usize, message: &str) {
    response.errors.push(ImportRowError {
        row,
        message: message.to_string(),
    });
}

async fn read_file_from_multipart(payload: &mut Multipart) -> Result<Vec<u8>, String> {
    let mut file_bytes = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| format!("读取字段失败: {e}"))?;

        if field.name() == Some("file") {
            while let Some(chunk) = field.next().await {
                let data = chunk.map_err(|e| format!("读取数据失败: {e}"))?;
                file_bytes.extend_from_slice(&data);
            }
        }
    }

    if file_bytes.is_empty() {
        return Err("未找到文件字段".to_string());
    }

    Ok(file_bytes)
}

/// 解析导入文件，列名不区分大小写，行号从 2 开始（第 1 行为表头）
pub(crate) fn parse_import_csv(data: &[u8]) -> Result<ParsedImport, ImportParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(data));

    let headers = rdr
        .headers()
        .map_err(|e| ImportParseError::ParseFailed(format!("读取表头失败: {e}")))?;
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim_start_matches('\u{feff}').to_lowercase(), i))
        .collect();

    let required = |name: &str| {
        header_map
            .get(name)
            .copied()
            .ok_or_else(|| ImportParseError::MissingColumn(name.to_string()))
    };
    let first_name_idx = required("first_name")?;
    let last_name_idx = required("last_name")?;
    let grade_idx = required("grade")?;
    let group_idx = header_map.get("group").copied();
    let external_id_idx = header_map.get("external_id").copied();
    let parent_email_idx = header_map.get("parent_email").copied();
    let parent_name_idx = header_map.get("parent_name").copied();

    let mut parsed = ParsedImport::default();
    let mut total = 0usize;

    for (i, result) in rdr.records().enumerate() {
        let row = i + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                parsed.errors.push(ImportRowError {
                    row,
                    message: format!("解析失败: {e}"),
                });
                continue;
            }
        };

        // 跳过空行
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        total += 1;
        if total > MAX_IMPORT_ROWS {
            return Err(ImportParseError::TooManyRows);
        }

        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
        let optional = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::to_string)
                .filter(|s| !s.is_empty())
        };

        let import_row = ImportRow {
            row,
            first_name: cell(first_name_idx),
            last_name: cell(last_name_idx),
            grade: cell(grade_idx),
            group_name: optional(group_idx),
            external_id: optional(external_id_idx),
            parent_email: optional(parent_email_idx),
            parent_name: optional(parent_name_idx),
        };

        match validate_row(&import_row) {
            Ok(()) => parsed.rows.push(import_row),
            Err(message) => parsed.errors.push(ImportRowError { row, message }),
        }
    }

    if total == 0 {
        return Err(ImportParseError::Empty);
    }

    Ok(parsed)
}

fn validate_row(row: &ImportRow) -> Result<(), String> {
    validate_required_text(&row.first_name, "first_name", 100)?;
    validate_required_text(&row.last_name, "last_name", 100)?;
    validate_required_text(&row.grade, "grade", 100)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let csv = "first_name,last_name,grade,group,external_id,parent_email,parent_name\n\
                   Ava,Chen,3,3B,S-001,mom@example.com,Lin Chen\n\
                   Noah,Patel,4,,,,\n";
        let parsed = parse_import_csv(csv.as_bytes()).expect("valid csv");
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 2);

        let ava = &parsed.rows[0];
        assert_eq!(ava.row, 2);
        assert_eq!(ava.group_name.as_deref(), Some("3B"));
        assert_eq!(ava.parent_email.as_deref(), Some("mom@example.com"));

        let noah = &parsed.rows[1];
        assert_eq!(noah.row, 3);
        assert_eq!(noah.external_id, None);
        assert_eq!(noah.parent_email, None);
    }

    #[test]
    fn test_headers_are_case_insensitive_and_optional_columns_may_be_absent() {
        let csv = "First_Name,LAST_NAME,Grade\nMia,Lopez,K\n";
        let parsed = parse_import_csv(csv.as_bytes()).expect("valid csv");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].grade, "K");
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "first_name,last_name\nMia,Lopez\n";
        assert_eq!(
            parse_import_csv(csv.as_bytes()).unwrap_err(),
            ImportParseError::MissingColumn("grade".to_string())
        );
    }

    #[test]
    fn test_invalid_rows_are_reported_not_fatal() {
        let csv = "first_name,last_name,grade\n,Lopez,2\nSam,Ng,5\n";
        let parsed = parse_import_csv(csv.as_bytes()).expect("valid csv");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].row, 2);
        assert!(parsed.errors[0].message.contains("first_name"));
    }

    #[test]
    fn test_blank_lines_are_skipped_and_empty_file_rejected() {
        let csv = "first_name,last_name,grade\n,,\n";
        assert_eq!(
            parse_import_csv(csv.as_bytes()).unwrap_err(),
            ImportParseError::Empty
        );
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let csv = "\u{feff}first_name,last_name,grade\nLeo,Park,1\n";
        let parsed = parse_import_csv(csv.as_bytes()).expect("valid csv");
        assert_eq!(parsed.rows.len(), 1);
    }
}
