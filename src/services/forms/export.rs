//! 提交结果导出为 CSV

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::FormService;
use super::access::{FormAccess, load_form};
use crate::models::{
    ErrorCode,
    forms::entities::FormField,
    submissions::{requests::SubmissionListQuery, responses::SubmissionListItem},
};
use crate::services::{current_user, error_response, storage_error};

const PAGE_SIZE: i64 = 100;

pub async fn export_submissions(
    service: &FormService,
    id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    let (form, _) = match load_form(storage.as_ref(), &user, id, FormAccess::Read, "导出提交").await {
        Ok(found) => found,
        Err(resp) => return Ok(resp),
    };

    let fields = match storage.list_form_fields(id).await {
        Ok(fields) => fields,
        Err(e) => return Ok(storage_error("导出提交", e)),
    };

    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let query = SubmissionListQuery {
            page: Some(page),
            size: Some(PAGE_SIZE),
            form_id: id,
            status: None,
        };
        match storage.list_submissions_with_pagination(query).await {
            Ok(batch) => {
                let total_pages = batch.pagination.total_pages;
                items.extend(batch.items);
                if page >= total_pages {
                    break;
                }
                page += 1;
            }
            Err(e) => return Ok(storage_error("导出提交", e)),
        }
    }

    let data = match build_export_csv(&fields, &items) {
        Ok(data) => data,
        Err(e) => {
            error!("CSV 生成失败: {}", e);
            return Ok(error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "CSV 生成失败",
            ));
        }
    };

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"form-{}-submissions.csv\"", form.id),
        ))
        .body(data))
}

/// 每个自定义字段一列，列名为字段标签
pub fn build_export_csv(
    fields: &[FormField],
    items: &[SubmissionListItem],
) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = [
        "student",
        "grade",
        "group",
        "status",
        "signer",
        "signer_email",
        "signed_at",
        "decline_reason",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(fields.iter().map(|f| f.label.clone()));
    wtr.write_record(&header)?;

    for item in items {
        let s = &item.submission;
        let mut record = vec![
            item.student_name.clone(),
            item.grade.clone(),
            item.group_name.clone().unwrap_or_default(),
            s.status.to_string(),
            item.signer_name.clone().unwrap_or_default(),
            item.signer_email.clone().unwrap_or_default(),
            s.signed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            s.decline_reason.clone().unwrap_or_default(),
        ];
        record.extend(
            fields
                .iter()
                .map(|f| render_answer(s.responses.get(&f.id.to_string()))),
        );
        wtr.write_record(&record)?;
    }

    wtr.into_inner().map_err(|e| e.into_error().into())
}

fn render_answer(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::Bool(true)) => "yes".to_string(),
        Some(serde_json::Value::Bool(false)) => "no".to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forms::entities::FieldType;
    use crate::models::submissions::entities::{FieldResponses, FormSubmission, SubmissionStatus};
    use chrono::Utc;
    use serde_json::json;

    fn field(id: i64, label: &str, field_type: FieldType) -> FormField {
        FormField {
            id,
            form_id: 1,
            label: label.to_string(),
            field_type,
            required: false,
            options: Vec::new(),
            position: id as i32,
        }
    }

    fn item(status: SubmissionStatus, responses: FieldResponses) -> SubmissionListItem {
        let now = Utc::now();
        SubmissionListItem {
            submission: FormSubmission {
                id: 1,
                form_id: 1,
                student_id: 1,
                parent_id: Some(9),
                status,
                signature: Some("Lin Chen".to_string()),
                decline_reason: None,
                responses,
                signed_at: Some(now),
                last_reminded_at: None,
                created_at: now,
                updated_at: now,
            },
            student_name: "Ava Chen".to_string(),
            grade: "3".to_string(),
            group_name: Some("3B".to_string()),
            signer_name: Some("Lin Chen".to_string()),
            signer_email: Some("lin@example.com".to_string()),
        }
    }

    #[test]
    fn test_export_has_one_column_per_field() {
        let fields = vec![
            field(11, "Allergies", FieldType::Text),
            field(12, "Photo consent", FieldType::Checkbox),
        ];
        let mut responses = FieldResponses::new();
        responses.insert("11".to_string(), json!("peanuts, dust"));
        responses.insert("12".to_string(), json!(true));

        let data = build_export_csv(&fields, &[item(SubmissionStatus::Signed, responses)])
            .expect("csv written");
        let text = String::from_utf8(data).expect("utf8");
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("student,grade,group,status,signer,signer_email,signed_at,decline_reason,Allergies,Photo consent")
        );
        let row = lines.next().expect("data row");
        assert!(row.starts_with("Ava Chen,3,3B,signed,Lin Chen,lin@example.com,"));
        assert!(row.ends_with(",\"peanuts, dust\",yes"));
    }

    #[test]
    fn test_missing_answers_are_blank() {
        let fields = vec![field(11, "Allergies", FieldType::Text)];
        let data = build_export_csv(&fields, &[item(SubmissionStatus::Pending, FieldResponses::new())])
            .expect("csv written");
        let text = String::from_utf8(data).expect("utf8");
        assert!(text.lines().nth(1).expect("data row").ends_with(','));
    }
}
