//! 表单字段校验

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::models::forms::{entities::FieldType, requests::FormFieldInput};
use crate::utils::validate::validate_required_text;

const MAX_FIELDS: usize = 50;
const MAX_OPTIONS: usize = 50;

/// 标题必填，最多 200 个字符
pub fn normalize_title(title: &mut String) -> Result<(), String> {
    validate_required_text(title, "Title", 200)?;
    *title = title.trim().to_string();
    Ok(())
}

/// 可选文本：去空白，空串视为 None
pub fn normalize_text(
    value: Option<String>,
    field: &str,
    max_chars: usize,
) -> Result<Option<String>, String> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max_chars {
        return Err(format!("{field} must be at most {max_chars} characters"));
    }
    Ok(Some(value))
}

/// 截止时间必须晚于当前时间
pub fn validate_deadline(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), String> {
    if deadline <= now {
        return Err("Deadline must be in the future".to_string());
    }
    Ok(())
}

/// 校验并规范化自定义字段
pub fn normalize_fields(fields: &mut [FormFieldInput]) -> Result<(), String> {
    if fields.len() > MAX_FIELDS {
        return Err(format!("A form may have at most {MAX_FIELDS} fields"));
    }

    for (i, field) in fields.iter_mut().enumerate() {
        let position = i + 1;
        validate_required_text(&field.label, &format!("Field {position} label"), 200)?;
        field.label = field.label.trim().to_string();

        if field.field_type == FieldType::Select {
            let mut seen = HashSet::new();
            let options: Vec<String> = field
                .options
                .iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .filter(|o| seen.insert(o.clone()))
                .collect();
            if options.is_empty() {
                return Err(format!("Field {position} is a select and needs at least one option"));
            }
            if options.len() > MAX_OPTIONS {
                return Err(format!("Field {position} has more than {MAX_OPTIONS} options"));
            }
            field.options = options;
        } else {
            field.options.clear();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn field(label: &str, field_type: FieldType, options: &[&str]) -> FormFieldInput {
        FormFieldInput {
            label: label.to_string(),
            field_type,
            required: false,
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_title_is_trimmed_and_bounded() {
        let mut title = "  Museum visit ".to_string();
        normalize_title(&mut title).expect("valid title");
        assert_eq!(title, "Museum visit");

        let mut long = "x".repeat(201);
        assert!(normalize_title(&mut long).is_err());
    }

    #[test]
    fn test_deadline_must_be_future() {
        let now = Utc::now();
        assert!(validate_deadline(now + Duration::hours(1), now).is_ok());
        assert!(validate_deadline(now, now).is_err());
    }

    #[test]
    fn test_select_options_are_deduplicated() {
        let mut fields = vec![field("T-shirt size", FieldType::Select, &["S", " M ", "S", ""])];
        normalize_fields(&mut fields).expect("valid fields");
        assert_eq!(fields[0].options, vec!["S", "M"]);
    }

    #[test]
    fn test_select_without_options_is_rejected() {
        let mut fields = vec![field("Lunch", FieldType::Select, &[" "])];
        assert!(normalize_fields(&mut fields).is_err());
    }

    #[test]
    fn test_options_dropped_for_non_select() {
        let mut fields = vec![field("Allergies", FieldType::Textarea, &["peanuts"])];
        normalize_fields(&mut fields).expect("valid fields");
        assert!(fields[0].options.is_empty());
    }

    #[test]
    fn test_blank_optional_text_is_none() {
        assert_eq!(normalize_text(Some("  ".to_string()), "Location", 10), Ok(None));
        assert!(normalize_text(Some("a".repeat(11)), "Location", 10).is_err());
    }
}
