//! 签署时的字段回答校验

use serde_json::Value;

use crate::models::forms::entities::{FieldType, FormField};
use crate::models::submissions::entities::FieldResponses;
use crate::utils::validate::validate_date;

const MAX_ANSWER_CHARS: usize = 5000;

/// 按表单字段校验回答，返回规范化后的回答
///
/// 未知字段直接拒绝；`null` 视为未回答；必填复选框必须为 true。
pub fn validate_responses(
    fields: &[FormField],
    responses: &FieldResponses,
) -> Result<FieldResponses, String> {
    if let Some(unknown) = responses
        .keys()
        .find(|key| !fields.iter().any(|f| f.id.to_string() == **key))
    {
        return Err(format!("Unknown field id: {unknown}"));
    }

    let mut normalized = FieldResponses::new();
    for field in fields {
        let key = field.id.to_string();
        let value = responses.get(&key).filter(|v| !v.is_null());
        if let Some(answer) = validate_answer(field, value)? {
            normalized.insert(key, answer);
        }
    }
    Ok(normalized)
}

fn validate_answer(field: &FormField, value: Option<&Value>) -> Result<Option<Value>, String> {
    let label = &field.label;
    match field.field_type {
        FieldType::Checkbox => match value {
            None if field.required => Err(format!("\"{label}\" must be checked")),
            None => Ok(None),
            Some(Value::Bool(checked)) => {
                if field.required && !checked {
                    Err(format!("\"{label}\" must be checked"))
                } else {
                    Ok(Some(Value::Bool(*checked)))
                }
            }
            Some(_) => Err(format!("\"{label}\" must be true or false")),
        },
        FieldType::Text | FieldType::Textarea | FieldType::Select | FieldType::Date => {
            let text = match value {
                None => "",
                Some(Value::String(s)) => s.trim(),
                Some(_) => return Err(format!("\"{label}\" must be text")),
            };
            if text.is_empty() {
                return if field.required {
                    Err(format!("\"{label}\" is required"))
                } else {
                    Ok(None)
                };
            }
            match field.field_type {
                FieldType::Select if !field.options.iter().any(|o| o == text) => {
                    Err(format!("\"{label}\" must be one of the listed options"))
                }
                FieldType::Date if !validate_date(text) => {
                    Err(format!("\"{label}\" must be a date in YYYY-MM-DD format"))
                }
                _ if text.chars().count() > MAX_ANSWER_CHARS => Err(format!(
                    "\"{label}\" must be at most {MAX_ANSWER_CHARS} characters"
                )),
                _ => Ok(Some(Value::String(text.to_string()))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(id: i64, field_type: FieldType, required: bool, options: &[&str]) -> FormField {
        FormField {
            id,
            form_id: 1,
            label: format!("Field {id}"),
            field_type,
            required,
            options: options.iter().map(|s| s.to_string()).collect(),
            position: id as i32,
        }
    }

    fn answers(pairs: &[(i64, Value)]) -> FieldResponses {
        pairs
            .iter()
            .map(|(id, v)| (id.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_valid_answers_are_normalized() {
        let fields = vec![
            field(1, FieldType::Text, true, &[]),
            field(2, FieldType::Checkbox, true, &[]),
            field(3, FieldType::Select, false, &["Vegetarian", "Standard"]),
            field(4, FieldType::Date, false, &[]),
        ];
        let input = answers(&[
            (1, json!("  EpiPen in backpack ")),
            (2, json!(true)),
            (3, json!("Standard")),
            (4, json!("2026-06-01")),
        ]);
        let out = validate_responses(&fields, &input).expect("valid answers");
        assert_eq!(out.get("1"), Some(&json!("EpiPen in backpack")));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let fields = vec![field(1, FieldType::Text, false, &[])];
        let err = validate_responses(&fields, &answers(&[(99, json!("x"))])).unwrap_err();
        assert!(err.contains("99"));
    }

    #[test]
    fn test_required_text_must_be_non_empty() {
        let fields = vec![field(1, FieldType::Textarea, true, &[])];
        assert!(validate_responses(&fields, &answers(&[(1, json!("   "))])).is_err());
        assert!(validate_responses(&fields, &FieldResponses::new()).is_err());
    }

    #[test]
    fn test_required_checkbox_must_be_true() {
        let fields = vec![field(1, FieldType::Checkbox, true, &[])];
        assert!(validate_responses(&fields, &answers(&[(1, json!(false))])).is_err());
        assert!(validate_responses(&fields, &answers(&[(1, json!("yes"))])).is_err());
    }

    #[test]
    fn test_optional_checkbox_keeps_false() {
        let fields = vec![field(1, FieldType::Checkbox, false, &[])];
        let out = validate_responses(&fields, &answers(&[(1, json!(false))])).expect("valid");
        assert_eq!(out.get("1"), Some(&json!(false)));
    }

    #[test]
    fn test_select_value_must_be_an_option() {
        let fields = vec![field(1, FieldType::Select, true, &["Bus", "Car"])];
        assert!(validate_responses(&fields, &answers(&[(1, json!("Bike"))])).is_err());
    }

    #[test]
    fn test_date_format_is_enforced() {
        let fields = vec![field(1, FieldType::Date, true, &[])];
        assert!(validate_responses(&fields, &answers(&[(1, json!("06/01/2026"))])).is_err());
        assert!(validate_responses(&fields, &answers(&[(1, json!("2026-02-30"))])).is_err());
    }

    #[test]
    fn test_null_counts_as_unanswered() {
        let fields = vec![field(1, FieldType::Text, false, &[])];
        let out = validate_responses(&fields, &answers(&[(1, Value::Null)])).expect("valid");
        assert!(out.is_empty());
    }
}
