use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("Invalid slug regex"));

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid date regex"));

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 规范化邮箱：去除空白并转小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_slug(slug: &str) -> Result<(), &'static str> {
    if slug.len() < 2 || slug.len() > 64 {
        return Err("Slug length must be between 2 and 64 characters");
    }
    if !SLUG_RE.is_match(slug) {
        return Err("Slug must contain only lowercase letters, digits and single hyphens");
    }
    Ok(())
}

/// 必填文本：去除首尾空白后非空且不超过最大字符数
pub fn validate_required_text(
    value: &str,
    field: &str,
    max_chars: usize,
) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} is required"));
    }
    if trimmed.chars().count() > max_chars {
        return Err(format!("{field} must be at most {max_chars} characters"));
    }
    Ok(())
}

/// 签名：非空，最多 200 个字符
pub fn validate_signature(signature: &str) -> Result<(), String> {
    validate_required_text(signature, "Signature", 200)
}

/// YYYY-MM-DD 格式且为有效日期
pub fn validate_date(value: &str) -> bool {
    DATE_RE.is_match(value) && chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 策略要求：
/// - 最小长度：8 字符
/// - 必须包含：大写字母 + 小写字母 + 数字
/// - 可选：特殊字符（增强安全性）
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    // 1. 长度检查：至少 8 个字符
    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long");
    }

    // 2. 大写字母检查
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }

    // 3. 小写字母检查
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }

    // 4. 数字检查
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    // 5. 常见弱密码检查
    let weak_passwords = [
        "password",
        "12345678",
        "123456789",
        "qwerty123",
        "admin123",
        "password1",
        "Password1",
        "Qwerty123",
        "Abcd1234",
    ];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// 简化的密码验证（返回 Result）
pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("parent@example.org").is_ok());
        assert!(validate_email("first.last+slips@school.k12.us").is_ok());
        assert!(validate_email("no-at-sign.example.org").is_err());
        assert!(validate_email("trailing@dot.").is_err());
        assert_eq!(normalize_email("  Mixed@Case.ORG "), "mixed@case.org");
    }

    #[test]
    fn test_slug_validation() {
        assert!(validate_slug("lincoln-elementary").is_ok());
        assert!(validate_slug("ps-118").is_ok());
        assert!(validate_slug("Lincoln").is_err());
        assert!(validate_slug("double--hyphen").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("a").is_err());
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Zoo trip", "Title", 200).is_ok());
        assert!(validate_required_text("   ", "Title", 200).is_err());
        assert!(validate_required_text(&"x".repeat(201), "Title", 200).is_err());
        assert!(validate_signature("Jane Doe").is_ok());
        assert!(validate_signature("").is_err());
    }

    #[test]
    fn test_date_validation() {
        assert!(validate_date("2026-05-01"));
        assert!(!validate_date("2026-02-30"));
        assert!(!validate_date("05/01/2026"));
        assert!(!validate_date("2026-5-1"));
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password("SecureP@ss1").is_valid);
        assert!(validate_password("MyP@ssw0rd").is_valid);
        assert!(validate_password("SecurePass123").is_valid);
    }

    #[test]
    fn test_short_password() {
        let result = validate_password("Ab1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must be at least 8 characters long")
        );
    }

    #[test]
    fn test_no_uppercase() {
        let result = validate_password("abcd1234");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one uppercase letter")
        );
    }

    #[test]
    fn test_no_lowercase() {
        let result = validate_password("ABCD1234");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one lowercase letter")
        );
    }

    #[test]
    fn test_no_digit() {
        let result = validate_password("AbcdEfgh");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one digit")
        );
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("Password1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
    }
}
