//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_permission_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum PermissionError {
            $($variant(String),)*
        }

        impl PermissionError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(PermissionError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(PermissionError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(PermissionError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl PermissionError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        PermissionError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_permission_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    FileOperation("E006", "File Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    Conflict("E010", "Conflict Error"),
    DateParse("E011", "Date Parse Error"),
    Authentication("E012", "Authentication Error"),
    Authorization("E013", "Authorization Error"),
    Email("E014", "Email Delivery Error"),
    InvalidState("E015", "Invalid State Error"),
}

impl PermissionError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 数据库唯一约束冲突
    pub fn is_conflict(&self) -> bool {
        matches!(self, PermissionError::Conflict(_))
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for PermissionError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for PermissionError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => PermissionError::Conflict(msg),
            _ => PermissionError::DatabaseOperation(err.to_string()),
        }
    }
}

impl From<std::io::Error> for PermissionError {
    fn from(err: std::io::Error) -> Self {
        PermissionError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for PermissionError {
    fn from(err: serde_json::Error) -> Self {
        PermissionError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for PermissionError {
    fn from(err: chrono::ParseError) -> Self {
        PermissionError::DateParse(err.to_string())
    }
}

impl From<reqwest::Error> for PermissionError {
    fn from(err: reqwest::Error) -> Self {
        PermissionError::Email(err.to_string())
    }
}

impl From<csv::Error> for PermissionError {
    fn from(err: csv::Error) -> Self {
        PermissionError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PermissionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PermissionError::cache_connection("test").code(), "E001");
        assert_eq!(PermissionError::database_config("test").code(), "E003");
        assert_eq!(PermissionError::validation("test").code(), "E007");
        assert_eq!(PermissionError::authentication("test").code(), "E012");
        assert_eq!(PermissionError::email("test").code(), "E014");
        assert_eq!(PermissionError::invalid_state("test").code(), "E015");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            PermissionError::cache_connection("test").error_type(),
            "Cache Connection Error"
        );
        assert_eq!(
            PermissionError::conflict("test").error_type(),
            "Conflict Error"
        );
    }

    #[test]
    fn test_error_message() {
        let err = PermissionError::validation("Invalid input");
        assert_eq!(err.message(), "Invalid input");
    }

    #[test]
    fn test_format_simple() {
        let err = PermissionError::email("SMTP relay refused");
        let formatted = err.format_simple();
        assert!(formatted.contains("Email Delivery Error"));
        assert!(formatted.contains("SMTP relay refused"));
    }

    #[test]
    fn test_db_error_maps_to_database_operation() {
        let err: PermissionError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert_eq!(err.code(), "E005");
        assert!(!err.is_conflict());
    }
}
