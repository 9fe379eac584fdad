pub mod extractor;
pub mod file_magic;
pub mod html;
pub mod jwt;
pub mod parameter_error_handler;
pub mod password;
pub mod sql;
pub mod token;
pub mod validate;

pub use extractor::{
    SafeDocumentIdI64, SafeDownloadToken, SafeIDI64, SafeParentIdI64, SafeUserIdI64,
};
pub use file_magic::validate_magic_bytes;
pub use html::escape_html;
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::escape_like_pattern;
