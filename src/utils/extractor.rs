//! 路径参数提取器
//!
//! 在进入处理函数之前校验路径参数，非法值直接返回统一的 400 响应。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

pub(crate) fn bad_path(message: String) -> actix_web::Error {
    InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}

/// 解析正整数 ID
pub fn parse_positive_id(req: &HttpRequest, name: &str) -> Result<i64, actix_web::Error> {
    let raw = req
        .match_info()
        .get(name)
        .ok_or_else(|| bad_path(format!("缺少路径参数: {name}")))?;

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(bad_path(format!("路径参数 {name} 必须为正整数: {raw}"))),
    }
}

#[macro_export]
macro_rules! define_safe_i64_extractor {
    ($($name:ident => $param:literal),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name(pub i64);

            impl actix_web::FromRequest for $name {
                type Error = actix_web::Error;
                type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

                fn from_request(
                    req: &actix_web::HttpRequest,
                    _: &mut actix_web::dev::Payload,
                ) -> Self::Future {
                    futures_util::future::ready(
                        $crate::utils::extractor::parse_positive_id(req, $param).map($name),
                    )
                }
            }
        )*
    };
}

define_safe_i64_extractor! {
    SafeIDI64 => "id",
    SafeDocumentIdI64 => "document_id",
    SafeParentIdI64 => "parent_id",
    SafeUserIdI64 => "user_id",
}

/// 附件下载令牌（URL 安全字符）
#[derive(Debug, Clone)]
pub struct SafeDownloadToken(pub String);

impl FromRequest for SafeDownloadToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = req.match_info().get("token").unwrap_or_default();
        let valid = !token.is_empty()
            && token.len() <= 128
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        ready(if valid {
            Ok(SafeDownloadToken(token.to_string()))
        } else {
            Err(bad_path("下载令牌格式无效".to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_positive_id_is_extracted() {
        let req = TestRequest::default().param("id", "42").to_http_request();
        let id = SafeIDI64::extract(&req).await.expect("valid id");
        assert_eq!(id.0, 42);
    }

    #[actix_web::test]
    async fn test_non_positive_id_is_rejected() {
        for raw in ["0", "-3", "abc", "9999999999999999999999"] {
            let req = TestRequest::default().param("id", raw).to_http_request();
            assert!(SafeIDI64::extract(&req).await.is_err(), "{raw} should fail");
        }
    }

    #[actix_web::test]
    async fn test_download_token_charset() {
        let req = TestRequest::default()
            .param("token", "a1B2-c3_d4")
            .to_http_request();
        assert!(SafeDownloadToken::extract(&req).await.is_ok());

        let req = TestRequest::default()
            .param("token", "../etc/passwd")
            .to_http_request();
        assert!(SafeDownloadToken::extract(&req).await.is_err());
    }
}
