use serde::Deserialize;

// 邮箱密码登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// 是否记住我
    #[serde(default)]
    pub remember_me: bool,
}

// 申请登录链接
#[derive(Debug, Deserialize)]
pub struct MagicLinkRequest {
    pub email: String,
}

// 使用登录链接中的令牌登录
#[derive(Debug, Deserialize)]
pub struct VerifyMagicLinkRequest {
    pub token: String,
    #[serde(default)]
    pub remember_me: bool,
}
