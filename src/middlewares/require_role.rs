/*!
 * 基于角色的访问控制中间件
 *
 * 必须放在 RequireJWT 之后，否则请求扩展中没有用户。
 *
 * ```rust,ignore
 * web::scope("/schools")
 *     .wrap(RequireRole::new_any(UserRole::admin_roles()))
 *     .wrap(RequireJWT)
 * ```
 *
 * 注意 actix 中后注册的 wrap 先执行。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::models::{ErrorCode, users::entities::UserRole};

use super::RequireJWT;

use super::create_error_response;

#[derive(Clone)]
pub struct RequireRole {
    required_roles: Vec<UserRole>,
}

impl RequireRole {
    pub fn new(role: UserRole) -> Self {
        Self {
            required_roles: vec![role],
        }
    }

    /// 任一角色即可通过
    pub fn new_any(roles: &[&UserRole]) -> Self {
        Self {
            required_roles: roles.iter().map(|r| **r).collect(),
        }
    }

    fn allows(roles: &[UserRole], role: UserRole) -> bool {
        roles.contains(&role)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            required_roles: self.required_roles.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    required_roles: Vec<UserRole>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let required_roles = self.required_roles.clone();

        Box::pin(async move {
            let Some(user) = RequireJWT::extract_user_claims(req.request()) else {
                info!("角色校验时请求中没有用户，RequireJWT 未生效");
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "未登录",
                    )
                    .map_into_right_body(),
                ));
            };

            if RequireRole::allows(&required_roles, user.role) {
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            info!(
                "用户 {} (角色 {}) 无权访问 {}, 需要 {:?}",
                user.id,
                user.role,
                req.path(),
                required_roles
            );
            Ok(req.into_response(
                create_error_response(StatusCode::FORBIDDEN, ErrorCode::Forbidden, "权限不足")
                    .map_into_right_body(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_any_listed_role() {
        let roles = RequireRole::new_any(UserRole::staff_roles()).required_roles;
        assert!(RequireRole::allows(&roles, UserRole::Teacher));
        assert!(RequireRole::allows(&roles, UserRole::Admin));
        assert!(!RequireRole::allows(&roles, UserRole::Parent));
    }

    #[test]
    fn test_single_role() {
        let roles = RequireRole::new(UserRole::Admin).required_roles;
        assert!(!RequireRole::allows(&roles, UserRole::Reviewer));
    }
}
