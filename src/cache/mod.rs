//! 对象缓存
//!
//! 后端通过 `declare_object_cache_plugin!` 在进程启动时注册，
//! 运行时按配置中的 `cache.type` 选择。

pub mod object_cache;
pub mod register;
pub mod traits;

pub use traits::{CacheResult, ObjectCache, ObjectCacheExt};

/// 注册缓存后端
///
/// 构造函数返回 `Result<Self, String>`，错误统一转换为 `PermissionError::CacheConnection`。
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:literal, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        let cache = <$ty>::new()
                            .map_err($crate::errors::PermissionError::cache_connection)?;
                        Ok(Box::new(cache) as Box<dyn $crate::cache::ObjectCache>)
                    })
                }),
            );
        }
    };
}
