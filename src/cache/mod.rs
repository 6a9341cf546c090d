//! 对象缓存
//!
//! 后端以插件形式注册（moka 内存缓存、redis），启动时按配置选择。

pub mod object_cache;
pub mod register;
pub mod traits;

pub use traits::{CacheResult, ObjectCache};

/// 声明并在进程启动时注册一个缓存插件
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:expr, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        <$ty>::new()
                            .map(|cache| {
                                Box::new(cache) as Box<dyn $crate::cache::traits::ObjectCache>
                            })
                            .map_err($crate::errors::FeedbackError::cache_connection)
                    })
                }),
            );
        }
    };
}
