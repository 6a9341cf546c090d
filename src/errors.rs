//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。
//! 领域层（评分、重复提交、审核状态机）的失败也在这里定义，
//! 服务层再把它们映射为 HTTP 状态码与 `ErrorCode`。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_feedback_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum FeedbackError {
            $($variant(String),)*
        }

        impl FeedbackError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(FeedbackError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(FeedbackError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(FeedbackError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl FeedbackError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        FeedbackError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_feedback_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    Validation("E006", "Validation Error"),
    InvalidRating("E007", "Invalid Rating Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    DuplicateReview("E010", "Duplicate Review Error"),
    Forbidden("E011", "Forbidden Error"),
    InvalidTransition("E012", "Invalid Transition Error"),
    AlreadyResponded("E013", "Already Responded Error"),
    Authentication("E014", "Authentication Error"),
}

impl FeedbackError {
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

    /// 是否属于调用方可修正的输入错误
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FeedbackError::Validation(_) | FeedbackError::InvalidRating(_)
        )
    }
}

impl fmt::Display for FeedbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for FeedbackError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for FeedbackError {
    fn from(err: sea_orm::DbErr) -> Self {
        FeedbackError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for FeedbackError {
    fn from(err: serde_json::Error) -> Self {
        FeedbackError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedbackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(FeedbackError::cache_connection("test").code(), "E001");
        assert_eq!(FeedbackError::database_config("test").code(), "E003");
        assert_eq!(FeedbackError::validation("test").code(), "E006");
        assert_eq!(FeedbackError::duplicate_review("test").code(), "E010");
        assert_eq!(FeedbackError::already_responded("test").code(), "E013");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            FeedbackError::invalid_transition("test").error_type(),
            "Invalid Transition Error"
        );
        assert_eq!(FeedbackError::forbidden("test").error_type(), "Forbidden Error");
    }

    #[test]
    fn test_error_message() {
        let err = FeedbackError::invalid_rating("Rating must be between 1 and 5");
        assert_eq!(err.message(), "Rating must be between 1 and 5");
        assert!(err.is_validation());
        assert!(!FeedbackError::forbidden("nope").is_validation());
    }

    #[test]
    fn test_format_simple() {
        let err = FeedbackError::duplicate_review("already reviewed");
        let formatted = err.format_simple();
        assert!(formatted.contains("Duplicate Review Error"));
        assert!(formatted.contains("already reviewed"));
    }
}
