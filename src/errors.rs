//! 评分服务的错误类型
//!
//! 每个变体对应一个稳定的错误代码（E0xx），调用方按代码区分
//! 校验失败、资源缺失和权限不足等情况。

use std::fmt;

/// 由 `变体(代码, 类型名)` 列表生成 `HWSystemError`
///
/// 同时生成 `code`、`error_type`、`message` 三个访问方法，
/// 以及每个变体的 snake_case 构造函数（如 `not_found`）。
macro_rules! define_hwsystem_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum HWSystemError {
            $($variant(String),)*
        }

        impl HWSystemError {
            pub fn code(&self) -> &'static str {
                match self {
                    $(HWSystemError::$variant(_) => $code,)*
                }
            }

            pub fn error_type(&self) -> &'static str {
                match self {
                    $(HWSystemError::$variant(_) => $type_name,)*
                }
            }

            pub fn message(&self) -> &str {
                match self {
                    $(HWSystemError::$variant(msg) => msg,)*
                }
            }
        }

        paste::paste! {
            impl HWSystemError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        HWSystemError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

// 代码一经分配不再复用
define_hwsystem_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    Configuration("E002", "Configuration Error"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    DateParse("E011", "Date Parse Error"),
    Authorization("E013", "Authorization Error"),
}

impl fmt::Display for HWSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code(), self.error_type(), self.message())
    }
}

impl std::error::Error for HWSystemError {}

impl From<sea_orm::DbErr> for HWSystemError {
    fn from(err: sea_orm::DbErr) -> Self {
        HWSystemError::DatabaseOperation(err.to_string())
    }
}

// 存储中的 JSON 列
impl From<serde_json::Error> for HWSystemError {
    fn from(err: serde_json::Error) -> Self {
        HWSystemError::Serialization(err.to_string())
    }
}

// 存储中的重置时刻列
impl From<chrono::ParseError> for HWSystemError {
    fn from(err: chrono::ParseError) -> Self {
        HWSystemError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HWSystemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(HWSystemError::cache_connection("test").code(), "E001");
        assert_eq!(HWSystemError::configuration("test").code(), "E002");
        assert_eq!(HWSystemError::database_config("test").code(), "E003");
        assert_eq!(HWSystemError::validation("test").code(), "E007");
        assert_eq!(HWSystemError::not_found("test").code(), "E008");
        assert_eq!(HWSystemError::authorization("test").code(), "E013");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            HWSystemError::configuration("test").error_type(),
            "Configuration Error"
        );
        assert_eq!(
            HWSystemError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = HWSystemError::not_found("no hint config");
        assert_eq!(err.message(), "no hint config");
        assert_eq!(
            err.to_string(),
            "[E008] Resource Not Found: no hint config"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: HWSystemError = serde_json::from_str::<Vec<String>>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "E009");
    }

    #[test]
    fn test_from_chrono_parse_error() {
        let err: HWSystemError = chrono::NaiveTime::parse_from_str("25:00:00", "%H:%M:%S")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "E011");
    }
}
