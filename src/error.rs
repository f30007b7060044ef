//! 错误类型定义
//!
//! 同步层的全部错误都归入 `DocSyncError`。本地的类型转换与变更集计算错误
//! 在发出任何请求之前产生；驱动层错误原样透传。

use thiserror::Error;

/// 同步层错误
#[derive(Debug, Error)]
pub enum DocSyncError {
    /// 类型强制转换失败（无法解析的日期或ObjectId字符串）
    #[error("字段 {field} 类型转换失败: {message}")]
    CoercionError { field: String, message: String },

    /// 原子字段被赋予了非数值
    #[error("Atomic property {field} set to NaN")]
    AtomicTypeError { field: String },

    /// 验证错误（唯一性冲突或其他存储端约束）
    #[error("字段 {field} 验证失败: {message}")]
    ValidationError { field: String, message: String },

    /// 驱动或网络错误
    #[error("传输错误: {message}")]
    TransportError { message: String },

    /// 驱动报告的唯一键冲突，由同步层映射为 ValidationError
    #[error("唯一键冲突 {field}: {message}")]
    DuplicateKey { field: String, message: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    ConfigError { message: String },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    SerializationError { message: String },

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),
}

/// 同步层结果类型
pub type DocSyncResult<T> = Result<T, DocSyncError>;

impl DocSyncError {
    /// 是否为本地产生的错误（请求尚未发出）
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            DocSyncError::CoercionError { .. } | DocSyncError::AtomicTypeError { .. }
        )
    }

    /// 将唯一键冲突映射为以字段名为键的验证错误，其余错误原样返回
    pub fn into_validation(self) -> Self {
        match self {
            DocSyncError::DuplicateKey { field, message } => DocSyncError::ValidationError {
                field,
                message: format!("唯一性冲突: {}", message),
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for DocSyncError {
    fn from(err: serde_json::Error) -> Self {
        DocSyncError::SerializationError {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for DocSyncError {
    fn from(err: toml::de::Error) -> Self {
        DocSyncError::ConfigError {
            message: format!("解析TOML失败: {}", err),
        }
    }
}

/// 快速构建常用错误
///
/// ```ignore
/// docsync_error!(coercion, "created", "无法解析日期");
/// docsync_error!(validation, "email", "唯一性冲突");
/// docsync_error!(transport, "连接已关闭");
/// docsync_error!(config, "未设置默认别名");
/// ```
#[macro_export]
macro_rules! docsync_error {
    (coercion, $field:expr, $msg:expr) => {
        $crate::error::DocSyncError::CoercionError {
            field: $field.to_string(),
            message: $msg.to_string(),
        }
    };
    (atomic, $field:expr) => {
        $crate::error::DocSyncError::AtomicTypeError {
            field: $field.to_string(),
        }
    };
    (validation, $field:expr, $msg:expr) => {
        $crate::error::DocSyncError::ValidationError {
            field: $field.to_string(),
            message: $msg.to_string(),
        }
    };
    (duplicate, $field:expr, $msg:expr) => {
        $crate::error::DocSyncError::DuplicateKey {
            field: $field.to_string(),
            message: $msg.to_string(),
        }
    };
    (transport, $msg:expr) => {
        $crate::error::DocSyncError::TransportError {
            message: $msg.to_string(),
        }
    };
    (config, $msg:expr) => {
        $crate::error::DocSyncError::ConfigError {
            message: $msg.to_string(),
        }
    };
    (serialization, $msg:expr) => {
        $crate::error::DocSyncError::SerializationError {
            message: $msg.to_string(),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_error_message() {
        let err = docsync_error!(atomic, "age");
        assert_eq!(err.to_string(), "Atomic property age set to NaN");
        assert!(err.is_local());
    }

    #[test]
    fn test_duplicate_maps_to_validation() {
        let err = docsync_error!(duplicate, "email", "E11000").into_validation();
        match err {
            DocSyncError::ValidationError { field, .. } => assert_eq!(field, "email"),
            other => panic!("期望ValidationError，实际: {:?}", other),
        }

        let err = docsync_error!(transport, "boom").into_validation();
        assert!(matches!(err, DocSyncError::TransportError { .. }));
    }
}
