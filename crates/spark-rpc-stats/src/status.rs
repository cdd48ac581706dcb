//! RPC 状态码与状态对象。
//!
//! 状态码取值与 gRPC 协议定义一致（`Ok = 0` 至 `Unauthenticated = 16`），观测层据此生成
//! `rpc.grpc.status_code` 属性，因此数值不可调整。

use std::{error::Error as StdError, fmt};

use thiserror::Error;

/// gRPC 协议定义的 17 个状态码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum Code {
    /// 成功。
    Ok = 0,
    /// 调用被（通常是调用方）取消。
    Cancelled = 1,
    /// 未知错误。
    #[default]
    Unknown = 2,
    /// 参数非法。
    InvalidArgument = 3,
    /// 截止时间已过。
    DeadlineExceeded = 4,
    /// 资源不存在。
    NotFound = 5,
    /// 资源已存在。
    AlreadyExists = 6,
    /// 权限不足。
    PermissionDenied = 7,
    /// 资源耗尽。
    ResourceExhausted = 8,
    /// 前置条件不满足。
    FailedPrecondition = 9,
    /// 操作中止。
    Aborted = 10,
    /// 超出有效范围。
    OutOfRange = 11,
    /// 未实现。
    Unimplemented = 12,
    /// 内部错误。
    Internal = 13,
    /// 服务不可用。
    Unavailable = 14,
    /// 数据丢失或损坏。
    DataLoss = 15,
    /// 未认证。
    Unauthenticated = 16,
}

impl Code {
    /// 由线上的整数值还原状态码；未识别的数值统一视为 [`Code::Unknown`]。
    #[must_use]
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::Ok,
            1 => Self::Cancelled,
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition,
            10 => Self::Aborted,
            11 => Self::OutOfRange,
            12 => Self::Unimplemented,
            13 => Self::Internal,
            14 => Self::Unavailable,
            15 => Self::DataLoss,
            16 => Self::Unauthenticated,
            _ => Self::Unknown,
        }
    }

    /// 线上整数值。
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// gRPC 协议中的大写名称，例如 `DEADLINE_EXCEEDED`。
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Aborted => "ABORTED",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::DataLoss => "DATA_LOSS",
            Self::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RPC 调用结果：状态码 + 可读消息。
///
/// # 教案式说明
/// - **契约（What）**：实现 [`std::error::Error`]，传输层可以直接把它作为 `End.error` 投递；
///   [`Status::from_error`] 会沿错误链把它原样找回来。
/// - **逻辑（How）**：非 `Status` 的任意错误被折叠为 [`Code::Unknown`]，消息取错误的 `Display` 文本。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rpc status {code}: {message}")]
pub struct Status {
    code: Code,
    message: String,
}

impl Status {
    /// 以给定状态码与消息构造。
    #[must_use]
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 成功状态，消息为空。
    #[must_use]
    pub fn ok() -> Self {
        Self::new(Code::Ok, String::new())
    }

    #[must_use]
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(Code::Cancelled, message)
    }

    #[must_use]
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(Code::DeadlineExceeded, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable, message)
    }

    /// 状态码。
    #[must_use]
    pub fn code(&self) -> Code {
        self.code
    }

    /// 状态消息。
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 是否成功。
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }

    /// 把任意错误解包为 RPC 状态。
    ///
    /// # 契约说明（What）
    /// - 沿 [`StdError::source`] 链查找第一个 [`Status`]，找到即返回其副本；
    /// - 链上没有 `Status` 时返回 `Unknown`，消息为最外层错误的 `Display` 文本。
    #[must_use]
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut cursor = Some(err);
        while let Some(current) = cursor {
            if let Some(status) = current.downcast_ref::<Status>() {
                return status.clone();
            }
            cursor = current.source();
        }
        Self::new(Code::Unknown, err.to_string())
    }
}
