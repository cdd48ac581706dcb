//! 处理器角色与完成状态策略。
//!
//! # 教案式说明
//! - **契约（What）**：服务端与客户端仅在三处不同：Span 类型、分布式上下文传播方向，以及调用结束时错误到
//!   Span 状态的映射。前两者由 [`Role`] 变体本身决定，第三项由 [`Role::Server`] 携带的策略函数给出，
//!   事件分发逻辑本身只有一份。
//! - **约束**：无论 Span 是否被标记为错误，数值状态码都会出现在完成指标的属性中。

use opentelemetry::trace::{SpanKind, Status as SpanStatus};
use spark_rpc_stats::{BoxError, Code, Status};

/// 服务端把 RPC 状态映射为 Span 状态的策略。
pub type ServerStatusPolicy = fn(&Status) -> SpanStatus;

/// 默认服务端策略，遵循 OpenTelemetry gRPC 语义约定。
///
/// `Unknown`、`DeadlineExceeded`、`Unimplemented`、`Internal`、`Unavailable`、`DataLoss` 代表服务端故障，
/// 标记为错误并附带状态消息；其余状态码（取消、参数非法、资源不存在等）归因于调用方，保持 `Unset`。
pub fn default_server_status(status: &Status) -> SpanStatus {
    match status.code() {
        Code::Unknown
        | Code::DeadlineExceeded
        | Code::Unimplemented
        | Code::Internal
        | Code::Unavailable
        | Code::DataLoss => SpanStatus::error(status.message().to_string()),
        _ => SpanStatus::Unset,
    }
}

/// 处理器角色。
#[derive(Clone, Copy)]
pub(crate) enum Role {
    Server { status_policy: ServerStatusPolicy },
    Client,
}

/// 调用结束时计算出的完成结果。
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Completion {
    pub(crate) span_status: SpanStatus,
    pub(crate) code: Code,
}

impl Role {
    /// 指标名中的角色段，同时用于日志字段。
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Role::Server { .. } => "server",
            Role::Client => "client",
        }
    }

    pub(crate) fn span_kind(&self) -> SpanKind {
        match self {
            Role::Server { .. } => SpanKind::Server,
            Role::Client => SpanKind::Client,
        }
    }

    /// 计算完成结果：成功调用为 `Unset` + [`Code::Ok`]；失败调用先解包为 RPC 状态，再按角色映射。
    pub(crate) fn completion(&self, error: Option<&BoxError>) -> Completion {
        let Some(error) = error else {
            return Completion {
                span_status: SpanStatus::Unset,
                code: Code::Ok,
            };
        };
        let source: &(dyn std::error::Error + 'static) = &**error;
        let status = Status::from_error(source);
        let span_status = match self {
            Role::Server { status_policy } => status_policy(&status),
            Role::Client => SpanStatus::error(status.message().to_string()),
        };
        Completion {
            span_status,
            code: status.code(),
        }
    }
}
