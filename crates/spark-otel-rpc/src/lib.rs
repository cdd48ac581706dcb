//! spark-otel-rpc：把 RPC 传输层的生命周期通知转换为 OpenTelemetry Span 与指标。
//!
//! # 教案式说明
//! - **意图（Why）**：在不修改业务逻辑的前提下，为每次调用产出一条带消息事件的 Span，并在调用结束时记录
//!   大小、耗时与消息数指标。
//! - **架构（Where）**：
//!   - [`ServerHandler`] / [`ClientHandler`]：注册给传输层的 [`spark_rpc_stats::StatsHandler`] 实现；
//!   - `correlator`：两种角色共用的事件分发例程；
//!   - [`CallState`]：单次调用的原子计数器与身份属性，经 [`TaggedRpc`] 句柄显式传递；
//!   - [`metrics`]：五个直方图仪表，处理器构造时一次性创建；
//!   - [`payload_to_json`]：消息负载的诊断文本。
//! - **契约（What）**：本 crate 不向调用方抛出任何错误；调用失败、序列化失败与状态缺失都折算为 Span 状态、
//!   诊断文本或更少的指标。唯一的错误类型 [`Error`] 只出现在宿主引导 [`install`] 中。
//!
//! ```no_run
//! use spark_otel_rpc::{HandlerOptions, ServerHandler};
//! use spark_rpc_stats::{RpcContext, RpcTagInfo, StatsHandler};
//!
//! spark_otel_rpc::install().expect("install observability");
//! let handler = ServerHandler::new(HandlerOptions::new());
//! let tagged = handler.tag_rpc(RpcContext::new(), &RpcTagInfo::new("/pkg.Service/Method"));
//! ```

mod config;
mod correlator;
mod handler;
mod install;
mod method;
pub mod metrics;
mod payload;
mod peer;
mod propagation;
mod role;
pub mod semconv;
mod span;
mod state;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{Filter, HandlerOptions};
pub use handler::{ClientHandler, ServerHandler};
pub use install::{Error, install, install_with};
pub use method::parse_full_method;
pub use payload::payload_to_json;
pub use peer::peer_attributes;
pub use role::{ServerStatusPolicy, default_server_status};
pub use state::{CallState, TaggedRpc};

