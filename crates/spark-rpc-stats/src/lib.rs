//! spark-rpc-stats：RPC 传输层向观测组件投递生命周期通知的契约层。
//!
//! # 教案式说明
//! - **定位（Where）**：传输实现（服务端/客户端连接驱动）与统计处理器之间的唯一接缝；本 crate 不依赖任何
//!   可观测性后端，只描述“事件长什么样、按什么顺序到达”。
//! - **契约（What）**：
//!   1. 传输层在一次调用的名字确定后调用 [`StatsHandler::tag_rpc`]，拿到调用级句柄；
//!   2. 此后的全部 [`RpcStats`] 事件都携带该句柄回调 [`StatsHandler::handle_rpc`]；
//!   3. [`RpcStats::End`] 是同一调用的最后一个事件，其后不再有任何投递。
//! - **并发（How）**：双向流调用中收/发方向的 Payload 事件可能来自不同线程并发到达，句柄类型因此要求
//!   `Send + Sync`。

pub mod context;
pub mod handler;
pub mod metadata;
pub mod payload;
pub mod peer;
pub mod stats;
pub mod status;

pub use context::{ConnContext, RpcContext};
pub use handler::StatsHandler;
pub use metadata::{Metadata, MetadataError};
pub use payload::{Payload, PayloadView, StructuredMessage};
pub use peer::Peer;
pub use stats::{
    Begin, BoxError, ConnStats, ConnTagInfo, End, InHeader, InPayload, InTrailer, OutHeader,
    OutPayload, OutTrailer, RpcStats, RpcTagInfo,
};
pub use status::{Code, Status};
