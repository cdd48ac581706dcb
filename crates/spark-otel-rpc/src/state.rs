//! 每次调用的关联状态与调用级句柄。
//!
//! # 教案式说明
//! - **契约（What）**：
//!   - [`CallState`] 每次调用恰好一份，于 `tag_rpc` 创建，只能经由该调用的 [`TaggedRpc`] 访问；
//!   - 两个消息计数器只增不减，且仅通过原子 `fetch_add` 修改；
//!   - `metric_attrs` 与 `record` 在创建后不可变；
//!   - 结束标记挂在 [`TaggedRpc`] 上而非关联状态里，由第一个被处理的 `End` 置位，之后的事件全部丢弃；
//!     不带关联状态的句柄同样受其约束。
//! - **并发（How）**：双向流的收/发事件可能在两个线程上同时推进各自的计数器；`fetch_add` 返回的前值加一即为
//!   该消息的序号，因此同一方向内序号唯一、连续且单调。
//! - **生命周期**：句柄析构时状态随之释放，无需额外清理。

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use opentelemetry::{Context, KeyValue};
use spark_rpc_stats::RpcContext;

/// 单次调用的关联状态。
#[derive(Debug)]
pub struct CallState {
    messages_received: AtomicU64,
    messages_sent: AtomicU64,
    metric_attrs: Vec<KeyValue>,
    record: bool,
}

impl CallState {
    pub(crate) fn new(metric_attrs: Vec<KeyValue>, record: bool) -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            metric_attrs,
            record,
        }
    }

    /// 过滤器是否允许记录本次调用的事件与指标。
    #[must_use]
    pub fn record(&self) -> bool {
        self.record
    }

    /// 调用身份属性（方法名相关属性 + `rpc.system`）。
    #[must_use]
    pub fn metric_attrs(&self) -> &[KeyValue] {
        &self.metric_attrs
    }

    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Acquire)
    }

    /// 递增接收计数并返回新值，即本条消息的序号。
    pub(crate) fn next_received(&self) -> u64 {
        self.messages_received.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// 递增发送计数并返回新值，即本条消息的序号。
    pub(crate) fn next_sent(&self) -> u64 {
        self.messages_sent.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// `tag_rpc` 返回的调用级句柄，传输层在后续每个事件中原样交回。
///
/// # 契约说明（What）
/// - 携带传输侧上下文、承载调用 Span 的 OpenTelemetry [`Context`] 与可选的 [`CallState`]；
/// - 客户端句柄的 `outgoing` 元数据已写入分布式上下文，传输层应据此发送请求头；
/// - 经 [`TaggedRpc::from_context`] 构造的句柄不带关联状态，属于降级路径：消息事件照常追加（序号为 0），
///   大小与计数指标被跳过；
/// - 克隆出的句柄共享同一个结束标记。
#[derive(Clone, Debug)]
pub struct TaggedRpc {
    rpc: RpcContext,
    otel: Context,
    state: Option<Arc<CallState>>,
    ended: Arc<AtomicBool>,
}

impl TaggedRpc {
    pub(crate) fn new(rpc: RpcContext, otel: Context, state: CallState) -> Self {
        Self {
            rpc,
            otel,
            state: Some(Arc::new(state)),
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 由外部已持有的 Span 上下文构造不带关联状态的句柄。
    #[must_use]
    pub fn from_context(rpc: RpcContext, otel: Context) -> Self {
        Self {
            rpc,
            otel,
            state: None,
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn rpc_context(&self) -> &RpcContext {
        &self.rpc
    }

    /// 承载调用 Span 的上下文；业务代码可在其下创建子 Span。
    #[must_use]
    pub fn otel_context(&self) -> &Context {
        &self.otel
    }

    #[must_use]
    pub fn call_state(&self) -> Option<&CallState> {
        self.state.as_deref()
    }

    /// 是否已处理过本次调用的 `End`。
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    /// 标记调用已结束；仅第一次调用返回 `true`。
    pub(crate) fn mark_ended(&self) -> bool {
        !self.ended.swap(true, Ordering::AcqRel)
    }

    pub fn into_parts(self) -> (RpcContext, Context) {
        (self.rpc, self.otel)
    }
}
