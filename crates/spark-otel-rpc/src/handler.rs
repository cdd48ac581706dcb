//! 服务端与客户端统计处理器。
//!
//! # 教案式说明
//! - **契约（What）**：两种处理器实现同一 [`StatsHandler`] 能力集合：
//!   - `tag_conn` 原样返回上下文，`handle_conn` 不做任何事；
//!   - `tag_rpc` 解析方法名、开始 Span、创建关联状态并返回 [`TaggedRpc`]；
//!   - `handle_rpc` 交给共享的事件关联例程，被过滤的调用在 `End` 时仍由此处结束 Span。
//! - **角色差异**：服务端以提取出的远程上下文为父、Span 类型为 `Server`；客户端以调用方当前上下文为父、
//!   Span 类型为 `Client`，并把新 Span 注入出站元数据。
//! - **资源（How）**：Tracer 与五个指标仪表在构造时建立，之后只读，可在多线程间共享同一处理器。

use std::sync::Arc;

use opentelemetry::{Context, KeyValue, global::BoxedTracer};
use spark_rpc_stats::{
    ConnContext, ConnStats, ConnTagInfo, RpcContext, RpcStats, RpcTagInfo, StatsHandler,
};

use crate::{
    config::{Filter, HandlerOptions},
    correlator,
    method::parse_full_method,
    metrics::RpcInstruments,
    propagation::Propagation,
    role::Role,
    semconv::rpc,
    span,
    state::{CallState, TaggedRpc},
};

/// 两种角色共享的处理器内核。
struct Shared {
    role: Role,
    tracer: Arc<BoxedTracer>,
    instruments: RpcInstruments,
    propagation: Propagation,
    filter: Option<Filter>,
}

impl Shared {
    fn new(role: Role, mut options: HandlerOptions) -> Self {
        let tracer = options.resolve_tracer();
        let meter = options.resolve_meter();
        Self {
            instruments: RpcInstruments::new(&meter, role.label()),
            role,
            tracer,
            propagation: Propagation::new(options.propagator.take()),
            filter: options.filter.take(),
        }
    }

    /// 开始调用 Span 并建立关联状态。
    fn start_call(&self, parent: &Context, info: &RpcTagInfo) -> (Context, CallState) {
        let (name, mut attrs) = parse_full_method(&info.full_method_name);
        attrs.push(KeyValue::new(rpc::ATTR_SYSTEM, rpc::SYSTEM_GRPC));

        let cx = span::start(
            &self.tracer,
            parent,
            name,
            self.role.span_kind(),
            attrs.clone(),
        );

        let record = self.filter.as_ref().is_none_or(|filter| filter(info));
        if !record {
            tracing::debug!(
                target: "spark_otel_rpc",
                role = self.role.label(),
                method = %info.full_method_name,
                "rpc filtered out, recording disabled"
            );
        }
        (cx, CallState::new(attrs, record))
    }

    fn dispatch(&self, tagged: &TaggedRpc, stats: &RpcStats) {
        correlator::handle_rpc(&self.role, &self.instruments, tagged, stats);

        if let (RpcStats::End(end), Some(state)) = (stats, tagged.call_state()) {
            if !state.record() && tagged.mark_ended() {
                span::finish(tagged.otel_context(), self.role.completion(end.error.as_ref()));
            }
        }
    }
}

/// 服务端统计处理器。
pub struct ServerHandler {
    shared: Shared,
}

impl ServerHandler {
    pub fn new(options: HandlerOptions) -> Self {
        Self {
            shared: Shared::new(
                Role::Server {
                    status_policy: options.server_status,
                },
                options,
            ),
        }
    }
}

impl StatsHandler for ServerHandler {
    type Tagged = TaggedRpc;

    fn tag_conn(&self, cx: ConnContext, _info: &ConnTagInfo) -> ConnContext {
        cx
    }

    fn handle_conn(&self, _cx: &ConnContext, _stats: &ConnStats) {}

    /// 以入站元数据中提取的远程上下文为父开始 `Server` Span；没有远程上下文时为根 Span。
    fn tag_rpc(&self, cx: RpcContext, info: &RpcTagInfo) -> TaggedRpc {
        let parent = self
            .shared
            .propagation
            .extract(&Context::new(), cx.incoming());
        let (otel, state) = self.shared.start_call(&parent, info);
        TaggedRpc::new(cx, otel, state)
    }

    fn handle_rpc(&self, tagged: &TaggedRpc, stats: &RpcStats) {
        self.shared.dispatch(tagged, stats);
    }
}

/// 客户端统计处理器。
pub struct ClientHandler {
    shared: Shared,
}

impl ClientHandler {
    pub fn new(options: HandlerOptions) -> Self {
        Self {
            shared: Shared::new(Role::Client, options),
        }
    }

    /// 以显式父上下文标记调用；[`StatsHandler::tag_rpc`] 使用调用线程的当前上下文。
    pub fn tag_rpc_with_parent(
        &self,
        parent: &Context,
        mut cx: RpcContext,
        info: &RpcTagInfo,
    ) -> TaggedRpc {
        let (otel, state) = self.shared.start_call(parent, info);
        self.shared.propagation.inject(&otel, cx.outgoing_mut());
        TaggedRpc::new(cx, otel, state)
    }
}

impl StatsHandler for ClientHandler {
    type Tagged = TaggedRpc;

    fn tag_conn(&self, cx: ConnContext, _info: &ConnTagInfo) -> ConnContext {
        cx
    }

    fn handle_conn(&self, _cx: &ConnContext, _stats: &ConnStats) {}

    fn tag_rpc(&self, cx: RpcContext, info: &RpcTagInfo) -> TaggedRpc {
        self.tag_rpc_with_parent(&Context::current(), cx, info)
    }

    fn handle_rpc(&self, tagged: &TaggedRpc, stats: &RpcStats) {
        self.shared.dispatch(tagged, stats);
    }
}
