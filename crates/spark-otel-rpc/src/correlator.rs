//! 调用事件关联：两种角色共用的单一分发例程。
//!
//! # 教案式说明
//! - **契约（What）**：
//!
//!   | 事件 | 动作 |
//!   |---|---|
//!   | `Begin` / `InHeader` / `InTrailer` / `OutTrailer` | 无 |
//!   | `InPayload` | 有关联状态时：接收计数 +1 得到序号，记录请求大小；总是：追加 `RECEIVED` 消息事件 |
//!   | `OutPayload` | 与 `InPayload` 对称（发送计数、响应大小、`SENT` 事件） |
//!   | `OutHeader` | 对端地址可解析时为 Span 附加对端属性 |
//!   | `End` | 计算完成结果，设置状态与状态码并结束 Span；以“身份属性 + 状态码”记录耗时，有关联状态时再记录收发消息数 |
//!
//! - **前置闸门**：关联状态存在且 `record == false` 时直接返回，不查看事件；句柄已标记结束时同样返回。
//! - **降级路径**：没有关联状态的句柄仍追加消息事件（序号 0），但跳过大小与计数指标。
//! - **并发（How）**：不持有任何锁；计数器的原子递增保证并发方向上的序号互不冲突。

use opentelemetry::KeyValue;
use spark_rpc_stats::{End, RpcStats};

use crate::{
    metrics::RpcInstruments,
    payload::payload_to_json,
    peer::peer_attributes,
    role::Role,
    span::{self, Direction, MessageEvent},
    state::TaggedRpc,
};

pub(crate) fn handle_rpc(
    role: &Role,
    instruments: &RpcInstruments,
    tagged: &TaggedRpc,
    stats: &RpcStats,
) {
    let state = tagged.call_state();
    if state.is_some_and(|state| !state.record()) {
        return;
    }
    if tagged.is_ended() {
        tracing::debug!(
            target: "spark_otel_rpc",
            role = role.label(),
            kind = stats.kind(),
            "rpc stats after end dropped"
        );
        return;
    }
    tracing::trace!(
        target: "spark_otel_rpc",
        role = role.label(),
        kind = stats.kind(),
        client = stats.is_client(),
        "dispatch rpc stats"
    );

    let cx = tagged.otel_context();
    match stats {
        RpcStats::InPayload(payload) => {
            let id = match state {
                Some(state) => {
                    let id = state.next_received();
                    instruments.record_request_size(payload.length, state.metric_attrs());
                    id
                }
                None => 0,
            };
            span::add_message_event(
                cx,
                MessageEvent {
                    direction: Direction::Received,
                    id,
                    compressed_size: payload.compressed_length,
                    uncompressed_size: payload.length,
                    payload: payload_to_json(payload.payload.as_ref()),
                },
            );
        }
        RpcStats::OutPayload(payload) => {
            let id = match state {
                Some(state) => {
                    let id = state.next_sent();
                    instruments.record_response_size(payload.length, state.metric_attrs());
                    id
                }
                None => 0,
            };
            span::add_message_event(
                cx,
                MessageEvent {
                    direction: Direction::Sent,
                    id,
                    compressed_size: payload.compressed_length,
                    uncompressed_size: payload.length,
                    payload: payload_to_json(payload.payload.as_ref()),
                },
            );
        }
        RpcStats::OutHeader(_) => {
            if let Some(peer) = tagged.rpc_context().peer() {
                let attributes = peer_attributes(peer.addr());
                if !attributes.is_empty() {
                    span::set_attributes(cx, attributes);
                }
            }
        }
        RpcStats::End(end) => finish_call(role, instruments, tagged, end),
        _ => {}
    }
}

fn finish_call(role: &Role, instruments: &RpcInstruments, tagged: &TaggedRpc, end: &End) {
    if !tagged.mark_ended() {
        return;
    }
    let state = tagged.call_state();
    if state.is_none() {
        tracing::debug!(
            target: "spark_otel_rpc",
            role = role.label(),
            "rpc ended without call state, message metrics skipped"
        );
    }

    let completion = role.completion(end.error.as_ref());
    let code = completion.code;
    span::finish(tagged.otel_context(), completion);

    let identity = state.map(|state| state.metric_attrs()).unwrap_or_default();
    let mut attrs: Vec<KeyValue> = Vec::with_capacity(identity.len() + 1);
    attrs.extend_from_slice(identity);
    attrs.push(span::status_code_attribute(code));

    instruments.record_duration(end.begin_time, end.end_time, &attrs);
    if let Some(state) = state {
        instruments.record_message_counts(state.messages_received(), state.messages_sent(), &attrs);
    }
}
