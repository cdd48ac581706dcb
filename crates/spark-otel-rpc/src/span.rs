//! 调用 Span 的生命周期：开始 → 消息事件* → 设置状态 → 结束。
//!
//! 所有操作都通过 [`Context`] 内的活动 Span 完成；Span 结束后后端会忽略任何进一步的修改。

use std::borrow::Cow;

use opentelemetry::{
    Context, KeyValue,
    global::BoxedTracer,
    trace::{SpanKind, TraceContextExt, Tracer},
};
use spark_rpc_stats::Code;

use crate::{role::Completion, semconv};

/// 消息方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Received,
    Sent,
}

impl Direction {
    fn message_type(self) -> &'static str {
        match self {
            Direction::Received => semconv::message::TYPE_RECEIVED,
            Direction::Sent => semconv::message::TYPE_SENT,
        }
    }

    fn payload_key(self) -> &'static str {
        match self {
            Direction::Received => semconv::message::ATTR_REQUEST_PAYLOAD,
            Direction::Sent => semconv::message::ATTR_RESPONSE_PAYLOAD,
        }
    }
}

/// 一条消息事件的内容。
pub(crate) struct MessageEvent {
    pub(crate) direction: Direction,
    pub(crate) id: u64,
    pub(crate) compressed_size: usize,
    pub(crate) uncompressed_size: usize,
    pub(crate) payload: String,
}

/// 在 `parent` 之下开始调用 Span，返回承载新 Span 的上下文。
pub(crate) fn start(
    tracer: &BoxedTracer,
    parent: &Context,
    name: impl Into<Cow<'static, str>>,
    kind: SpanKind,
    attributes: Vec<KeyValue>,
) -> Context {
    let span = tracer
        .span_builder(name)
        .with_kind(kind)
        .with_attributes(attributes)
        .start_with_context(tracer, parent);
    parent.with_span(span)
}

pub(crate) fn add_message_event(cx: &Context, event: MessageEvent) {
    cx.span().add_event(
        semconv::message::EVENT_NAME,
        vec![
            KeyValue::new(semconv::message::ATTR_TYPE, event.direction.message_type()),
            KeyValue::new(semconv::message::ATTR_ID, saturating_i64(event.id)),
            KeyValue::new(
                semconv::message::ATTR_COMPRESSED_SIZE,
                saturating_i64(event.compressed_size as u64),
            ),
            KeyValue::new(
                semconv::message::ATTR_UNCOMPRESSED_SIZE,
                saturating_i64(event.uncompressed_size as u64),
            ),
            KeyValue::new(event.direction.payload_key(), event.payload),
        ],
    );
}

pub(crate) fn set_attributes(cx: &Context, attributes: Vec<KeyValue>) {
    let span = cx.span();
    for attribute in attributes {
        span.set_attribute(attribute);
    }
}

/// 设置完成状态与状态码属性并结束 Span。
pub(crate) fn finish(cx: &Context, completion: Completion) {
    let span = cx.span();
    span.set_attribute(status_code_attribute(completion.code));
    span.set_status(completion.span_status);
    span.end();
}

pub(crate) fn status_code_attribute(code: Code) -> KeyValue {
    KeyValue::new(semconv::rpc::ATTR_GRPC_STATUS_CODE, i64::from(code.as_i32()))
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
