#![cfg(feature = "test-util")]

use std::time::{Duration, SystemTime};

use opentelemetry::{
    Context, Value,
    trace::{SpanKind, Status as SpanStatus, TraceContextExt},
};
use opentelemetry_sdk::export::trace::SpanData;
use spark_otel_rpc::{
    ClientHandler, ServerHandler, TaggedRpc, semconv::rpc, testing::TestTelemetry,
};
use spark_rpc_stats::{
    Code, End, InPayload, OutPayload, RpcContext, RpcStats, RpcTagInfo, StatsHandler, Status,
};

const METHOD: &str = "/helloworld.Greeter/SayHello";

fn window() -> (SystemTime, SystemTime) {
    let begin = SystemTime::UNIX_EPOCH + Duration::from_secs(1_800_000_000);
    (begin, begin + Duration::from_millis(12))
}

fn status_code(span: &SpanData) -> Option<Value> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == rpc::ATTR_GRPC_STATUS_CODE)
        .map(|kv| kv.value.clone())
}

/// 客户端与服务端各自走完一次调用，返回双方句柄。
fn round_trip(
    client: &ClientHandler,
    server: &ServerHandler,
    error: Option<Status>,
) -> (TaggedRpc, TaggedRpc) {
    let (begin, end) = window();
    let info = RpcTagInfo::new(METHOD);

    let client_call = client.tag_rpc_with_parent(&Context::new(), RpcContext::new(), &info);
    let server_cx = RpcContext::new().with_incoming(client_call.rpc_context().outgoing().clone());
    let server_call = server.tag_rpc(server_cx, &info);

    client.handle_rpc(&client_call, &RpcStats::OutPayload(OutPayload::new(None, 16)));
    server.handle_rpc(&server_call, &RpcStats::InPayload(InPayload::new(None, 16)));

    let finish = |error: &Option<Status>| match error {
        Some(status) => End::failed(begin, end, status.clone()),
        None => End::ok(begin, end),
    };
    server.handle_rpc(&server_call, &RpcStats::End(finish(&error)));
    client.handle_rpc(&client_call, &RpcStats::End(finish(&error)));
    (client_call, server_call)
}

fn span_of_kind(spans: &[SpanData], kind: SpanKind) -> SpanData {
    spans
        .iter()
        .find(|span| span.span_kind == kind)
        .cloned()
        .unwrap_or_else(|| panic!("缺少 {kind:?} Span"))
}

/// 客户端注入的 trace-context 被服务端提取，服务端 Span 成为客户端 Span 的子 Span。
#[test]
fn server_span_continues_client_trace() {
    let client_side = TestTelemetry::new();
    let server_side = TestTelemetry::new();
    let client = ClientHandler::new(client_side.options());
    let server = ServerHandler::new(server_side.options());

    let (client_call, _server_call) = round_trip(&client, &server, None);
    assert!(
        client_call.rpc_context().outgoing().get("traceparent").is_some(),
        "客户端必须向出站元数据注入 traceparent"
    );

    let client_span = span_of_kind(&client_side.finished_spans(), SpanKind::Client);
    let server_span = span_of_kind(&server_side.finished_spans(), SpanKind::Server);
    assert_eq!(client_span.name, "helloworld.Greeter/SayHello");
    assert_eq!(server_span.name, client_span.name);
    assert_eq!(
        server_span.span_context.trace_id(),
        client_span.span_context.trace_id(),
        "双方必须位于同一 trace"
    );
    assert_eq!(server_span.parent_span_id, client_span.span_context.span_id());
    assert_eq!(status_code(&client_span), Some(Value::I64(0)));
    assert_eq!(status_code(&server_span), Some(Value::I64(0)));

    assert_eq!(client_side.measurements_of("rpc.client.response.size").len(), 1);
    assert_eq!(server_side.measurements_of("rpc.server.request.size").len(), 1);
    assert!(client_side.measurements_of("rpc.server.duration").is_empty(), "仪表名必须区分角色");
}

/// 调用方取消：状态码两侧一致，只有客户端把 Span 标记为错误。
#[test]
fn cancellation_is_an_error_only_on_the_client() {
    let client_side = TestTelemetry::new();
    let server_side = TestTelemetry::new();
    let client = ClientHandler::new(client_side.options());
    let server = ServerHandler::new(server_side.options());

    round_trip(&client, &server, Some(Status::cancelled("context canceled")));

    let client_span = span_of_kind(&client_side.finished_spans(), SpanKind::Client);
    let server_span = span_of_kind(&server_side.finished_spans(), SpanKind::Server);
    assert_eq!(client_span.status, SpanStatus::error("context canceled"));
    assert_eq!(server_span.status, SpanStatus::Unset);

    let cancelled = Value::I64(i64::from(Code::Cancelled.as_i32()));
    assert_eq!(status_code(&client_span), Some(cancelled.clone()));
    assert_eq!(status_code(&server_span), Some(cancelled.clone()));
    for measurement in server_side.measurements_of("rpc.server.duration") {
        assert_eq!(measurement.attribute(rpc::ATTR_GRPC_STATUS_CODE), Some(&cancelled));
    }
}

/// 服务端故障类状态码在两侧都标记为错误。
#[test]
fn server_faults_are_errors_on_both_sides() {
    let client_side = TestTelemetry::new();
    let server_side = TestTelemetry::new();
    let client = ClientHandler::new(client_side.options());
    let server = ServerHandler::new(server_side.options());

    round_trip(&client, &server, Some(Status::unavailable("no healthy upstream")));

    let server_span = span_of_kind(&server_side.finished_spans(), SpanKind::Server);
    let client_span = span_of_kind(&client_side.finished_spans(), SpanKind::Client);
    assert_eq!(server_span.status, SpanStatus::error("no healthy upstream"));
    assert_eq!(client_span.status, SpanStatus::error("no healthy upstream"));
    assert_eq!(status_code(&server_span), Some(Value::I64(14)));
}

/// 非 `Status` 错误折叠为 UNKNOWN，服务端默认策略视其为错误。
#[test]
fn foreign_errors_become_unknown() {
    #[derive(Debug, thiserror::Error)]
    #[error("connection reset by peer")]
    struct Reset;

    let telemetry = TestTelemetry::new();
    let server = ServerHandler::new(telemetry.options());
    let (begin, end) = window();

    let call = server.tag_rpc(RpcContext::new(), &RpcTagInfo::new(METHOD));
    server.handle_rpc(&call, &RpcStats::End(End::failed(begin, end, Reset)));

    let span = span_of_kind(&telemetry.finished_spans(), SpanKind::Server);
    assert_eq!(span.status, SpanStatus::error("connection reset by peer"));
    assert_eq!(status_code(&span), Some(Value::I64(2)));
}

/// 可替换的服务端状态策略。
#[test]
fn server_status_policy_can_be_replaced() {
    fn everything_is_error(status: &Status) -> SpanStatus {
        SpanStatus::error(format!("{}: {}", status.code(), status.message()))
    }

    let telemetry = TestTelemetry::new();
    let server = ServerHandler::new(
        telemetry
            .options()
            .with_server_status_policy(everything_is_error),
    );
    let (begin, end) = window();

    let call = server.tag_rpc(RpcContext::new(), &RpcTagInfo::new(METHOD));
    server.handle_rpc(
        &call,
        &RpcStats::End(End::failed(begin, end, Status::not_found("user 42"))),
    );

    let span = span_of_kind(&telemetry.finished_spans(), SpanKind::Server);
    assert_eq!(span.status, SpanStatus::error("NOT_FOUND: user 42"));
}

/// 通过 trait 标记时，客户端 Span 以调用线程的当前上下文为父。
#[test]
fn client_tag_rpc_uses_current_context_as_parent() {
    let telemetry = TestTelemetry::new();
    let client = ClientHandler::new(telemetry.options());
    let (begin, end) = window();

    let outer = client.tag_rpc_with_parent(
        &Context::new(),
        RpcContext::new(),
        &RpcTagInfo::new("/outer.Service/Call"),
    );
    let outer_span_id = outer.otel_context().span().span_context().span_id();

    let inner = {
        let _guard = outer.otel_context().clone().attach();
        client.tag_rpc(RpcContext::new(), &RpcTagInfo::new(METHOD))
    };
    client.handle_rpc(&inner, &RpcStats::End(End::ok(begin, end)));
    client.handle_rpc(&outer, &RpcStats::End(End::ok(begin, end)));

    let spans = telemetry.finished_spans();
    let inner_span = spans
        .iter()
        .find(|span| span.name == "helloworld.Greeter/SayHello")
        .expect("内层调用 Span 必须导出");
    assert_eq!(inner_span.parent_span_id, outer_span_id);
}
