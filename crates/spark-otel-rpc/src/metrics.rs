//! RPC 指标仪表登记与记录。
//!
//! # 教案式说明
//! - **契约（What）**：每个处理器在构造时创建五个直方图，此后只读；名称形如 `rpc.{role}.{suffix}`：
//!
//!   | 仪表 | 单位 | 取值 |
//!   |---|---|---|
//!   | `duration` | `ms` | 调用耗时（浮点毫秒） |
//!   | `request.size` | `By` | 收到消息的解压后长度 |
//!   | `response.size` | `By` | 发出消息的解压后长度 |
//!   | `requests_per_rpc` | `{count}` | 调用结束时的接收消息数 |
//!   | `responses_per_rpc` | `{count}` | 调用结束时的发送消息数 |
//!
//! - **逻辑（How）**：仪表描述集中在 [`InstrumentSpec`] 常量中，构造时按角色拼出完整名称。

use std::time::SystemTime;

use opentelemetry::{
    KeyValue,
    metrics::{Histogram, Meter, Unit},
};

/// 仪表的静态描述：名称后缀、说明与单位。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentSpec {
    suffix: &'static str,
    description: &'static str,
    unit: &'static str,
}

impl InstrumentSpec {
    pub const fn new(suffix: &'static str) -> Self {
        Self {
            suffix,
            description: "",
            unit: "",
        }
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// 按角色拼出完整仪表名。
    pub fn name(&self, role: &str) -> String {
        format!("rpc.{role}.{}", self.suffix)
    }

    #[must_use]
    pub const fn unit(&self) -> &'static str {
        self.unit
    }
}

pub const DURATION: InstrumentSpec = InstrumentSpec::new("duration")
    .with_description("Measures the duration of inbound or outbound RPC.")
    .with_unit("ms");

pub const REQUEST_SIZE: InstrumentSpec = InstrumentSpec::new("request.size")
    .with_description("Measures size of RPC request messages (uncompressed).")
    .with_unit("By");

pub const RESPONSE_SIZE: InstrumentSpec = InstrumentSpec::new("response.size")
    .with_description("Measures size of RPC response messages (uncompressed).")
    .with_unit("By");

pub const REQUESTS_PER_RPC: InstrumentSpec = InstrumentSpec::new("requests_per_rpc")
    .with_description("Measures the number of messages received per RPC.")
    .with_unit("{count}");

pub const RESPONSES_PER_RPC: InstrumentSpec = InstrumentSpec::new("responses_per_rpc")
    .with_description("Measures the number of messages sent per RPC.")
    .with_unit("{count}");

/// 处理器持有的五个仪表。
pub(crate) struct RpcInstruments {
    duration: Histogram<f64>,
    request_size: Histogram<u64>,
    response_size: Histogram<u64>,
    requests_per_rpc: Histogram<u64>,
    responses_per_rpc: Histogram<u64>,
}

impl RpcInstruments {
    pub(crate) fn new(meter: &Meter, role: &str) -> Self {
        Self {
            duration: meter
                .f64_histogram(DURATION.name(role))
                .with_description(DURATION.description)
                .with_unit(Unit::new(DURATION.unit))
                .init(),
            request_size: u64_histogram(meter, REQUEST_SIZE, role),
            response_size: u64_histogram(meter, RESPONSE_SIZE, role),
            requests_per_rpc: u64_histogram(meter, REQUESTS_PER_RPC, role),
            responses_per_rpc: u64_histogram(meter, RESPONSES_PER_RPC, role),
        }
    }

    pub(crate) fn record_request_size(&self, length: usize, attrs: &[KeyValue]) {
        self.request_size.record(length as u64, attrs);
    }

    pub(crate) fn record_response_size(&self, length: usize, attrs: &[KeyValue]) {
        self.response_size.record(length as u64, attrs);
    }

    pub(crate) fn record_duration(&self, begin: SystemTime, end: SystemTime, attrs: &[KeyValue]) {
        self.duration.record(elapsed_millis(begin, end), attrs);
    }

    pub(crate) fn record_message_counts(&self, received: u64, sent: u64, attrs: &[KeyValue]) {
        self.requests_per_rpc.record(received, attrs);
        self.responses_per_rpc.record(sent, attrs);
    }
}

fn u64_histogram(meter: &Meter, spec: InstrumentSpec, role: &str) -> Histogram<u64> {
    meter
        .u64_histogram(spec.name(role))
        .with_description(spec.description)
        .with_unit(Unit::new(spec.unit))
        .init()
}

/// 结束时间早于开始时间（时钟回拨）时记为 0。
pub(crate) fn elapsed_millis(begin: SystemTime, end: SystemTime) -> f64 {
    end.duration_since(begin)
        .map(|elapsed| elapsed.as_secs_f64() * 1_000.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn names_are_prefixed_by_role() {
        assert_eq!(DURATION.name("server"), "rpc.server.duration");
        assert_eq!(REQUEST_SIZE.name("client"), "rpc.client.request.size");
        assert_eq!(RESPONSES_PER_RPC.name("server"), "rpc.server.responses_per_rpc");
        assert_eq!(REQUESTS_PER_RPC.unit(), "{count}");
    }

    #[test]
    fn elapsed_keeps_sub_millisecond_precision() {
        let begin = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let ms = elapsed_millis(begin, begin + Duration::from_micros(1_250));
        assert!((ms - 1.25).abs() < 1e-9, "期望 1.25ms，实际 {ms}");
    }

    #[test]
    fn clock_skew_clamps_to_zero() {
        let end = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        assert_eq!(elapsed_millis(end + Duration::from_millis(5), end), 0.0);
    }
}
