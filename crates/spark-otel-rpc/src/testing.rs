//! 测试辅助：收集已结束 Span 的内存导出器、记录每次观测的 Meter，以及把两者接入处理器的测试夹具。
//!
//! # 教案式说明
//! - **定位（Where）**：仅在 `test-util` 特性（或本 crate 自身的单元测试）下构建，不进入生产路径。
//! - **契约（What）**：
//!   - [`InMemorySpanExporter`]：同步追加导出批次，`finished_spans` 返回快照；
//!   - [`RecordingMeter`]：实现 OpenTelemetry 仪表提供者，直方图每次 `record` 都被原样保存为
//!     [`Measurement`]；
//!   - [`TestTelemetry`]：一套彼此隔离的 Provider + 导出器 + Meter，`options()` 直接产出处理器配置。
//! - **并发（How）**：缓冲使用 `parking_lot::Mutex`，锁不会中毒，断言路径无需处理锁错误。

use std::{any::Any, borrow::Cow, sync::Arc};

use futures_util::future::BoxFuture;
use opentelemetry::{
    KeyValue, Value,
    metrics::{
        self, CallbackRegistration, Histogram, InstrumentProvider, Meter, Observer, SyncHistogram,
        Unit, noop::NoopRegistration,
    },
};
use opentelemetry_sdk::{
    export::trace::{ExportResult, SpanData, SpanExporter},
    propagation::TraceContextPropagator,
    trace::{self, TracerProvider},
};
use parking_lot::Mutex;

use crate::config::HandlerOptions;

/// 收集已结束 Span 的导出器。
#[derive(Clone, Debug, Default)]
pub struct InMemorySpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemorySpanExporter {
    /// 当前已收集 Span 的副本。
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans.lock().clone()
    }

    pub fn reset(&self) {
        self.spans.lock().clear();
    }
}

impl SpanExporter for InMemorySpanExporter {
    fn export(&mut self, mut batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        self.spans.lock().append(&mut batch);
        Box::pin(async { Ok(()) })
    }

    fn shutdown(&mut self) {
        self.reset();
    }
}

/// 一次直方图观测。
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub instrument: String,
    pub unit: Option<String>,
    pub value: MeasuredValue,
    pub attributes: Vec<KeyValue>,
}

impl Measurement {
    /// 按键查找属性值。
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }
}

/// 观测值；整数直方图与浮点直方图分别保存。
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeasuredValue {
    U64(u64),
    F64(f64),
}

impl MeasuredValue {
    pub fn as_f64(self) -> f64 {
        match self {
            MeasuredValue::U64(value) => value as f64,
            MeasuredValue::F64(value) => value,
        }
    }
}

/// 记录全部观测的 Meter 后端。
#[derive(Clone, Debug, Default)]
pub struct RecordingMeter {
    records: Arc<Mutex<Vec<Measurement>>>,
}

impl RecordingMeter {
    /// 以本后端构造 OpenTelemetry [`Meter`]。
    pub fn meter(&self) -> Meter {
        Meter::new(Arc::new(self.clone()))
    }

    pub fn measurements(&self) -> Vec<Measurement> {
        self.records.lock().clone()
    }

    /// 指定仪表的全部观测，按记录顺序排列。
    pub fn measurements_of(&self, instrument: &str) -> Vec<Measurement> {
        self.records
            .lock()
            .iter()
            .filter(|m| m.instrument == instrument)
            .cloned()
            .collect()
    }

    pub fn reset(&self) {
        self.records.lock().clear();
    }

    fn histogram(&self, name: Cow<'static, str>, unit: Option<Unit>) -> RecordingHistogram {
        RecordingHistogram {
            instrument: name.into_owned(),
            unit: unit.map(|unit| unit.as_str().to_string()),
            records: self.records.clone(),
        }
    }
}

impl InstrumentProvider for RecordingMeter {
    fn u64_histogram(
        &self,
        name: Cow<'static, str>,
        _description: Option<Cow<'static, str>>,
        unit: Option<Unit>,
    ) -> metrics::Result<Histogram<u64>> {
        Ok(Histogram::new(Arc::new(self.histogram(name, unit))))
    }

    fn f64_histogram(
        &self,
        name: Cow<'static, str>,
        _description: Option<Cow<'static, str>>,
        unit: Option<Unit>,
    ) -> metrics::Result<Histogram<f64>> {
        Ok(Histogram::new(Arc::new(self.histogram(name, unit))))
    }

    /// 处理器只使用同步直方图，异步回调无需记录。
    fn register_callback(
        &self,
        _instruments: &[Arc<dyn Any>],
        _callback: Box<dyn Fn(&dyn Observer) + Send + Sync>,
    ) -> metrics::Result<Box<dyn CallbackRegistration>> {
        Ok(Box::new(NoopRegistration::new()))
    }
}

struct RecordingHistogram {
    instrument: String,
    unit: Option<String>,
    records: Arc<Mutex<Vec<Measurement>>>,
}

impl RecordingHistogram {
    fn push(&self, value: MeasuredValue, attributes: &[KeyValue]) {
        self.records.lock().push(Measurement {
            instrument: self.instrument.clone(),
            unit: self.unit.clone(),
            value,
            attributes: attributes.to_vec(),
        });
    }
}

impl SyncHistogram<u64> for RecordingHistogram {
    fn record(&self, value: u64, attributes: &[KeyValue]) {
        self.push(MeasuredValue::U64(value), attributes);
    }
}

impl SyncHistogram<f64> for RecordingHistogram {
    fn record(&self, value: f64, attributes: &[KeyValue]) {
        self.push(MeasuredValue::F64(value), attributes);
    }
}

/// 单个测试专用的遥测夹具。
pub struct TestTelemetry {
    provider: TracerProvider,
    exporter: InMemorySpanExporter,
    meter: RecordingMeter,
}

impl Default for TestTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTelemetry {
    pub fn new() -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_config(trace::config().with_sampler(trace::Sampler::AlwaysOn))
            .with_simple_exporter(exporter.clone())
            .build();
        Self {
            provider,
            exporter,
            meter: RecordingMeter::default(),
        }
    }

    /// 接入本夹具的处理器配置：独立 Provider、记录型 Meter 与 W3C 传播器。
    pub fn options(&self) -> HandlerOptions {
        HandlerOptions::new()
            .with_tracer_provider(&self.provider)
            .with_meter(self.meter.meter())
            .with_propagator(Arc::new(TraceContextPropagator::new()))
    }

    pub fn provider(&self) -> &TracerProvider {
        &self.provider
    }

    /// 刷新后返回全部已结束 Span。
    pub fn finished_spans(&self) -> Vec<SpanData> {
        for result in self.provider.force_flush() {
            if let Err(err) = result {
                tracing::debug!(target: "spark_otel_rpc", error = %err, "force flush failed");
            }
        }
        self.exporter.finished_spans()
    }

    pub fn meter(&self) -> &RecordingMeter {
        &self.meter
    }

    pub fn measurements_of(&self, instrument: &str) -> Vec<Measurement> {
        self.meter.measurements_of(instrument)
    }
}
