//! 处理器配置项。
//!
//! # 教案式说明
//! - **契约（What）**：[`HandlerOptions`] 以链式构造器收集可选配置，未设置的项回落到进程全局实现：
//!   - 传播器：`opentelemetry::global` 文本传播器；
//!   - Tracer / Meter：全局 Provider，instrumentation scope 为 `spark-otel-rpc` 与 crate 版本；
//!   - 过滤器：无，所有调用都记录；
//!   - 服务端状态策略：[`default_server_status`]。
//! - **生命周期（How）**：处理器构造时一次性消费配置，此后配置不可变。

use std::{fmt, sync::Arc};

use opentelemetry::{
    global::{self, BoxedTracer},
    metrics::{Meter, MeterProvider},
    propagation::TextMapPropagator,
    trace::{Span, Tracer, TracerProvider},
};
use spark_rpc_stats::RpcTagInfo;

use crate::{
    role::{ServerStatusPolicy, default_server_status},
    semconv::SCOPE_NAME,
};

/// 调用过滤谓词：返回 `false` 的调用不记录消息事件与指标。
pub type Filter = Arc<dyn Fn(&RpcTagInfo) -> bool + Send + Sync>;

/// 服务端/客户端处理器的可选配置。
#[derive(Clone)]
pub struct HandlerOptions {
    pub(crate) propagator: Option<Arc<dyn TextMapPropagator + Send + Sync>>,
    pub(crate) tracer: Option<Arc<BoxedTracer>>,
    pub(crate) meter: Option<Meter>,
    pub(crate) filter: Option<Filter>,
    pub(crate) server_status: ServerStatusPolicy,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            propagator: None,
            tracer: None,
            meter: None,
            filter: None,
            server_status: default_server_status,
        }
    }
}

impl HandlerOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定分布式上下文传播器。
    #[must_use]
    pub fn with_propagator(mut self, propagator: Arc<dyn TextMapPropagator + Send + Sync>) -> Self {
        self.propagator = Some(propagator);
        self
    }

    /// 从给定 Provider 获取 Tracer。
    #[must_use]
    pub fn with_tracer_provider<P, T, S>(mut self, provider: &P) -> Self
    where
        P: TracerProvider<Tracer = T>,
        T: Tracer<Span = S> + Send + Sync + 'static,
        S: Span + Send + Sync + 'static,
    {
        let tracer = provider.versioned_tracer(
            SCOPE_NAME,
            Some(env!("CARGO_PKG_VERSION")),
            None::<&'static str>,
            None,
        );
        self.tracer = Some(Arc::new(BoxedTracer::new(Box::new(tracer))));
        self
    }

    /// 从给定 Provider 获取 Meter。
    #[must_use]
    pub fn with_meter_provider<P>(mut self, provider: &P) -> Self
    where
        P: MeterProvider,
    {
        self.meter = Some(versioned_meter(provider));
        self
    }

    /// 直接使用已构造的 Meter。
    #[must_use]
    pub fn with_meter(mut self, meter: Meter) -> Self {
        self.meter = Some(meter);
        self
    }

    /// 设置调用过滤谓词。
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&RpcTagInfo) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// 替换服务端完成状态策略；客户端处理器忽略该项。
    #[must_use]
    pub fn with_server_status_policy(mut self, policy: ServerStatusPolicy) -> Self {
        self.server_status = policy;
        self
    }

    pub(crate) fn resolve_tracer(&mut self) -> Arc<BoxedTracer> {
        self.tracer.take().unwrap_or_else(|| {
            Arc::new(global::tracer_provider().versioned_tracer(
                SCOPE_NAME,
                Some(env!("CARGO_PKG_VERSION")),
                None::<&'static str>,
                None,
            ))
        })
    }

    pub(crate) fn resolve_meter(&mut self) -> Meter {
        self.meter
            .take()
            .unwrap_or_else(|| versioned_meter(&global::meter_provider()))
    }
}

fn versioned_meter<P: MeterProvider>(provider: &P) -> Meter {
    provider.versioned_meter(
        SCOPE_NAME,
        Some(env!("CARGO_PKG_VERSION")),
        None::<&'static str>,
        None,
    )
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("propagator", &self.propagator.is_some())
            .field("tracer", &self.tracer.is_some())
            .field("meter", &self.meter.is_some())
            .field("filter", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}
