//! 分布式上下文在调用元数据上的注入与提取。
//!
//! 提取失败（无头部、格式非法）得到不含远程 Span 的上下文；注入时被元数据拒绝的键值仅记录日志。

use std::sync::Arc;

use opentelemetry::{
    Context, global,
    propagation::{Extractor, Injector, TextMapPropagator},
};
use spark_rpc_stats::Metadata;

/// 处理器使用的传播器；未显式配置时回落到进程全局传播器。
#[derive(Clone, Default)]
pub(crate) struct Propagation {
    propagator: Option<Arc<dyn TextMapPropagator + Send + Sync>>,
}

impl Propagation {
    pub(crate) fn new(propagator: Option<Arc<dyn TextMapPropagator + Send + Sync>>) -> Self {
        Self { propagator }
    }

    /// 从入站元数据提取远程上下文，以 `base` 为基底。
    pub(crate) fn extract(&self, base: &Context, metadata: &Metadata) -> Context {
        let extractor = MetadataExtractor(metadata);
        match &self.propagator {
            Some(propagator) => propagator.extract_with_context(base, &extractor),
            None => global::get_text_map_propagator(|propagator| {
                propagator.extract_with_context(base, &extractor)
            }),
        }
    }

    /// 把 `cx` 中的 Span 上下文写入出站元数据。
    pub(crate) fn inject(&self, cx: &Context, metadata: &mut Metadata) {
        let mut injector = MetadataInjector(metadata);
        match &self.propagator {
            Some(propagator) => propagator.inject_context(cx, &mut injector),
            None => global::get_text_map_propagator(|propagator| {
                propagator.inject_context(cx, &mut injector)
            }),
        }
    }
}

struct MetadataExtractor<'a>(&'a Metadata);

impl Extractor for MetadataExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().collect()
    }
}

struct MetadataInjector<'a>(&'a mut Metadata);

impl Injector for MetadataInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let Err(err) = self.0.insert(key.to_ascii_lowercase(), value) {
            tracing::debug!(target: "spark_otel_rpc", error = %err, "propagation field rejected by metadata");
        }
    }
}
