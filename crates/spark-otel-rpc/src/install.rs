//! 宿主进程的一次性可观测性引导。
//!
//! # 教案式说明
//! - **逻辑（How）**：
//!   1. 拒绝重复安装，以及外部已设置全局 `tracing` Subscriber 的情形；
//!   2. 把 Tracer Provider 注册到 `opentelemetry::global`，并注册 W3C trace-context 传播器；
//!   3. 组装 `EnvFilter + fmt + tracing-opentelemetry` 三层 Subscriber 并设为全局默认；
//!   4. 持有 Provider 至进程结束。
//! - **契约（What）**：重复调用返回 [`Error::AlreadyInstalled`]。导出管线（OTLP 等）由调用方在 Provider 上配置。
//! - 使用默认配置构造的处理器（未显式指定 Provider 与传播器）在安装后自动接入。

use std::{borrow::Cow, sync::OnceLock};

use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{self, TracerProvider},
};
use thiserror::Error;
use tracing::dispatcher;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt};

use crate::semconv::SCOPE_NAME;

static INSTALL_STATE: OnceLock<InstallState> = OnceLock::new();

/// 引导阶段的失败。
#[derive(Debug, Error)]
pub enum Error {
    /// `install` 被重复调用。
    #[error("spark-otel-rpc 已完成安装，禁止重复调用 install")]
    AlreadyInstalled,
    /// 外部提前设置了全局 `tracing` Subscriber。
    #[error("全局 tracing Subscriber 已存在，spark-otel-rpc 无法覆盖")]
    SubscriberAlreadySet,
    /// 设置全局 Subscriber 失败。
    #[error("设置 tracing 全局 Subscriber 失败: {0}")]
    SetGlobalSubscriber(#[from] dispatcher::SetGlobalDefaultError),
}

struct InstallState {
    // 仅用于保持 Provider 存活。
    #[allow(dead_code)]
    provider: TracerProvider,
}

/// 以 `AlwaysOn` 采样的默认 Provider 完成安装。
///
/// # Errors
/// 见 [`Error`]。
pub fn install() -> Result<(), Error> {
    install_with(default_tracer_provider())
}

/// 以调用方构造的 Provider 完成安装。
///
/// # Errors
/// 见 [`Error`]。
pub fn install_with(provider: TracerProvider) -> Result<(), Error> {
    if INSTALL_STATE.get().is_some() {
        return Err(Error::AlreadyInstalled);
    }
    if dispatcher::has_been_set() {
        return Err(Error::SubscriberAlreadySet);
    }

    global::set_text_map_propagator(TraceContextPropagator::new());
    global::set_tracer_provider(provider.clone());

    let tracer = provider.versioned_tracer(
        SCOPE_NAME,
        Some(env!("CARGO_PKG_VERSION")),
        None::<Cow<'static, str>>,
        None,
    );
    let subscriber = tracing_subscriber::registry()
        .with(build_env_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_opentelemetry::layer().with_tracer(tracer));
    tracing::subscriber::set_global_default(subscriber)?;

    INSTALL_STATE
        .set(InstallState { provider })
        .map_err(|_| Error::AlreadyInstalled)
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn default_tracer_provider() -> TracerProvider {
    TracerProvider::builder()
        .with_config(trace::config().with_sampler(trace::Sampler::AlwaysOn))
        .build()
}
