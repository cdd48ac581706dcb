//! 连接级与调用级生命周期事件。
//!
//! # 教案式说明
//! - **顺序契约（What）**：对同一调用，`tag_rpc` 先于任何事件；[`RpcStats::Begin`] 先于所有 Payload 事件；
//!   Payload 事件先于 [`RpcStats::End`]。双向流调用的 [`RpcStats::InPayload`] 与 [`RpcStats::OutPayload`]
//!   可并发投递。
//! - **字段语义**：`length` 为解压后的消息字节数，`compressed_length` 为压缩后字节数（未压缩时与 `length`
//!   相同），`wire_length` 额外包含帧头。
//! - **扩展（How）**：枚举标记 `#[non_exhaustive]`，处理器必须为未来新增的事件种类保留忽略分支。

use std::{sync::Arc, time::SystemTime};

use crate::{metadata::Metadata, payload::Payload, status::Status};

/// 事件中携带的调用错误。
pub type BoxError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// 调用标记阶段的信息：调用的全限定方法名在此时已知。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcTagInfo {
    /// 形如 `/pkg.Service/Method` 的全限定方法名。
    pub full_method_name: String,
    /// 连接不可用时是否立即失败。
    pub fail_fast: bool,
}

impl RpcTagInfo {
    #[must_use]
    pub fn new(full_method_name: impl Into<String>) -> Self {
        Self {
            full_method_name: full_method_name.into(),
            fail_fast: true,
        }
    }
}

/// 连接标记阶段的信息。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnTagInfo {
    pub remote_addr: Option<String>,
    pub local_addr: Option<String>,
}

/// 连接级事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConnStats {
    Begin { client: bool },
    End { client: bool },
}

/// 调用开始。
#[derive(Debug, Clone)]
pub struct Begin {
    pub client: bool,
    pub begin_time: SystemTime,
    pub fail_fast: bool,
    pub is_client_stream: bool,
    pub is_server_stream: bool,
}

/// 收到一条消息。
#[derive(Debug, Clone)]
pub struct InPayload {
    pub client: bool,
    pub payload: Option<Payload>,
    pub length: usize,
    pub compressed_length: usize,
    pub wire_length: usize,
    pub recv_time: SystemTime,
}

impl InPayload {
    /// 未压缩消息：压缩长度与线上长度均取 `length`。
    #[must_use]
    pub fn new(payload: Option<Payload>, length: usize) -> Self {
        Self {
            client: false,
            payload,
            length,
            compressed_length: length,
            wire_length: length,
            recv_time: SystemTime::now(),
        }
    }
}

/// 发出一条消息。
#[derive(Debug, Clone)]
pub struct OutPayload {
    pub client: bool,
    pub payload: Option<Payload>,
    pub length: usize,
    pub compressed_length: usize,
    pub wire_length: usize,
    pub send_time: SystemTime,
}

impl OutPayload {
    /// 未压缩消息：压缩长度与线上长度均取 `length`。
    #[must_use]
    pub fn new(payload: Option<Payload>, length: usize) -> Self {
        Self {
            client: false,
            payload,
            length,
            compressed_length: length,
            wire_length: length,
            send_time: SystemTime::now(),
        }
    }
}

/// 收到头部。
#[derive(Debug, Clone, Default)]
pub struct InHeader {
    pub client: bool,
    pub full_method: String,
    pub compression: String,
    pub header: Metadata,
    pub wire_length: usize,
}

/// 收到尾部。
#[derive(Debug, Clone, Default)]
pub struct InTrailer {
    pub client: bool,
    pub trailer: Metadata,
    pub wire_length: usize,
}

/// 发出头部。
#[derive(Debug, Clone, Default)]
pub struct OutHeader {
    pub client: bool,
    pub full_method: String,
    pub compression: String,
    pub header: Metadata,
}

/// 发出尾部。
#[derive(Debug, Clone, Default)]
pub struct OutTrailer {
    pub client: bool,
    pub trailer: Metadata,
}

/// 调用结束，是同一调用的最后一个事件。
#[derive(Debug, Clone)]
pub struct End {
    pub client: bool,
    pub begin_time: SystemTime,
    pub end_time: SystemTime,
    pub trailer: Metadata,
    /// `None` 表示调用成功。
    pub error: Option<BoxError>,
}

impl End {
    /// 成功结束的调用。
    #[must_use]
    pub fn ok(begin_time: SystemTime, end_time: SystemTime) -> Self {
        Self {
            client: false,
            begin_time,
            end_time,
            trailer: Metadata::default(),
            error: None,
        }
    }

    /// 以错误结束的调用。
    #[must_use]
    pub fn failed(
        begin_time: SystemTime,
        end_time: SystemTime,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            error: Some(Arc::new(error)),
            ..Self::ok(begin_time, end_time)
        }
    }

    /// 错误解包后的状态；成功调用返回 `None`。
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        self.error
            .as_deref()
            .map(|err| Status::from_error(err as &(dyn std::error::Error + 'static)))
    }
}

/// 调用级事件。
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum RpcStats {
    Begin(Begin),
    InHeader(InHeader),
    InPayload(InPayload),
    InTrailer(InTrailer),
    OutHeader(OutHeader),
    OutPayload(OutPayload),
    OutTrailer(OutTrailer),
    End(End),
}

impl RpcStats {
    /// 事件种类的稳定名称，用于日志字段。
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Begin(_) => "begin",
            Self::InHeader(_) => "in_header",
            Self::InPayload(_) => "in_payload",
            Self::InTrailer(_) => "in_trailer",
            Self::OutHeader(_) => "out_header",
            Self::OutPayload(_) => "out_payload",
            Self::OutTrailer(_) => "out_trailer",
            Self::End(_) => "end",
        }
    }

    /// 事件是否发生在客户端一侧。
    #[must_use]
    pub fn is_client(&self) -> bool {
        match self {
            Self::Begin(s) => s.client,
            Self::InHeader(s) => s.client,
            Self::InPayload(s) => s.client,
            Self::InTrailer(s) => s.client,
            Self::OutHeader(s) => s.client,
            Self::OutPayload(s) => s.client,
            Self::OutTrailer(s) => s.client,
            Self::End(s) => s.client,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::status::Code;

    #[test]
    fn end_status_unwraps_error() {
        let begin = SystemTime::UNIX_EPOCH;
        let end = begin + Duration::from_millis(3);
        assert_eq!(End::ok(begin, end).status(), None);

        let failed = End::failed(begin, end, Status::unavailable("backend down"));
        let status = failed.status().expect("失败的调用必须带状态");
        assert_eq!(status.code(), Code::Unavailable);
        assert_eq!(status.message(), "backend down");
    }

    #[test]
    fn uncompressed_payload_lengths_match() {
        let payload = InPayload::new(None, 42);
        assert_eq!(payload.compressed_length, 42);
        assert_eq!(payload.wire_length, 42);
        assert_eq!(RpcStats::InPayload(payload).kind(), "in_payload");
    }

    #[test]
    fn client_side_follows_event_flag() {
        let server_side = RpcStats::OutHeader(OutHeader::default());
        assert!(!server_side.is_client());

        let mut payload = OutPayload::new(None, 1);
        payload.client = true;
        assert!(RpcStats::OutPayload(payload).is_client(), "客户端事件必须被识别");

        let mut end = End::ok(SystemTime::UNIX_EPOCH, SystemTime::UNIX_EPOCH);
        end.client = true;
        assert!(RpcStats::End(end).is_client());
    }
}
