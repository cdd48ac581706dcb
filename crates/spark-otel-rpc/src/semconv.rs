//! RPC 观测键名契约：Span 属性、消息事件与指标共用的只读常量。
//!
//! 教案式说明（What）：键名取自 OpenTelemetry 语义约定 1.17 的 RPC / 网络分组，后端仪表盘按这些名称聚合，
//! 任何改名都属于破坏性变更。

/// instrumentation scope 名称，Tracer 与 Meter 共用。
pub const SCOPE_NAME: &str = "spark-otel-rpc";

/// 调用身份属性。
pub mod rpc {
    #[doc = "类型：Span 属性、指标属性。"]
    #[doc = ""]
    #[doc = "RPC 系统标识，取值固定为 [`SYSTEM_GRPC`]。"]
    pub const ATTR_SYSTEM: &str = "rpc.system";

    #[doc = "`rpc.system` 的取值。"]
    pub const SYSTEM_GRPC: &str = "grpc";

    #[doc = "类型：Span 属性、指标属性。"]
    #[doc = ""]
    #[doc = "全限定服务名，例如 `pkg.Service`。"]
    pub const ATTR_SERVICE: &str = "rpc.service";

    #[doc = "类型：Span 属性、指标属性。"]
    #[doc = ""]
    #[doc = "方法名，例如 `Method`。"]
    pub const ATTR_METHOD: &str = "rpc.method";

    #[doc = "类型：Span 属性、指标属性（整型）。"]
    #[doc = ""]
    #[doc = "调用结束时的数值状态码。"]
    pub const ATTR_GRPC_STATUS_CODE: &str = "rpc.grpc.status_code";
}

/// 消息事件。
pub mod message {
    #[doc = "每条收发消息对应的 Span 事件名。"]
    pub const EVENT_NAME: &str = "message";

    #[doc = "类型：事件属性。取值 [`TYPE_RECEIVED`] 或 [`TYPE_SENT`]。"]
    pub const ATTR_TYPE: &str = "message.type";

    pub const TYPE_RECEIVED: &str = "RECEIVED";

    pub const TYPE_SENT: &str = "SENT";

    #[doc = "类型：事件属性（整型）。同一方向内从 1 开始的消息序号。"]
    pub const ATTR_ID: &str = "message.id";

    #[doc = "类型：事件属性（整型）。压缩后字节数。"]
    pub const ATTR_COMPRESSED_SIZE: &str = "message.compressed_size";

    #[doc = "类型：事件属性（整型）。解压后字节数。"]
    pub const ATTR_UNCOMPRESSED_SIZE: &str = "message.uncompressed_size";

    #[doc = "类型：事件属性。收到消息的诊断文本。"]
    pub const ATTR_REQUEST_PAYLOAD: &str = "request";

    #[doc = "类型：事件属性。发出消息的诊断文本。"]
    pub const ATTR_RESPONSE_PAYLOAD: &str = "response";
}

/// 对端网络属性。
pub mod net {
    #[doc = "类型：Span 属性。对端主机为 IP 字面量时使用。"]
    pub const ATTR_SOCK_PEER_ADDR: &str = "net.sock.peer.addr";

    #[doc = "类型：Span 属性（整型）。与 [`ATTR_SOCK_PEER_ADDR`] 成对出现。"]
    pub const ATTR_SOCK_PEER_PORT: &str = "net.sock.peer.port";

    #[doc = "类型：Span 属性。对端主机为域名时使用。"]
    pub const ATTR_PEER_NAME: &str = "net.peer.name";

    #[doc = "类型：Span 属性（整型）。与 [`ATTR_PEER_NAME`] 成对出现。"]
    pub const ATTR_PEER_PORT: &str = "net.peer.port";
}
