//! 传输层交给统计处理器的调用/连接上下文。

use crate::{metadata::Metadata, peer::Peer};

/// 一次调用的传输侧上下文。
///
/// # 契约说明（What）
/// - `incoming`：对端送来的请求元数据（服务端读取其中的分布式上下文）；
/// - `outgoing`：将随请求发出的元数据（客户端把分布式上下文写入其中）；
/// - `peer`：对端地址，可能未知。
#[derive(Debug, Clone, Default)]
pub struct RpcContext {
    incoming: Metadata,
    outgoing: Metadata,
    peer: Option<Peer>,
}

impl RpcContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_incoming(mut self, metadata: Metadata) -> Self {
        self.incoming = metadata;
        self
    }

    #[must_use]
    pub fn with_outgoing(mut self, metadata: Metadata) -> Self {
        self.outgoing = metadata;
        self
    }

    #[must_use]
    pub fn with_peer(mut self, peer: Peer) -> Self {
        self.peer = Some(peer);
        self
    }

    #[must_use]
    pub fn incoming(&self) -> &Metadata {
        &self.incoming
    }

    #[must_use]
    pub fn outgoing(&self) -> &Metadata {
        &self.outgoing
    }

    pub fn outgoing_mut(&mut self) -> &mut Metadata {
        &mut self.outgoing
    }

    #[must_use]
    pub fn peer(&self) -> Option<&Peer> {
        self.peer.as_ref()
    }
}

/// 一条连接的传输侧上下文。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnContext {
    remote: Option<Peer>,
    local: Option<Peer>,
}

impl ConnContext {
    #[must_use]
    pub fn new(remote: Option<Peer>, local: Option<Peer>) -> Self {
        Self { remote, local }
    }

    #[must_use]
    pub fn remote(&self) -> Option<&Peer> {
        self.remote.as_ref()
    }

    #[must_use]
    pub fn local(&self) -> Option<&Peer> {
        self.local.as_ref()
    }
}
