/// 对端网络地址，以 `host:port` 文本保存（IPv6 使用 `[addr]:port`）。
///
/// 传输层不保证地址可解析；观测层在无法拆出端口时放弃生成对端属性。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Peer {
    addr: String,
}

impl Peer {
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl From<std::net::SocketAddr> for Peer {
    fn from(addr: std::net::SocketAddr) -> Self {
        Self::new(addr.to_string())
    }
}
