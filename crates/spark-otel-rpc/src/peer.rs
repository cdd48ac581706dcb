//! 对端地址到网络属性的映射。

use std::net::IpAddr;

use opentelemetry::KeyValue;

use crate::semconv::net;

const LOOPBACK: &str = "127.0.0.1";

/// 由 `host:port` 文本生成对端属性。
///
/// # 契约说明（What）
/// - 主机为 IP 字面量：`net.sock.peer.addr` + `net.sock.peer.port`；
/// - 主机为域名：`net.peer.name` + `net.peer.port`；
/// - 主机为空（`":8080"`）视为 `127.0.0.1`；
/// - 拆不出主机与端口，或端口不是整数：返回空集合。
pub fn peer_attributes(addr: &str) -> Vec<KeyValue> {
    let Some((host, port)) = split_host_port(addr) else {
        tracing::debug!(target: "spark_otel_rpc", peer = addr, "peer address not parsable");
        return Vec::new();
    };
    let Ok(port) = port.parse::<i64>() else {
        tracing::debug!(target: "spark_otel_rpc", peer = addr, "peer port not numeric");
        return Vec::new();
    };
    let host = if host.is_empty() { LOOPBACK } else { host };

    if host.parse::<IpAddr>().is_ok() {
        vec![
            KeyValue::new(net::ATTR_SOCK_PEER_ADDR, host.to_string()),
            KeyValue::new(net::ATTR_SOCK_PEER_PORT, port),
        ]
    } else {
        vec![
            KeyValue::new(net::ATTR_PEER_NAME, host.to_string()),
            KeyValue::new(net::ATTR_PEER_PORT, port),
        ]
    }
}

/// 拆分 `host:port` 与 `[v6]:port`；未加方括号的主机中不得再含冒号。
fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        let port = tail.strip_prefix(':')?;
        return Some((host, port));
    }
    let (host, port) = addr.rsplit_once(':')?;
    if host.contains(':') || host.contains('[') || host.contains(']') {
        return None;
    }
    Some((host, port))
}
