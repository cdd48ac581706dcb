use crate::{
    context::{ConnContext, RpcContext},
    stats::{ConnStats, ConnTagInfo, RpcStats, RpcTagInfo},
};

/// 传输层注册的统计回调能力集合。
///
/// # 教案式说明
/// - **契约（What）**：
///   - `tag_conn` / `handle_conn`：连接级标记与事件；
///   - `tag_rpc`：调用名确定时调用一次，返回调用级句柄 [`StatsHandler::Tagged`]；
///   - `handle_rpc`：此后同一调用的每个事件都以该句柄回调，`End` 为最后一次。
/// - **所有权（How）**：句柄由传输层持有到调用结束，处理器只借用；句柄内的调用级状态随句柄析构释放。
/// - **并发**：同一句柄可能被两个方向的事件并发借用，实现不得在回调之间持锁。
pub trait StatsHandler: Send + Sync {
    /// 调用级句柄。
    type Tagged: Send + Sync;

    fn tag_conn(&self, cx: ConnContext, info: &ConnTagInfo) -> ConnContext;

    fn handle_conn(&self, cx: &ConnContext, stats: &ConnStats);

    fn tag_rpc(&self, cx: RpcContext, info: &RpcTagInfo) -> Self::Tagged;

    fn handle_rpc(&self, tagged: &Self::Tagged, stats: &RpcStats);
}
