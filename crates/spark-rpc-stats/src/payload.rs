//! 消息负载的只读视图。
//!
//! # 教案式说明
//! - **契约（What）**：传输层把收发的消息包装为 [`Payload`] 投递给观测层。负载分两种形态：
//!   - *结构化消息*：实现了 [`StructuredMessage`]（任何 `serde::Serialize` 类型自动满足），观测层可将其渲染为
//!     JSON 文本；
//!   - *不透明值*：仅提供 `Debug` 渲染。
//! - **逻辑（How）**：内部以 `Arc` 持有消息，克隆 `Payload` 不复制消息本体。

use std::{fmt, sync::Arc};

use serde::Serialize;

/// 可被结构化渲染的消息。
pub trait StructuredMessage: Send + Sync {
    /// 将消息渲染为两空格缩进的 JSON 文本。
    ///
    /// 所有字段（包括空值字段）都应出现在结果中，并保持字段的声明顺序。
    ///
    /// # Errors
    /// 消息的序列化实现失败时返回底层错误。
    fn to_json_pretty(&self) -> serde_json::Result<String>;
}

impl<T> StructuredMessage for T
where
    T: Serialize + Send + Sync,
{
    fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// 负载形态的借用视图。
pub enum PayloadView<'a> {
    Structured(&'a dyn StructuredMessage),
    Opaque(&'a (dyn fmt::Debug + Send + Sync)),
}

/// 一条收发消息的负载。
#[derive(Clone)]
pub struct Payload {
    repr: Repr,
}

#[derive(Clone)]
enum Repr {
    Structured(Arc<dyn StructuredMessage>),
    Opaque(Arc<dyn fmt::Debug + Send + Sync>),
}

impl Payload {
    /// 包装结构化消息。
    pub fn structured<M>(message: M) -> Self
    where
        M: StructuredMessage + 'static,
    {
        Self {
            repr: Repr::Structured(Arc::new(message)),
        }
    }

    /// 包装只能以 `Debug` 形式展示的值。
    pub fn opaque<V>(value: V) -> Self
    where
        V: fmt::Debug + Send + Sync + 'static,
    {
        Self {
            repr: Repr::Opaque(Arc::new(value)),
        }
    }

    #[must_use]
    pub fn view(&self) -> PayloadView<'_> {
        match &self.repr {
            Repr::Structured(message) => PayloadView::Structured(message.as_ref()),
            Repr::Opaque(value) => PayloadView::Opaque(value.as_ref()),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Structured(_) => f.write_str("Payload::Structured(..)"),
            Repr::Opaque(value) => f.debug_tuple("Payload::Opaque").field(value).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Ping {
        zeta: u32,
        alpha: u32,
        note: Option<String>,
    }

    #[test]
    fn structured_view_keeps_declaration_order_and_empty_fields() {
        let payload = Payload::structured(Ping {
            zeta: 1,
            alpha: 2,
            note: None,
        });
        let PayloadView::Structured(message) = payload.view() else {
            panic!("结构化负载必须给出结构化视图");
        };
        let text = message.to_json_pretty().expect("序列化不应失败");
        assert_eq!(
            text, "{\n  \"zeta\": 1,\n  \"alpha\": 2,\n  \"note\": null\n}",
            "字段必须按声明顺序输出"
        );
    }

    #[test]
    fn opaque_view_keeps_debug_rendering() {
        let payload = Payload::opaque(vec![1_u8, 2, 3]);
        let cloned = payload.clone();
        let PayloadView::Opaque(value) = cloned.view() else {
            panic!("不透明负载必须给出 Debug 视图");
        };
        assert_eq!(format!("{value:?}"), "[1, 2, 3]");
        assert_eq!(format!("{payload:?}"), "Payload::Opaque([1, 2, 3])");
    }
}
