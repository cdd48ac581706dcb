//! 负载诊断文本渲染。

use spark_rpc_stats::{Payload, PayloadView};

/// 把消息负载渲染为诊断文本，结果写入消息事件的 `request` / `response` 属性。
///
/// # 契约说明（What）
/// - `None` 渲染为 `null`；
/// - 结构化消息渲染为两空格缩进的 JSON，空值字段一并输出；
/// - 序列化失败时返回 `Error marshaling to JSON: {原因}`；
/// - 不透明值使用其 `Debug` 文本。
///
/// 该函数没有对调用方可见的失败路径。
pub fn payload_to_json(payload: Option<&Payload>) -> String {
    let Some(payload) = payload else {
        return "null".to_string();
    };
    match payload.view() {
        PayloadView::Structured(message) => {
            match message.to_json_pretty() {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(target: "spark_otel_rpc", error = %err, "payload serialization failed");
                    format!("Error marshaling to JSON: {err}")
                }
            }
        }
        PayloadView::Opaque(value) => format!("{value:?}"),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Serialize, Serializer, ser::Error as _};

    use super::*;

    #[derive(Serialize)]
    struct HelloRequest {
        name: String,
        nickname: Option<String>,
        tags: Vec<String>,
    }

    struct Broken;

    impl Serialize for Broken {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("field `secret` is not serializable"))
        }
    }

    #[derive(Debug)]
    #[allow(dead_code)]
    struct RawFrame {
        id: u32,
        flags: u8,
    }

    #[test]
    fn absent_payload_is_null() {
        assert_eq!(payload_to_json(None), "null");
    }

    #[test]
    fn structured_messages_are_indented_and_keep_empty_fields() {
        let payload = Payload::structured(HelloRequest {
            name: "spark".into(),
            nickname: None,
            tags: Vec::new(),
        });
        assert_eq!(
            payload_to_json(Some(&payload)),
            "{\n  \"name\": \"spark\",\n  \"nickname\": null,\n  \"tags\": []\n}"
        );
    }

    #[test]
    fn structured_messages_keep_field_declaration_order() {
        #[derive(Serialize)]
        struct Reply {
            zeta: u32,
            alpha: u32,
        }
        let payload = Payload::structured(Reply { zeta: 1, alpha: 2 });
        assert_eq!(
            payload_to_json(Some(&payload)),
            "{\n  \"zeta\": 1,\n  \"alpha\": 2\n}"
        );
    }

    #[tracing_test::traced_test]
    #[test]
    fn serialization_failures_are_described_not_raised() {
        let text = payload_to_json(Some(&Payload::structured(Broken)));
        assert_eq!(
            text,
            "Error marshaling to JSON: field `secret` is not serializable"
        );
        assert!(logs_contain("payload serialization failed"));
    }

    #[test]
    fn opaque_values_fall_back_to_debug() {
        let payload = Payload::opaque(RawFrame { id: 7, flags: 1 });
        assert_eq!(payload_to_json(Some(&payload)), "RawFrame { id: 7, flags: 1 }");
    }
}
