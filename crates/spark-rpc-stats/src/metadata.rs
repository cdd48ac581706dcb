//! 调用元数据（头部）载体。
//!
//! # 教案式说明
//! - **契约（What）**：键为小写 ASCII（`a-z`、`0-9`、`-`、`_`、`.`），值为可打印 ASCII；每个键只保留一个值，
//!   后写覆盖先写。
//! - **用途（Where）**：分布式上下文传播把 `traceparent`/`tracestate` 写入或读出该载体；传输层负责与线上
//!   头部互转。

use std::collections::BTreeMap;

use thiserror::Error;

/// 写入元数据时的校验失败。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// 键为空或包含大写字母、空白等非法字符。
    #[error("invalid metadata key `{key}`")]
    InvalidKey { key: String },
    /// 值包含控制字符或非 ASCII 字节。
    #[error("invalid metadata value for key `{key}`")]
    InvalidValue { key: String },
}

/// 有序的键值元数据。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, String>,
}

impl Metadata {
    /// 空元数据。
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个键值，返回被覆盖的旧值。
    ///
    /// # Errors
    /// 键或值不满足模块级约束时返回 [`MetadataError`]，元数据保持不变。
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, MetadataError> {
        let key = key.into();
        if !is_valid_key(&key) {
            return Err(MetadataError::InvalidKey { key });
        }
        let value = value.into();
        if !value.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
            return Err(MetadataError::InvalidValue { key });
        }
        Ok(self.entries.insert(key, value))
    }

    /// 读取键对应的值。
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// 按键的字典序遍历全部键。
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_and_returns_previous_value() {
        let mut metadata = Metadata::new();
        assert_eq!(metadata.insert("traceparent", "00-a").unwrap(), None);
        assert_eq!(
            metadata.insert("traceparent", "00-b").unwrap(),
            Some("00-a".to_string())
        );
        assert_eq!(metadata.get("traceparent"), Some("00-b"));
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn rejects_uppercase_keys_and_control_values() {
        let mut metadata = Metadata::new();
        assert_eq!(
            metadata.insert("TraceParent", "x"),
            Err(MetadataError::InvalidKey {
                key: "TraceParent".to_string()
            })
        );
        assert_eq!(
            metadata.insert("tracestate", "a\nb"),
            Err(MetadataError::InvalidValue {
                key: "tracestate".to_string()
            })
        );
        assert!(metadata.is_empty(), "校验失败时不得写入任何条目");
    }

    #[test]
    fn keys_are_iterated_in_order() {
        let mut metadata = Metadata::new();
        metadata.insert("tracestate", "k=v").unwrap();
        metadata.insert("baggage", "a=1").unwrap();
        metadata.insert("traceparent", "00-x").unwrap();
        let keys: Vec<_> = metadata.keys().collect();
        assert_eq!(keys, ["baggage", "traceparent", "tracestate"]);
    }
}
