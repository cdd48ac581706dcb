//! 全限定方法名解析。

use opentelemetry::KeyValue;

use crate::semconv::rpc;

/// 把 `/pkg.Service/Method` 解析为 Span 名与身份属性。
///
/// # 契约说明（What）
/// - 不以 `/` 开头：原样作为 Span 名，不产生属性；
/// - 去掉前导 `/` 后按最后一个 `/` 切分为服务与方法，空的一侧不产生属性；
/// - 去掉前导 `/` 后不含 `/`：Span 名为剩余部分，不产生属性。
///
/// `rpc.system` 不在此处追加，由调用标记阶段统一补上。
pub fn parse_full_method(full_method: &str) -> (String, Vec<KeyValue>) {
    let Some(name) = full_method.strip_prefix('/') else {
        return (full_method.to_string(), Vec::new());
    };
    let Some((service, method)) = name.rsplit_once('/') else {
        return (name.to_string(), Vec::new());
    };

    let mut attrs = Vec::with_capacity(2);
    if !service.is_empty() {
        attrs.push(KeyValue::new(rpc::ATTR_SERVICE, service.to_string()));
    }
    if !method.is_empty() {
        attrs.push(KeyValue::new(rpc::ATTR_METHOD, method.to_string()));
    }
    (name.to_string(), attrs)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn lookup<'a>(attrs: &'a [KeyValue], key: &str) -> Option<String> {
        attrs
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.as_str().into_owned())
    }

    #[test]
    fn splits_service_and_method() {
        let (name, attrs) = parse_full_method("/pkg.Service/Method");
        assert_eq!(name, "pkg.Service/Method");
        assert_eq!(lookup(&attrs, rpc::ATTR_SERVICE).as_deref(), Some("pkg.Service"));
        assert_eq!(lookup(&attrs, rpc::ATTR_METHOD).as_deref(), Some("Method"));
    }

    #[test]
    fn nested_service_splits_at_last_slash() {
        let (name, attrs) = parse_full_method("/a/b/Method");
        assert_eq!(name, "a/b/Method");
        assert_eq!(lookup(&attrs, rpc::ATTR_SERVICE).as_deref(), Some("a/b"));
        assert_eq!(lookup(&attrs, rpc::ATTR_METHOD).as_deref(), Some("Method"));
    }

    #[test]
    fn malformed_names_produce_no_attributes() {
        assert_eq!(parse_full_method("pkg.Service/Method"), ("pkg.Service/Method".into(), vec![]));
        assert_eq!(parse_full_method("/NoSlash"), ("NoSlash".into(), vec![]));
        assert_eq!(parse_full_method(""), (String::new(), vec![]));

        let (name, attrs) = parse_full_method("/Service/");
        assert_eq!(name, "Service/");
        assert_eq!(attrs.len(), 1, "空方法名不应产生 rpc.method");
        assert_eq!(lookup(&attrs, rpc::ATTR_SERVICE).as_deref(), Some("Service"));
    }

    proptest! {
        #[test]
        fn well_formed_names_round_trip(
            service in "[a-zA-Z][a-zA-Z0-9_.]{0,24}",
            method in "[A-Z][a-zA-Z0-9_]{0,24}",
        ) {
            let full = format!("/{service}/{method}");
            let (name, attrs) = parse_full_method(&full);
            prop_assert_eq!(name, format!("{service}/{method}"));
            prop_assert_eq!(lookup(&attrs, rpc::ATTR_SERVICE), Some(service));
            prop_assert_eq!(lookup(&attrs, rpc::ATTR_METHOD), Some(method));
        }

        #[test]
        fn names_without_leading_slash_are_untouched(raw in "[^/][^\\n]{0,40}") {
            let (name, attrs) = parse_full_method(&raw);
            prop_assert_eq!(name, raw);
            prop_assert!(attrs.is_empty());
        }
    }
}
