//! Query-string parsing and re-serialisation.
//!
//! The splitting and escaping rules here intentionally do not reuse
//! `url::Url::query_pairs` — that iterator normalises in ways the upstream
//! driver's query handling does not. Reserved-key extraction and
//! pass-through re-serialisation need the exact edge-case behaviour spelled
//! out below, so this module parses the raw query string by hand.

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

/// One `name=value` pair taken off the query string, before reserved-key
/// extraction has happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryField {
    pub name: String,
    pub value: String,
}

/// Split `raw` on `&` and decode each `name=value` (or bare `name`) pair.
///
/// Matches the boundary table exactly:
/// - an empty section (leading/trailing/doubled `&`) is skipped
/// - a section starting with `=` is skipped (no name)
/// - a section with no `=` keeps the name and an empty value
/// - a trailing `=` keeps an empty value
pub fn parse_query(raw: &str) -> Vec<QueryField> {
    if raw.is_empty() {
        return Vec::new();
    }

    raw.split('&')
        .filter_map(|section| {
            if section.is_empty() || section.starts_with('=') {
                return None;
            }
            let (name, value) = match section.find('=') {
                Some(idx) => (&section[..idx], &section[idx + 1..]),
                None => (section, ""),
            };
            Some(QueryField {
                name: percent_decode_str(name).decode_utf8_lossy().into_owned(),
                value: percent_decode_str(value).decode_utf8_lossy().into_owned(),
            })
        })
        .collect()
}

/// Re-serialise pass-through fields into a query string forwarded to the
/// server. Escapes everything outside a conservative alphanumeric safe set,
/// so `=`, `&`, and `#` are always escaped regardless of where they appear.
pub fn encode_query(fields: &[QueryField]) -> String {
    fields
        .iter()
        .map(|f| {
            format!(
                "{}={}",
                utf8_percent_encode(&f.name, NON_ALPHANUMERIC),
                utf8_percent_encode(&f.value, NON_ALPHANUMERIC)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_values(fields: &[QueryField]) -> Vec<(&str, &str)> {
        fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect()
    }

    #[test]
    fn boundary_table() {
        assert_eq!(names_values(&parse_query("")), Vec::<(&str, &str)>::new());
        assert_eq!(names_values(&parse_query("&")), Vec::<(&str, &str)>::new());
        assert_eq!(names_values(&parse_query("a")), vec![("a", "")]);
        assert_eq!(names_values(&parse_query("a=")), vec![("a", "")]);
        assert_eq!(names_values(&parse_query("=b")), Vec::<(&str, &str)>::new());
        assert_eq!(
            names_values(&parse_query("a=b&c=d")),
            vec![("a", "b"), ("c", "d")]
        );
    }

    #[test]
    fn percent_decoding() {
        let fields = parse_query("name=qemu%3A%2F%2F%2Fsystem");
        assert_eq!(fields[0].value, "qemu:///system");
    }

    #[test]
    fn round_trip_preserves_order_and_values() {
        let original = "socket=%2Ftmp%2Fsock&foo=bar&baz=qux";
        let fields = parse_query(original);
        let encoded = encode_query(&fields);
        let re_parsed = parse_query(&encoded);
        assert_eq!(fields, re_parsed);
    }

    #[test]
    fn reserved_characters_always_escaped() {
        let fields = vec![QueryField {
            name: "a=b".into(),
            value: "c&d#e".into(),
        }];
        let encoded = encode_query(&fields);
        assert!(!encoded.contains("c&d#e"));
        assert!(encoded.contains("%3D")); // '='
        assert!(encoded.contains("%26")); // '&'
        assert!(encoded.contains("%23")); // '#'
    }
}
