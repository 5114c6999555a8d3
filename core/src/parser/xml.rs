//! XML to mapping conversion.
//!
//! Produces the same loosely-shaped tree the scanner's report is usually read
//! into: attributes become `@name` keys, child elements are keyed by tag name,
//! text becomes `#text` (or the whole value when the element has nothing else).
//! A tag that occurs once maps to a bare object, a repeated tag maps to an
//! array. Consumers must not rely on either shape; see
//! [`as_list`](super::normalizer::as_list).

use roxmltree::{Document, Node, ParsingOptions};
use serde_json::{Map, Value};

use crate::error::Result;

/// Key prefix for XML attributes.
pub const ATTRIBUTE_PREFIX: char = '@';

/// Key holding element text when the element also has attributes or children.
pub const TEXT_KEY: &str = "#text";

/// Parse `xml` into a single-key object `{ root_tag: root_value }`.
///
/// Malformed XML is an error. A `<!DOCTYPE>` declaration is accepted since
/// scanner reports carry one.
pub fn parse(xml: &str) -> Result<Value> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(xml, options)?;
    let root = document.root_element();

    let mut map = Map::new();
    map.insert(root.tag_name().name().to_string(), element_to_value(root));
    Ok(Value::Object(map))
}

fn element_to_value(node: Node<'_, '_>) -> Value {
    let mut map = Map::new();

    for attr in node.attributes() {
        map.insert(
            format!("{}{}", ATTRIBUTE_PREFIX, attr.name()),
            Value::String(attr.value().to_string()),
        );
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            insert_child(&mut map, child.tag_name().name(), element_to_value(child));
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    let text = text.trim();
    match (map.is_empty(), text.is_empty()) {
        (true, true) => Value::Null,
        (true, false) => Value::String(text.to_string()),
        (false, true) => Value::Object(map),
        (false, false) => {
            map.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
            Value::Object(map)
        }
    }
}

/// First occurrence is stored bare; the second turns the slot into an array.
fn insert_child(map: &mut Map<String, Value>, tag: &str, value: Value) {
    match map.get_mut(tag) {
        None => {
            map.insert(tag.to_string(), value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_child_is_bare_object() {
        let value = parse(r#"<run><host><address addr="10.0.0.1" addrtype="ipv4"/></host></run>"#)
            .unwrap();
        assert_eq!(
            value,
            json!({ "run": { "host": { "address": { "@addr": "10.0.0.1", "@addrtype": "ipv4" } } } })
        );
    }

    #[test]
    fn test_repeated_children_become_array() {
        let value = parse(r#"<run><host id="1"/><host id="2"/><host id="3"/></run>"#).unwrap();
        let hosts = value["run"]["host"].as_array().unwrap();
        assert_eq!(hosts.len(), 3);
        assert_eq!(hosts[2]["@id"], "3");
    }

    #[test]
    fn test_text_content() {
        let value = parse(r#"<a><b>plain</b><c kind="x">mixed</c><d/></a>"#).unwrap();
        assert_eq!(value["a"]["b"], "plain");
        assert_eq!(value["a"]["c"]["@kind"], "x");
        assert_eq!(value["a"]["c"][TEXT_KEY], "mixed");
        assert_eq!(value["a"]["d"], Value::Null);
    }

    #[test]
    fn test_accepts_doctype_and_stylesheet() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<?xml-stylesheet href="file:///usr/share/nmap/nmap.xsl" type="text/xsl"?>
<nmaprun scanner="nmap"><runstats/></nmaprun>"#;
        let value = parse(xml).unwrap();
        assert_eq!(value["nmaprun"]["@scanner"], "nmap");
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(parse("<nmaprun><host></nmaprun>").is_err());
        assert!(parse("").is_err());
        assert!(parse("Starting Nmap 7.95").is_err());
    }
}
