//! Index settings and field mapping

use serde_json::{Value, json};

/// Body for creating the log index
///
/// `instance_id` and `log_file_name` are exact-match keywords, `log_entry`
/// is full text and `created` is a 64-bit integer.
pub fn index_mapping(shards: u32, replicas: u32) -> Value {
    json!({
        "settings": {
            "number_of_shards": shards,
            "number_of_replicas": replicas
        },
        "mappings": {
            "properties": {
                "instance_id": { "type": "keyword" },
                "log_file_name": { "type": "keyword" },
                "log_entry": { "type": "text" },
                "created": { "type": "long" }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_settings() {
        let body = index_mapping(3, 2);
        assert_eq!(body["settings"]["number_of_shards"], 3);
        assert_eq!(body["settings"]["number_of_replicas"], 2);
    }

    #[test]
    fn test_mapping_field_types() {
        let props = &index_mapping(1, 0)["mappings"]["properties"];
        assert_eq!(props["instance_id"]["type"], "keyword");
        assert_eq!(props["log_file_name"]["type"], "keyword");
        assert_eq!(props["log_entry"]["type"], "text");
        assert_eq!(props["created"]["type"], "long");
    }

    #[test]
    fn test_mapping_covers_document_fields() {
        let doc = serde_json::to_value(logship_protocol::IndexDocument {
            instance_id: "i".into(),
            log_file_name: "f".into(),
            log_entry: "e".into(),
            created: 1,
        })
        .unwrap();

        let props = index_mapping(1, 0)["mappings"]["properties"].clone();
        for field in doc.as_object().unwrap().keys() {
            assert!(props.get(field).is_some(), "field {field} has no mapping");
        }
    }
}
