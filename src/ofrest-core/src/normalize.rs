//! Response shape normalization
//!
//! The REST API plugin serializes collections inconsistently. Depending on
//! the server version and on how many entries there are, the same listing
//! can arrive as any of:
//!
//! ```text
//! {"logs": [{...}, {...}]}
//! {"logs": {"log": [{...}, {...}]}}
//! {"logs": {"log": {...}}}
//! {"logs": null}
//! ```
//!
//! [`normalize`] resolves all of them into a plain list, driven only by the
//! key names in a [`Shape`].

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Where a resource's entries live inside a response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// Outer key holding the collection.
    pub container: &'static str,
    /// Singular key some servers nest the entries under.
    pub item: Option<&'static str>,
}

impl Shape {
    pub const USERS: Shape = Shape::nested("users", "user");
    pub const GROUPS: Shape = Shape::nested("groups", "group");
    pub const CHAT_ROOMS: Shape = Shape::nested("chatRooms", "chatRoom");
    pub const PARTICIPANTS: Shape = Shape::nested("participants", "participant");
    pub const OCCUPANTS: Shape = Shape::nested("occupants", "occupant");
    pub const SESSIONS: Shape = Shape::nested("sessions", "session");
    pub const SECURITY_LOGS: Shape = Shape::nested("logs", "log");
    pub const ROSTER: Shape = Shape::nested("roster", "rosterItem");
    pub const USER_GROUPS: Shape = Shape::flat("groupname");
    pub const PROPERTIES: Shape = Shape::flat("property");

    // Affiliations inside a single chat room
    pub const OWNERS: Shape = Shape::nested("owners", "owner");
    pub const ADMINS: Shape = Shape::nested("admins", "admin");
    pub const MEMBERS: Shape = Shape::nested("members", "member");
    pub const OUTCASTS: Shape = Shape::nested("outcasts", "outcast");
    pub const OWNER_GROUPS: Shape = Shape::nested("ownerGroups", "ownerGroup");
    pub const ADMIN_GROUPS: Shape = Shape::nested("adminGroups", "adminGroup");
    pub const MEMBER_GROUPS: Shape = Shape::nested("memberGroups", "memberGroup");
    pub const OUTCAST_GROUPS: Shape = Shape::nested("outcastGroups", "outcastGroup");

    pub const fn nested(container: &'static str, item: &'static str) -> Self {
        Self {
            container,
            item: Some(item),
        }
    }

    pub const fn flat(container: &'static str) -> Self {
        Self {
            container,
            item: None,
        }
    }
}

/// Extract the entries described by `shape` from `envelope`.
///
/// Never fails: anything missing or unrecognisable yields an empty list.
pub fn normalize(envelope: &Value, shape: Shape) -> Vec<Value> {
    if let Value::Array(entries) = envelope {
        return entries.clone();
    }

    let Some(container) = envelope.get(shape.container) else {
        return Vec::new();
    };
    if is_blank(container) {
        return Vec::new();
    }

    match container {
        Value::Array(entries) => entries.clone(),
        Value::Object(map) => match shape.item.and_then(|item| map.get(item)) {
            Some(inner) => collapse(inner),
            // A mapping without the singular key is itself the only entry
            None => vec![container.clone()],
        },
        scalar => vec![scalar.clone()],
    }
}

/// Like [`normalize`], decoding each entry into `T`.
///
/// Entries that do not decode are skipped.
pub fn normalize_as<T: DeserializeOwned>(envelope: &Value, shape: Shape) -> Vec<T> {
    normalize(envelope, shape)
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!(container = shape.container, "skipping undecodable entry: {}", e);
                None
            }
        })
        .collect()
}

fn collapse(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(entries) => entries.clone(),
        v if is_blank(v) => Vec::new(),
        single => vec![single.clone()],
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_missing_or_empty_container() {
        let shape = Shape::SECURITY_LOGS;
        assert!(normalize(&json!({}), shape).is_empty());
        assert!(normalize(&json!({"logs": null}), shape).is_empty());
        assert!(normalize(&json!({"logs": []}), shape).is_empty());
        assert!(normalize(&json!({"logs": {}}), shape).is_empty());
        assert!(normalize(&json!({"other": [1]}), shape).is_empty());
        assert!(normalize(&Value::Null, shape).is_empty());
        assert!(normalize(&json!(true), shape).is_empty());
    }

    #[test]
    fn test_single_nested_entry_is_wrapped() {
        let entry = json!({
            "logId": 22,
            "username": "admin",
            "timestamp": 1758900075,
            "summary": "Successful admin console login attempt",
            "node": "192.168.5.15"
        });
        let envelope = json!({"logs": {"log": entry.clone()}});

        let entries = normalize(&envelope, Shape::SECURITY_LOGS);
        assert_eq!(entries, vec![entry]);
    }

    #[test]
    fn test_nested_sequence_unchanged() {
        let logs = json!([{"logId": 1}, {"logId": 2}, {"logId": 3}]);
        let envelope = json!({"logs": {"log": logs.clone()}});

        let entries = normalize(&envelope, Shape::SECURITY_LOGS);
        assert_eq!(Value::Array(entries), logs);
    }

    #[test]
    fn test_direct_sequence_unchanged() {
        let rooms = json!([{"roomName": "lobby"}, {"roomName": "dev"}]);
        let envelope = json!({"chatRooms": rooms.clone()});
        assert_eq!(Value::Array(normalize(&envelope, Shape::CHAT_ROOMS)), rooms);
    }

    #[test]
    fn test_bare_sequence_envelope() {
        let envelope = json!([{"username": "a"}]);
        assert_eq!(normalize(&envelope, Shape::USERS).len(), 1);
    }

    #[test]
    fn test_nested_null_or_empty() {
        assert!(normalize(&json!({"sessions": {"session": null}}), Shape::SESSIONS).is_empty());
        assert!(normalize(&json!({"sessions": {"session": []}}), Shape::SESSIONS).is_empty());
    }

    #[test]
    fn test_mapping_without_item_key_is_single_entry() {
        let participant = json!({"jid": "alice@example.org/phone", "role": "participant"});
        let envelope = json!({"participants": participant.clone()});
        assert_eq!(normalize(&envelope, Shape::PARTICIPANTS), vec![participant]);
    }

    #[test]
    fn test_flat_scalar_values() {
        let envelope = json!({"groupname": "Admins"});
        assert_eq!(normalize(&envelope, Shape::USER_GROUPS), vec![json!("Admins")]);

        let envelope = json!({"groupname": ["Admins", "Friends"]});
        assert_eq!(normalize(&envelope, Shape::USER_GROUPS).len(), 2);

        assert!(normalize(&json!({"groupname": ""}), Shape::USER_GROUPS).is_empty());
    }

    #[test]
    fn test_single_role_jid() {
        let room = json!({"owners": {"owner": "admin@example.org"}});
        assert_eq!(normalize(&room, Shape::OWNERS), vec![json!("admin@example.org")]);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Entry {
        #[serde(rename = "logId")]
        log_id: i64,
    }

    #[test]
    fn test_normalize_as_skips_bad_entries() {
        let envelope = json!({"logs": {"log": [{"logId": 1}, {"logId": "nope"}, {"logId": 3}]}});
        let entries: Vec<Entry> = normalize_as(&envelope, Shape::SECURITY_LOGS);
        assert_eq!(entries, vec![Entry { log_id: 1 }, Entry { log_id: 3 }]);
    }
}
