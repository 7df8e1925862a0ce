use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Default Group Chat Service name
pub const DEFAULT_SERVICE: &str = "conference";

/// Security audit log page size the server applies when none is sent
pub const DEFAULT_LOG_LIMIT: u32 = 100;

/// Free-form user properties, sent as `{"property": [{"@key", "@value"}]}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(pub BTreeMap<String, String>);

impl Properties {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            #[serde(rename = "@key")]
            key: &'a str,
            #[serde(rename = "@value")]
            value: &'a str,
        }

        #[derive(Serialize)]
        struct Wire<'a> {
            property: Vec<Entry<'a>>,
        }

        Wire {
            property: self
                .0
                .iter()
                .map(|(key, value)| Entry { key, value })
                .collect(),
        }
        .serialize(serializer)
    }
}

/// NewUser represents the request to create a user
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }
}

/// UserUpdate represents the request to modify a user.
///
/// `username` renames the user; when absent the current name is kept.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

/// Roster subscription state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Remove,
    None,
    To,
    From,
    Both,
}

impl Subscription {
    pub fn code(self) -> i8 {
        match self {
            Subscription::Remove => -1,
            Subscription::None => 0,
            Subscription::To => 1,
            Subscription::From => 2,
            Subscription::Both => 3,
        }
    }
}

impl Serialize for Subscription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.code())
    }
}

/// RosterItem represents one buddy-list entry to add or update
#[derive(Debug, Clone, Default)]
pub struct RosterItem {
    pub jid: String,
    pub nickname: Option<String>,
    pub subscription: Option<Subscription>,
    pub groups: Vec<String>,
}

impl RosterItem {
    pub fn new(jid: impl Into<String>) -> Self {
        Self {
            jid: jid.into(),
            ..Default::default()
        }
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "jid": self.jid,
            "nickname": self.nickname,
            "subscriptionType": self.subscription,
            "groups": {"group": self.groups},
        })
    }
}

/// NewGroup represents the request body for creating or updating a group
#[derive(Debug, Clone, Serialize)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
}

/// Room affiliation that can be granted or revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owners,
    Admins,
    Members,
    Outcasts,
}

impl Role {
    pub fn as_path(self) -> &'static str {
        match self {
            Role::Owners => "owners",
            Role::Admins => "admins",
            Role::Members => "members",
            Role::Outcasts => "outcasts",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owners" | "owner" => Ok(Role::Owners),
            "admins" | "admin" => Ok(Role::Admins),
            "members" | "member" => Ok(Role::Members),
            "outcasts" | "outcast" => Ok(Role::Outcasts),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Which rooms a listing covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoomType {
    #[default]
    Public,
    All,
}

impl RoomType {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Public => "public",
            RoomType::All => "all",
        }
    }
}

/// RoomQuery filters a chat room listing
#[derive(Debug, Clone)]
pub struct RoomQuery {
    pub service: String,
    pub room_type: RoomType,
    pub search: Option<String>,
}

impl Default for RoomQuery {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            room_type: RoomType::Public,
            search: None,
        }
    }
}

/// RoomConfig describes a chat room to create or update
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub room_name: String,
    pub natural_name: Option<String>,
    pub description: Option<String>,
    pub service: String,
    pub subject: Option<String>,
    pub password: Option<String>,
    pub max_users: u32,
    pub persistent: bool,
    pub public: bool,
    pub registration: bool,
    pub visible_jids: bool,
    pub change_subject: bool,
    pub any_can_invite: bool,
    pub change_nickname: bool,
    pub log_enabled: bool,
    pub registered_nickname: bool,
    pub members_only: bool,
    pub moderated: bool,
    pub broadcast_roles: Option<Vec<String>>,
    pub owners: Option<Vec<String>>,
    pub admins: Option<Vec<String>>,
    pub members: Option<Vec<String>>,
    pub outcasts: Option<Vec<String>>,
}

impl RoomConfig {
    pub fn new(room_name: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            natural_name: None,
            description: None,
            service: DEFAULT_SERVICE.to_string(),
            subject: None,
            password: None,
            max_users: 0, // unlimited
            persistent: true,
            public: true,
            registration: true,
            visible_jids: true,
            change_subject: false,
            any_can_invite: false,
            change_nickname: true,
            log_enabled: true,
            registered_nickname: false,
            members_only: false,
            moderated: false,
            broadcast_roles: None,
            owners: None,
            admins: None,
            members: None,
            outcasts: None,
        }
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "roomName": self.room_name,
            "naturalName": self.natural_name,
            "description": self.description,
            "subject": self.subject,
            "password": self.password,
            "maxUsers": self.max_users,
            "persistent": self.persistent,
            "publicRoom": self.public,
            "registrationEnabled": self.registration,
            "canAnyoneDiscoverJID": self.visible_jids,
            "canOccupantsChangeSubject": self.change_subject,
            "canOccupantsInvite": self.any_can_invite,
            "canChangeNickname": self.change_nickname,
            "logEnabled": self.log_enabled,
            "loginRestrictedToNickname": self.registered_nickname,
            "membersOnly": self.members_only,
            "moderated": self.moderated,
            "broadcastPresenceRoles": {"broadcastPresenceRole": self.broadcast_roles},
            "owners": {"owner": self.owners},
            "admins": {"admin": self.admins},
            "members": {"member": self.members},
            "outcasts": {"outcast": self.outcasts},
        })
    }
}

/// LogQuery filters the security audit log
#[derive(Debug, Clone)]
pub struct LogQuery {
    pub username: Option<String>,
    pub offset: Option<u32>,
    pub limit: u32,
    /// Oldest entry, in seconds since the epoch
    pub start_time: Option<i64>,
    /// Most recent entry, in seconds since the epoch
    pub end_time: Option<i64>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            username: None,
            offset: None,
            limit: DEFAULT_LOG_LIMIT,
            start_time: None,
            end_time: None,
        }
    }
}

impl LogQuery {
    /// Query parameters; the limit is only sent when it differs from the default.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            params.push(("username", username.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset", offset.to_string()));
        }
        if self.limit != DEFAULT_LOG_LIMIT {
            params.push(("limit", self.limit.to_string()));
        }
        if let Some(start) = self.start_time {
            params.push(("startTime", start.to_string()));
        }
        if let Some(end) = self.end_time {
            params.push(("endTime", end.to_string()));
        }
        params
    }
}

/// User as returned by the users endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct User {
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub properties: Value,
}

/// ChatRoom summary as returned by the chatrooms endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatRoom {
    pub room_name: String,
    pub natural_name: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub occupants_count: Option<u32>,
    pub persistent: bool,
    pub public_room: bool,
    pub members_only: bool,
}

/// Occupant of a chat room
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Occupant {
    pub jid: String,
    pub role: Option<String>,
    pub affiliation: Option<String>,
    pub nick: Option<String>,
}

impl Occupant {
    /// Nickname: the resource part of an occupant JID, else the `nick` field.
    pub fn nickname(&self) -> Option<&str> {
        match self.jid.rsplit_once('/') {
            Some((_, resource)) => Some(resource),
            None => self.nick.as_deref().filter(|n| !n.is_empty()),
        }
    }
}

/// Session of a connected user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Session {
    pub session_id: Option<String>,
    pub username: Option<String>,
    pub resource: Option<String>,
    pub node: Option<String>,
    pub session_status: Option<String>,
    pub presence_status: Option<String>,
    pub host_address: Option<String>,
    pub host_name: Option<String>,
    pub creation_date: Option<Value>,
    pub last_action_date: Option<Value>,
    pub secure: Option<bool>,
}

/// One security audit log entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityLogEntry {
    pub log_id: Option<i64>,
    pub username: Option<String>,
    /// Seconds since the epoch
    pub timestamp: Option<i64>,
    pub summary: Option<String>,
    pub node: Option<String>,
    pub details: Option<String>,
}

/// System property
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Property {
    pub key: String,
    pub value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_payload() {
        let mut user = NewUser::new("alice", "secret");
        user.email = Some("alice@example.org".to_string());
        user.properties.insert("console.rows", "20");

        let payload = serde_json::to_value(&user).unwrap();
        assert_eq!(
            payload,
            json!({
                "username": "alice",
                "password": "secret",
                "email": "alice@example.org",
                "properties": {"property": [{"@key": "console.rows", "@value": "20"}]}
            })
        );
    }

    #[test]
    fn test_user_without_properties_omits_them() {
        let payload = serde_json::to_value(NewUser::new("bob", "pw")).unwrap();
        assert!(payload.get("properties").is_none());
        assert!(payload.get("name").is_none());
    }

    #[test]
    fn test_roster_payload() {
        let mut item = RosterItem::new("foo@example.org");
        item.subscription = Some(Subscription::Both);
        item.groups = vec!["Friends".to_string()];

        let payload = item.to_payload();
        assert_eq!(payload["subscriptionType"], json!(3));
        assert_eq!(payload["groups"], json!({"group": ["Friends"]}));
        assert_eq!(payload["nickname"], Value::Null);
        assert_eq!(Subscription::Remove.code(), -1);
    }

    #[test]
    fn test_room_payload_defaults() {
        let mut room = RoomConfig::new("lobby");
        room.owners = Some(vec!["owner@localhost".to_string()]);

        let payload = room.to_payload();
        assert_eq!(payload["roomName"], "lobby");
        assert_eq!(payload["maxUsers"], 0);
        assert_eq!(payload["persistent"], true);
        assert_eq!(payload["canOccupantsChangeSubject"], false);
        assert_eq!(payload["owners"], json!({"owner": ["owner@localhost"]}));
        assert_eq!(payload["admins"], json!({"admin": null}));
    }

    #[test]
    fn test_log_query_params() {
        assert!(LogQuery::default().to_params().is_empty());

        let query = LogQuery {
            username: Some("admin".to_string()),
            offset: Some(10),
            limit: 20,
            start_time: Some(1_700_000_000),
            end_time: None,
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("username", "admin".to_string()),
                ("offset", "10".to_string()),
                ("limit", "20".to_string()),
                ("startTime", "1700000000".to_string()),
            ]
        );
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("owners".parse::<Role>().unwrap(), Role::Owners);
        assert_eq!("member".parse::<Role>().unwrap(), Role::Members);
        assert!("moderators".parse::<Role>().is_err());
        assert_eq!(Role::Outcasts.as_path(), "outcasts");
    }

    #[test]
    fn test_occupant_nickname() {
        let occupant = Occupant {
            jid: "lobby@conference.example.org/alice".to_string(),
            ..Default::default()
        };
        assert_eq!(occupant.nickname(), Some("alice"));

        let occupant = Occupant {
            jid: "bob@example.org".to_string(),
            nick: Some("bobby".to_string()),
            ..Default::default()
        };
        assert_eq!(occupant.nickname(), Some("bobby"));
    }

    #[test]
    fn test_read_models_tolerate_missing_fields() {
        let room: ChatRoom =
            serde_json::from_value(json!({"roomName": "dev", "publicRoom": true})).unwrap();
        assert_eq!(room.room_name, "dev");
        assert!(room.public_room);
        assert_eq!(room.description, None);

        let entry: SecurityLogEntry =
            serde_json::from_value(json!({"logId": 22, "username": "admin"})).unwrap();
        assert_eq!(entry.log_id, Some(22));
    }
}
