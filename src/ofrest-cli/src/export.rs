//! Filebeat export
//!
//! Shapes users, chat rooms and security audit log entries as flat JSON
//! documents and posts them one by one to a Filebeat HTTP input.

use std::ffi::OsString;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use ofrest_core::{normalize, Occupant, Shape};
use serde_json::{json, Map, Value};

const FILEBEAT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the exported data came from
#[derive(Debug, Clone)]
pub struct HostInfo {
    pub hostname: String,
    pub server: String,
    pub xmpp_domain: Option<String>,
}

impl HostInfo {
    pub fn detect(server: &str, xmpp_domain: Option<String>) -> Self {
        Self {
            hostname: hostname_or_localhost(hostname::get()),
            server: server.to_string(),
            xmpp_domain,
        }
    }

    fn stamp(&self, doc: &mut Map<String, Value>, timestamp: String) {
        let mut openfire = json!({ "server": self.server });
        if let Some(domain) = &self.xmpp_domain {
            openfire["domain"] = json!(domain);
        }
        doc.insert("@timestamp".to_string(), json!(timestamp));
        doc.insert("host".to_string(), json!({ "name": self.hostname }));
        doc.insert("openfire".to_string(), openfire);
    }
}

fn hostname_or_localhost(lookup: std::io::Result<OsString>) -> String {
    match lookup {
        Ok(name) if !name.is_empty() => name.to_string_lossy().into_owned(),
        Ok(_) => "localhost".to_string(),
        Err(e) => {
            tracing::warn!("Could not read hostname, using localhost: {}", e);
            "localhost".to_string()
        }
    }
}

pub fn user_document(user: &Value, host: &HostInfo, now: DateTime<Utc>) -> Value {
    let mut doc = Map::new();
    doc.insert("username".to_string(), field(user, "username"));
    doc.insert("name".to_string(), field(user, "name"));
    doc.insert("email".to_string(), field(user, "email"));
    doc.insert("properties".to_string(), Value::Object(user_properties(user)));
    host.stamp(&mut doc, iso(now));
    Value::Object(doc)
}

/// Collapse `[{"key": k, "value": v}, ...]` into `{k: v, ...}`
fn user_properties(user: &Value) -> Map<String, Value> {
    normalize(user, Shape::nested("properties", "property"))
        .iter()
        .filter_map(|prop| {
            let key = prop.get("key").or_else(|| prop.get("@key"))?.as_str()?;
            let value = prop.get("value").or_else(|| prop.get("@value"))?;
            Some((key.to_string(), value.clone()))
        })
        .collect()
}

pub fn room_document(
    room: &Value,
    occupants: &[Value],
    host: &HostInfo,
    now: DateTime<Utc>,
) -> Value {
    let occupants: Vec<Value> = occupants.iter().map(occupant_document).collect();
    let list = |shape: Shape| Value::Array(normalize(room, shape));

    let mut doc = Map::new();
    for (target, source) in [
        ("room_name", "roomName"),
        ("natural_name", "naturalName"),
        ("description", "description"),
        ("subject", "subject"),
        ("max_users", "maxUsers"),
        ("persistent", "persistent"),
        ("public_room", "publicRoom"),
        ("registration_enabled", "registrationEnabled"),
        ("can_anyone_discover_jid", "canAnyoneDiscoverJID"),
        ("can_occupants_change_subject", "canOccupantsChangeSubject"),
        ("can_occupants_invite", "canOccupantsInvite"),
        ("can_change_nickname", "canChangeNickname"),
        ("log_enabled", "logEnabled"),
        ("login_restricted_to_nickname", "loginRestrictedToNickname"),
        ("members_only", "membersOnly"),
        ("moderated", "moderated"),
    ] {
        doc.insert(target.to_string(), field(room, source));
    }
    doc.insert(
        "service_name".to_string(),
        room.get("serviceName")
            .cloned()
            .unwrap_or_else(|| json!(ofrest_core::DEFAULT_SERVICE)),
    );
    doc.insert(
        "creation_date".to_string(),
        millis_to_iso(&field(room, "creationDate")),
    );
    doc.insert(
        "modification_date".to_string(),
        millis_to_iso(&field(room, "modificationDate")),
    );
    doc.insert(
        "broadcast_presence_roles".to_string(),
        list(Shape::nested("broadcastPresenceRoles", "broadcastPresenceRole")),
    );
    doc.insert(
        "allow_pm".to_string(),
        room.get("allowPM").cloned().unwrap_or_else(|| json!("anyone")),
    );
    doc.insert(
        "users".to_string(),
        json!({
            "owners": list(Shape::OWNERS),
            "admins": list(Shape::ADMINS),
            "members": list(Shape::MEMBERS),
            "outcasts": list(Shape::OUTCASTS),
        }),
    );
    doc.insert(
        "groups".to_string(),
        json!({
            "owner_groups": list(Shape::OWNER_GROUPS),
            "admin_groups": list(Shape::ADMIN_GROUPS),
            "member_groups": list(Shape::MEMBER_GROUPS),
            "outcast_groups": list(Shape::OUTCAST_GROUPS),
        }),
    );
    doc.insert("occupant_count".to_string(), json!(occupants.len()));
    doc.insert("occupants".to_string(), Value::Array(occupants));
    host.stamp(&mut doc, iso(now));
    Value::Object(doc)
}

fn occupant_document(raw: &Value) -> Value {
    let occupant: Occupant = serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
        tracing::debug!(entry = %raw, "Undecodable occupant: {}", e);
        Occupant::default()
    });
    json!({
        "jid": occupant.jid,
        "role": occupant.role.as_deref().unwrap_or(""),
        "affiliation": occupant.affiliation.as_deref().unwrap_or(""),
        "nickname": occupant.nickname().unwrap_or("Unknown"),
    })
}

/// Audit log entries keep their own timestamp (seconds) as `@timestamp`
pub fn log_document(log: &Value, host: &HostInfo) -> Value {
    let seconds = match log.get("timestamp") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    };
    let timestamp = Utc
        .timestamp_opt(seconds, 0)
        .single()
        .unwrap_or_default();

    let mut doc = Map::new();
    doc.insert("log_id".to_string(), field(log, "logId"));
    doc.insert("username".to_string(), field(log, "username"));
    doc.insert("summary".to_string(), field(log, "summary"));
    doc.insert("details".to_string(), field(log, "details"));
    doc.insert("node".to_string(), field(log, "node"));
    doc.insert("timestamp_ms".to_string(), field(log, "timestamp"));
    host.stamp(&mut doc, iso(timestamp));
    Value::Object(doc)
}

fn field(source: &Value, key: &str) -> Value {
    source.get(key).cloned().unwrap_or(Value::Null)
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Millisecond epoch numbers become ISO 8601; anything else passes through
fn millis_to_iso(value: &Value) -> Value {
    let Some(ms) = value.as_f64() else {
        return value.clone();
    };
    match Utc.timestamp_millis_opt(ms as i64).single() {
        Some(at) => json!(iso(at)),
        None => value.clone(),
    }
}

/// Resolve `<n>m|h|d|w` into a `(start, end)` window in epoch seconds ending at `now`
pub fn parse_since(window: &str, now: DateTime<Utc>) -> Result<(i64, i64)> {
    let invalid = || {
        anyhow::anyhow!(
            "Invalid time format: {window}. Expected <number><unit> (e.g. '1h', '30m', '2d', '1w')"
        )
    };
    let unit = window.chars().last().ok_or_else(invalid)?;
    let digits = &window[..window.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: i64 = digits.parse().map_err(|_| invalid())?;

    let span = match unit {
        'm' => chrono::Duration::try_minutes(value),
        'h' => chrono::Duration::try_hours(value),
        'd' => chrono::Duration::try_days(value),
        'w' => chrono::Duration::try_weeks(value),
        _ => return Err(invalid()),
    }
    .ok_or_else(invalid)?;

    let start = now.checked_sub_signed(span).ok_or_else(invalid)?;
    Ok((start.timestamp(), now.timestamp()))
}

/// Outcome of one export run
#[derive(Debug, Default)]
pub struct ExportReport {
    pub success: usize,
    pub failed: Vec<String>,
}

/// Delivers documents to Filebeat, or prints them in dry-run mode
pub struct FilebeatSink {
    http: reqwest::blocking::Client,
    url: Option<String>,
    dry_run: bool,
}

impl FilebeatSink {
    pub fn new(url: Option<String>, insecure: bool, dry_run: bool) -> Result<Self> {
        if !dry_run && url.is_none() {
            anyhow::bail!("--url is required unless --dry-run is given");
        }
        let http = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(FILEBEAT_TIMEOUT)
            .build()?;
        Ok(Self { http, url, dry_run })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn describe(&self) -> String {
        match (&self.url, self.dry_run) {
            (Some(url), true) => format!("DRY RUN: would send data to Filebeat at {url}"),
            (None, _) => "DRY RUN: would send data to Filebeat".to_string(),
            (Some(url), false) => format!("Sending data to Filebeat at {url}"),
        }
    }

    /// Send one document; failures are recorded, never propagated
    pub fn deliver(&self, id: &str, doc: &Value, report: &mut ExportReport) {
        if self.dry_run {
            println!("\nDRY RUN: data that would be sent for {id}:");
            println!(
                "{}",
                serde_json::to_string_pretty(doc).unwrap_or_else(|_| doc.to_string())
            );
            report.success += 1;
            return;
        }

        let Some(url) = &self.url else {
            report.failed.push(id.to_string());
            return;
        };

        match self.http.post(url).json(doc).send() {
            Ok(response) if response.status().is_success() => report.success += 1,
            Ok(response) => {
                let status = response.status();
                let body = response.text().unwrap_or_default();
                tracing::error!("Failed to send {}: {} {}", id, status, body);
                report.failed.push(id.to_string());
            }
            Err(e) => {
                tracing::error!("Error sending {}: {}", id, e);
                report.failed.push(id.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostInfo {
        HostInfo {
            hostname: "exporter".to_string(),
            server: "https://of.example.org:9091".to_string(),
            xmpp_domain: Some("example.org".to_string()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 26, 15, 21, 15).unwrap()
    }

    #[test]
    fn test_user_document() {
        let user = json!({
            "username": "alice",
            "name": "Alice",
            "email": "alice@example.org",
            "properties": [{"key": "department", "value": "ops"}]
        });
        let doc = user_document(&user, &host(), now());

        assert_eq!(doc["username"], "alice");
        assert_eq!(doc["properties"], json!({"department": "ops"}));
        assert_eq!(doc["host"]["name"], "exporter");
        assert_eq!(doc["openfire"]["domain"], "example.org");
        assert_eq!(doc["@timestamp"], "2025-09-26T15:21:15+00:00");
    }

    #[test]
    fn test_user_document_nested_property() {
        let user = json!({
            "username": "bob",
            "properties": {"property": {"@key": "console.rows", "@value": "20"}}
        });
        let doc = user_document(&user, &host(), now());
        assert_eq!(doc["properties"], json!({"console.rows": "20"}));
        assert_eq!(doc["email"], Value::Null);
    }

    #[test]
    fn test_log_document() {
        let log = json!({
            "logId": 22,
            "username": "admin",
            "timestamp": 1758900075,
            "summary": "Successful admin console login attempt",
            "node": "192.168.5.15"
        });
        let doc = log_document(&log, &host());

        assert_eq!(doc["log_id"], 22);
        assert_eq!(doc["timestamp_ms"], 1758900075);
        assert_eq!(doc["@timestamp"], "2025-09-26T15:21:15+00:00");
        assert_eq!(doc["details"], Value::Null);
    }

    #[test]
    fn test_log_document_bad_timestamp() {
        let doc = log_document(&json!({"logId": 1, "timestamp": "later"}), &host());
        assert_eq!(doc["@timestamp"], "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_room_document() {
        let room = json!({
            "roomName": "lobby",
            "naturalName": "Lobby",
            "creationDate": 1758900075000i64,
            "modificationDate": "unknown",
            "owners": {"owner": "admin@example.org"},
            "members": ["a@example.org", "b@example.org"],
            "persistent": true
        });
        let occupants = vec![
            json!({"jid": "lobby@conference.example.org/alice", "role": "moderator", "affiliation": "owner"}),
            json!({"jid": "bob@example.org", "nick": "bobby"}),
        ];
        let doc = room_document(&room, &occupants, &host(), now());

        assert_eq!(doc["room_name"], "lobby");
        assert_eq!(doc["service_name"], "conference");
        assert_eq!(doc["creation_date"], "2025-09-26T15:21:15+00:00");
        assert_eq!(doc["modification_date"], "unknown");
        assert_eq!(doc["users"]["owners"], json!(["admin@example.org"]));
        assert_eq!(doc["users"]["members"].as_array().unwrap().len(), 2);
        assert_eq!(doc["users"]["outcasts"], json!([]));
        assert_eq!(doc["allow_pm"], "anyone");
        assert_eq!(doc["occupant_count"], 2);
        assert_eq!(doc["occupants"][0]["nickname"], "alice");
        assert_eq!(doc["occupants"][1]["nickname"], "bobby");
        assert_eq!(doc["occupants"][1]["role"], "");
    }

    #[test]
    fn test_fractional_millis_keep_precision() {
        assert_eq!(
            millis_to_iso(&json!(1758900075123i64)),
            json!("2025-09-26T15:21:15.123+00:00")
        );
        assert_eq!(millis_to_iso(&json!("n/a")), json!("n/a"));
    }

    #[test]
    fn test_occupant_without_nickname() {
        let doc = occupant_document(&json!({"jid": "carol@example.org", "role": "visitor"}));
        assert_eq!(doc["nickname"], "Unknown");
        assert_eq!(doc["role"], "visitor");
        assert_eq!(doc["affiliation"], "");
    }

    #[test]
    fn test_hostname_fallback() {
        let failed = Err(std::io::Error::new(std::io::ErrorKind::Other, "no uts name"));
        assert_eq!(hostname_or_localhost(failed), "localhost");
        assert_eq!(hostname_or_localhost(Ok(OsString::new())), "localhost");
        assert_eq!(hostname_or_localhost(Ok(OsString::from("vm"))), "vm");
    }

    #[test]
    fn test_detect_uses_system_hostname() {
        let expected = hostname::get().unwrap().to_string_lossy().into_owned();
        let host = HostInfo::detect("https://of:9091", None);
        assert_eq!(host.hostname, expected);
        assert_eq!(host.server, "https://of:9091");
    }

    #[test]
    fn test_parse_since() {
        let end = now().timestamp();
        assert_eq!(parse_since("30m", now()).unwrap(), (end - 1800, end));
        assert_eq!(parse_since("1h", now()).unwrap(), (end - 3600, end));
        assert_eq!(parse_since("2d", now()).unwrap(), (end - 2 * 86400, end));
        assert_eq!(parse_since("1w", now()).unwrap(), (end - 7 * 86400, end));

        for bad in ["", "h", "1y", "-1h", "1.5h", "1 h"] {
            assert!(parse_since(bad, now()).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_sink_requires_url() {
        assert!(FilebeatSink::new(None, false, false).is_err());
        let sink = FilebeatSink::new(None, false, true).unwrap();
        assert_eq!(sink.describe(), "DRY RUN: would send data to Filebeat");
    }

    #[test]
    fn test_dry_run_counts_success() {
        let sink = FilebeatSink::new(None, false, true).unwrap();
        let mut report = ExportReport::default();
        sink.deliver("log 1", &json!({"log_id": 1}), &mut report);
        assert_eq!(report.success, 1);
        assert!(report.failed.is_empty());
    }
}
