use anyhow::Result;
use chrono::{TimeZone, Utc};
use ofrest_core::{
    normalize, normalize_as, ChatRoom, LogQuery, RoomQuery, SecurityLogEntry, Session, Shape, User,
};
use ofrest_rs::Client;
use serde_json::Value;

use crate::export::{self, ExportReport, FilebeatSink, HostInfo};
use crate::output::{OutputFormat, Table};

fn print_json(entries: &[Value]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(entries)?);
    Ok(())
}

fn render(table: &Table, format: OutputFormat, noun: &str) {
    if table.is_empty() {
        println!("No {noun} found.");
        return;
    }
    match format {
        OutputFormat::Csv => print!("{}", table.to_csv()),
        _ => {
            print!("{}", table.to_text());
            println!("\nTotal {noun}: {}", table.len());
        }
    }
}

fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

fn joined(entries: Vec<Value>) -> String {
    entries
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

pub fn list_users(client: &Client, search: Option<&str>, format: OutputFormat) -> Result<()> {
    let envelope = client.users().get_users(search)?;
    if format == OutputFormat::Json {
        return print_json(&normalize(&envelope, Shape::USERS));
    }

    let mut table = Table::new(vec!["Username", "Name", "Email"]);
    for user in normalize_as::<User>(&envelope, Shape::USERS) {
        table.push(vec![user.username, text(user.name), text(user.email)]);
    }
    render(&table, format, "users");
    Ok(())
}

pub fn list_rooms(
    client: &Client,
    query: &RoomQuery,
    show_users: bool,
    format: OutputFormat,
) -> Result<()> {
    let envelope = client.muc().get_rooms(query)?;
    let rooms = normalize(&envelope, Shape::CHAT_ROOMS);
    if format == OutputFormat::Json {
        return print_json(&rooms);
    }

    let mut headers = vec![
        "Room",
        "Natural name",
        "Description",
        "Occupants",
        "Public",
        "Persistent",
    ];
    if show_users {
        headers.extend(["Owners", "Admins", "Members"]);
    }
    let mut table = Table::new(headers).limit(2, 30);

    for raw in &rooms {
        let Ok(room) = serde_json::from_value::<ChatRoom>(raw.clone()) else {
            tracing::debug!(entry = %raw, "Skipping undecodable room");
            continue;
        };
        let mut row = vec![
            room.room_name,
            text(room.natural_name),
            text(room.description),
            room.occupants_count.unwrap_or(0).to_string(),
            room.public_room.to_string(),
            room.persistent.to_string(),
        ];
        if show_users {
            row.push(joined(normalize(raw, Shape::OWNERS)));
            row.push(joined(normalize(raw, Shape::ADMINS)));
            row.push(joined(normalize(raw, Shape::MEMBERS)));
        }
        table.push(row);
    }
    render(&table, format, "rooms");
    Ok(())
}

pub fn list_sessions(client: &Client, username: Option<&str>, format: OutputFormat) -> Result<()> {
    let sessions = client.sessions();
    let envelope = match username {
        Some(username) => sessions.get_user_sessions(username)?,
        None => sessions.get_sessions()?,
    };
    if format == OutputFormat::Json {
        return print_json(&normalize(&envelope, Shape::SESSIONS));
    }

    let mut table = Table::new(vec![
        "Username", "Resource", "Node", "Status", "Presence", "Address",
    ]);
    for session in normalize_as::<Session>(&envelope, Shape::SESSIONS) {
        table.push(vec![
            text(session.username),
            text(session.resource),
            text(session.node),
            text(session.session_status),
            text(session.presence_status),
            text(session.host_address),
        ]);
    }
    render(&table, format, "sessions");
    Ok(())
}

pub fn list_audit_logs(client: &Client, query: &LogQuery, format: OutputFormat) -> Result<()> {
    let audit = client.security_audit_log();
    let envelope = audit.get_logs(query)?;
    if format == OutputFormat::Json {
        return print_json(&audit.extract_log_entries(&envelope));
    }

    let mut table =
        Table::new(vec!["ID", "Time", "Username", "Node", "Summary"]).limit(4, 60);
    for entry in normalize_as::<SecurityLogEntry>(&envelope, Shape::SECURITY_LOGS) {
        let time = entry
            .timestamp
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        table.push(vec![
            entry.log_id.map(|id| id.to_string()).unwrap_or_default(),
            time,
            text(entry.username),
            text(entry.node),
            text(entry.summary),
        ]);
    }
    render(&table, format, "security audit logs");
    Ok(())
}

/// Host details stamped on every exported document
fn host_info(client: &Client) -> HostInfo {
    let domain = match client.system().xmpp_domain() {
        Ok(domain) => domain,
        Err(e) => {
            tracing::warn!("Could not read xmpp.domain: {}", e);
            None
        }
    };
    HostInfo::detect(&client.config().host, domain)
}

fn summarize(report: &ExportReport, sink: &FilebeatSink, noun: &str) -> Result<()> {
    if sink.is_dry_run() {
        tracing::info!("DRY RUN: would have sent {} {}", report.success, noun);
        return Ok(());
    }
    tracing::info!(
        "Sent {} {} successfully, {} failed",
        report.success,
        noun,
        report.failed.len()
    );
    if !report.failed.is_empty() {
        anyhow::bail!("Failed {}: {}", noun, report.failed.join(", "));
    }
    Ok(())
}

pub fn export_users(client: &Client, search: Option<&str>, sink: &FilebeatSink) -> Result<()> {
    let users = client.users().list_users(search)?;
    if users.is_empty() {
        tracing::info!("No users found.");
        return Ok(());
    }

    let host = host_info(client);
    tracing::info!("{}", sink.describe());
    let now = Utc::now();
    let mut report = ExportReport::default();
    for user in &users {
        let id = user
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        sink.deliver(id, &export::user_document(user, &host, now), &mut report);
    }
    summarize(&report, sink, "users")
}

pub fn export_rooms(client: &Client, query: &RoomQuery, sink: &FilebeatSink) -> Result<()> {
    let rooms = client.muc().list_rooms(query)?;
    if rooms.is_empty() {
        tracing::info!("No rooms found.");
        return Ok(());
    }

    let host = host_info(client);
    tracing::info!("{}", sink.describe());
    let now = Utc::now();
    let mut report = ExportReport::default();
    for room in &rooms {
        let name = room
            .get("roomName")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        // A room without reachable occupants is still exported
        let occupants = client
            .muc()
            .list_room_occupants(name, &query.service)
            .unwrap_or_else(|e| {
                tracing::debug!("No occupants for {}: {}", name, e);
                Vec::new()
            });
        let doc = export::room_document(room, &occupants, &host, now);
        sink.deliver(name, &doc, &mut report);
    }
    summarize(&report, sink, "rooms")
}

pub fn export_audit_logs(client: &Client, query: &LogQuery, sink: &FilebeatSink) -> Result<()> {
    let audit = client.security_audit_log();
    let logs = audit.extract_log_entries(&audit.get_logs(query)?);
    if logs.is_empty() {
        tracing::info!("No security audit logs found.");
        return Ok(());
    }

    let host = host_info(client);
    tracing::info!("{}", sink.describe());
    let mut report = ExportReport::default();
    for log in &logs {
        let id = match log.get("logId") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => "unknown".to_string(),
        };
        sink.deliver(&id, &export::log_document(log, &host), &mut report);
    }
    summarize(&report, sink, "security audit logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_joined_role_list() {
        let room = json!({"owners": {"owner": "admin@example.org"}, "members": ["a@x", "b@x"]});
        assert_eq!(joined(normalize(&room, Shape::OWNERS)), "admin@example.org");
        assert_eq!(joined(normalize(&room, Shape::MEMBERS)), "a@x;b@x");
        assert_eq!(joined(normalize(&room, Shape::ADMINS)), "");
    }
}
