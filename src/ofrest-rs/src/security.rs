use ofrest_core::{normalize, LogQuery, Shape};
use serde_json::Value;

use crate::{Client, Result};

const DEFAULT_ENDPOINT: &str = "/plugins/restapi/v1/logs/security";

/// Read access to the security audit log
#[derive(Debug, Clone)]
pub struct SecurityAuditLog<'a> {
    client: &'a Client,
    endpoint: String,
}

impl<'a> SecurityAuditLog<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn get_logs(&self, query: &LogQuery) -> Result<Value> {
        self.client.get(&self.endpoint, &query.to_params())
    }

    pub fn get_logs_by_username(&self, username: &str, limit: u32) -> Result<Value> {
        self.get_logs(&LogQuery {
            username: Some(username.to_string()),
            limit,
            ..Default::default()
        })
    }

    /// Most recent entries, 20 unless told otherwise
    pub fn get_recent_logs(&self, limit: Option<u32>) -> Result<Value> {
        self.get_logs(&LogQuery {
            limit: limit.unwrap_or(20),
            ..Default::default()
        })
    }

    /// Entries between two epoch-second timestamps
    pub fn get_logs_in_timeframe(&self, start_time: i64, end_time: i64, limit: u32) -> Result<Value> {
        self.get_logs(&LogQuery {
            start_time: Some(start_time),
            end_time: Some(end_time),
            limit,
            ..Default::default()
        })
    }

    /// Flatten a `get_logs` response into individual entries
    pub fn extract_log_entries(&self, envelope: &Value) -> Vec<Value> {
        normalize(envelope, Shape::SECURITY_LOGS)
    }
}
