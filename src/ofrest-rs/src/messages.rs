use reqwest::Method;
use serde_json::{json, Value};

use crate::client::join;
use crate::{Client, Result};

const DEFAULT_ENDPOINT: &str = "/plugins/restapi/v1/messages/users";
const UNREAD_ENDPOINT: &str = "/plugins/restapi/v1/archive/messages/unread";

/// Broadcast messages and unread message counts
#[derive(Debug, Clone)]
pub struct Messages<'a> {
    client: &'a Client,
    endpoint: String,
}

impl<'a> Messages<'a> {
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

    /// Send a server message to all online users
    pub fn send_broadcast(&self, message: &str) -> Result<()> {
        let body = json!({ "body": message });
        self.client
            .send(Method::POST, &self.endpoint, &[], Some(&body))
    }

    /// Unread message count for a JID
    pub fn get_unread_messages(&self, jid: &str) -> Result<Value> {
        self.client.get(&join(UNREAD_ENDPOINT, &[jid]), &[])
    }
}
