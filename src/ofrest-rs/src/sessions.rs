use ofrest_core::{normalize, Shape};
use reqwest::Method;
use serde_json::Value;

use crate::client::join;
use crate::{Client, Result};

const DEFAULT_ENDPOINT: &str = "/plugins/restapi/v1/sessions";

/// User session listing and termination
#[derive(Debug, Clone)]
pub struct Sessions<'a> {
    client: &'a Client,
    endpoint: String,
}

impl<'a> Sessions<'a> {
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

    /// Sessions of all users
    pub fn get_sessions(&self) -> Result<Value> {
        self.client.get(&self.endpoint, &[])
    }

    /// Sessions of one user
    pub fn get_user_sessions(&self, username: &str) -> Result<Value> {
        self.client.get(&join(&self.endpoint, &[username]), &[])
    }

    /// Sessions as a flat list; all users unless `username` is given
    pub fn list_sessions(&self, username: Option<&str>) -> Result<Vec<Value>> {
        let envelope = match username {
            Some(username) => self.get_user_sessions(username)?,
            None => self.get_sessions()?,
        };
        Ok(normalize(&envelope, Shape::SESSIONS))
    }

    /// Close every session of a user
    pub fn close_user_sessions(&self, username: &str) -> Result<()> {
        self.client
            .send(Method::DELETE, &join(&self.endpoint, &[username]), &[], None)
    }
}
