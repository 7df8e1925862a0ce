use ofrest_core::{normalize, NewUser, RosterItem, Shape, UserUpdate};
use reqwest::Method;
use serde_json::{json, Value};

use crate::client::{join, parent};
use crate::{Client, Result};

const DEFAULT_ENDPOINT: &str = "/plugins/restapi/v1/users";

/// User, group membership, lockout and roster management
#[derive(Debug, Clone)]
pub struct Users<'a> {
    client: &'a Client,
    endpoint: String,
}

impl<'a> Users<'a> {
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

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Retrieve exact user info
    pub fn get_user(&self, username: &str) -> Result<Value> {
        self.client.get(&join(&self.endpoint, &[username]), &[])
    }

    /// Retrieve all users, optionally filtered by a `%query%` name search
    pub fn get_users(&self, query: Option<&str>) -> Result<Value> {
        let params: Vec<(&str, String)> = query
            .filter(|q| !q.is_empty())
            .map(|q| ("search", q.to_string()))
            .into_iter()
            .collect();
        self.client.get(&self.endpoint, &params)
    }

    /// Users as a flat list, whatever shape the server answered with
    pub fn list_users(&self, query: Option<&str>) -> Result<Vec<Value>> {
        Ok(normalize(&self.get_users(query)?, Shape::USERS))
    }

    pub fn add_user(&self, user: &NewUser) -> Result<()> {
        let body = serde_json::to_value(user)?;
        self.client
            .send(Method::POST, &self.endpoint, &[], Some(&body))
    }

    pub fn delete_user(&self, username: &str) -> Result<()> {
        self.client
            .send(Method::DELETE, &join(&self.endpoint, &[username]), &[], None)
    }

    /// Update a user; a missing new username keeps the current one
    pub fn update_user(&self, username: &str, update: &UserUpdate) -> Result<()> {
        let mut update = update.clone();
        update.username.get_or_insert_with(|| username.to_string());
        let body = serde_json::to_value(&update)?;
        self.client.send(
            Method::PUT,
            &join(&self.endpoint, &[username]),
            &[],
            Some(&body),
        )
    }

    /// Retrieve the groups a user belongs to
    pub fn get_user_groups(&self, username: &str) -> Result<Value> {
        self.client
            .get(&join(&self.endpoint, &[username, "groups"]), &[])
    }

    /// Group names a user belongs to
    pub fn list_user_groups(&self, username: &str) -> Result<Vec<String>> {
        let envelope = self.get_user_groups(username)?;
        Ok(normalize(&envelope, Shape::USER_GROUPS)
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    pub fn add_user_groups(&self, username: &str, groups: &[&str]) -> Result<()> {
        let body = json!({ "groupname": groups });
        self.client.send(
            Method::POST,
            &join(&self.endpoint, &[username, "groups"]),
            &[],
            Some(&body),
        )
    }

    pub fn delete_user_groups(&self, username: &str, groups: &[&str]) -> Result<()> {
        let body = json!({ "groupname": groups });
        self.client.send(
            Method::DELETE,
            &join(&self.endpoint, &[username, "groups"]),
            &[],
            Some(&body),
        )
    }

    /// Lock a user out of the system
    pub fn lock_user(&self, username: &str) -> Result<()> {
        self.client
            .send(Method::POST, &self.lockout_path(username), &[], None)
    }

    pub fn unlock_user(&self, username: &str) -> Result<()> {
        self.client
            .send(Method::DELETE, &self.lockout_path(username), &[], None)
    }

    /// Retrieve a user's roster
    pub fn get_user_roster(&self, username: &str) -> Result<Value> {
        self.client
            .get(&join(&self.endpoint, &[username, "roster"]), &[])
    }

    pub fn add_user_roster_item(&self, username: &str, item: &RosterItem) -> Result<()> {
        self.client.send(
            Method::POST,
            &join(&self.endpoint, &[username, "roster"]),
            &[],
            Some(&item.to_payload()),
        )
    }

    pub fn update_user_roster_item(&self, username: &str, item: &RosterItem) -> Result<()> {
        self.client.send(
            Method::PUT,
            &join(&self.endpoint, &[username, "roster", item.jid.as_str()]),
            &[],
            Some(&item.to_payload()),
        )
    }

    pub fn delete_user_roster_item(&self, username: &str, jid: &str) -> Result<()> {
        self.client.send(
            Method::DELETE,
            &join(&self.endpoint, &[username, "roster", jid]),
            &[],
            None,
        )
    }

    fn lockout_path(&self, username: &str) -> String {
        join(parent(&self.endpoint), &["lockouts", username])
    }
}
