use ofrest_core::{normalize, NewGroup, Shape};
use reqwest::Method;
use serde_json::Value;

use crate::client::join;
use crate::{Client, Result};

const DEFAULT_ENDPOINT: &str = "/plugins/restapi/v1/groups";

/// Group management
#[derive(Debug, Clone)]
pub struct Groups<'a> {
    client: &'a Client,
    endpoint: String,
}

impl<'a> Groups<'a> {
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

    pub fn get_groups(&self) -> Result<Value> {
        self.client.get(&self.endpoint, &[])
    }

    pub fn list_groups(&self) -> Result<Vec<Value>> {
        Ok(normalize(&self.get_groups()?, Shape::GROUPS))
    }

    pub fn get_group(&self, groupname: &str) -> Result<Value> {
        self.client.get(&join(&self.endpoint, &[groupname]), &[])
    }

    pub fn add_group(&self, groupname: &str, description: &str) -> Result<()> {
        let body = serde_json::to_value(NewGroup {
            name: groupname.to_string(),
            description: description.to_string(),
        })?;
        self.client
            .send(Method::POST, &self.endpoint, &[], Some(&body))
    }

    pub fn update_group(&self, groupname: &str, description: &str) -> Result<()> {
        let body = serde_json::to_value(NewGroup {
            name: groupname.to_string(),
            description: description.to_string(),
        })?;
        self.client.send(
            Method::PUT,
            &join(&self.endpoint, &[groupname]),
            &[],
            Some(&body),
        )
    }

    pub fn delete_group(&self, groupname: &str) -> Result<()> {
        self.client
            .send(Method::DELETE, &join(&self.endpoint, &[groupname]), &[], None)
    }
}
