use ofrest_core::{normalize, normalize_as, Property, Shape};
use reqwest::Method;
use serde_json::{json, Value};

use crate::client::{join, parent};
use crate::{Client, Result};

const DEFAULT_ENDPOINT: &str = "/plugins/restapi/v1/system/properties";

/// System properties and statistics
#[derive(Debug, Clone)]
pub struct System<'a> {
    client: &'a Client,
    endpoint: String,
}

impl<'a> System<'a> {
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

    pub fn get_props(&self) -> Result<Value> {
        self.client.get(&self.endpoint, &[])
    }

    pub fn list_props(&self) -> Result<Vec<Value>> {
        Ok(normalize(&self.get_props()?, Shape::PROPERTIES))
    }

    pub fn get_prop(&self, key: &str) -> Result<Value> {
        self.client.get(&join(&self.endpoint, &[key]), &[])
    }

    /// Create or update a property
    pub fn update_prop(&self, key: &str, value: &str) -> Result<()> {
        let body = json!({ "@key": key, "@value": value });
        self.client
            .send(Method::POST, &self.endpoint, &[], Some(&body))
    }

    pub fn delete_prop(&self, key: &str) -> Result<()> {
        self.client
            .send(Method::DELETE, &join(&self.endpoint, &[key]), &[], None)
    }

    /// Concurrent session statistics
    pub fn get_concurrent_sessions(&self) -> Result<Value> {
        self.client
            .get(&join(parent(&self.endpoint), &["statistics", "sessions"]), &[])
    }

    /// Value of the `xmpp.domain` property, if set
    pub fn xmpp_domain(&self) -> Result<Option<String>> {
        let props: Vec<Property> = normalize_as(&self.get_props()?, Shape::PROPERTIES);
        Ok(props
            .into_iter()
            .find(|p| p.key == "xmpp.domain")
            .and_then(|p| p.value))
    }
}
