use ofrest_core::{normalize, Role, RoomConfig, RoomQuery, Shape};
use reqwest::Method;
use serde_json::Value;

use crate::client::join;
use crate::{Client, Result};

const DEFAULT_ENDPOINT: &str = "/plugins/restapi/v1/chatrooms";

/// Multi-user chat room management
///
/// Every call names its Group Chat Service through the `servicename`
/// query parameter.
#[derive(Debug, Clone)]
pub struct Muc<'a> {
    client: &'a Client,
    endpoint: String,
}

impl<'a> Muc<'a> {
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

    pub fn get_room(&self, roomname: &str, service: &str) -> Result<Value> {
        self.client
            .get(&join(&self.endpoint, &[roomname]), &service_param(service))
    }

    pub fn get_rooms(&self, query: &RoomQuery) -> Result<Value> {
        let mut params = vec![
            ("servicename", query.service.clone()),
            ("type", query.room_type.as_str().to_string()),
        ];
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        self.client.get(&self.endpoint, &params)
    }

    pub fn list_rooms(&self, query: &RoomQuery) -> Result<Vec<Value>> {
        Ok(normalize(&self.get_rooms(query)?, Shape::CHAT_ROOMS))
    }

    /// Retrieve chat room participants
    pub fn get_room_users(&self, roomname: &str, service: &str) -> Result<Value> {
        self.client.get(
            &join(&self.endpoint, &[roomname, "participants"]),
            &service_param(service),
        )
    }

    /// Current occupants of a room, from either the participant listing or
    /// the older occupant listing
    pub fn list_room_occupants(&self, roomname: &str, service: &str) -> Result<Vec<Value>> {
        let envelope = self.get_room_users(roomname, service)?;
        let participants = normalize(&envelope, Shape::PARTICIPANTS);
        if !participants.is_empty() {
            return Ok(participants);
        }
        Ok(normalize(&envelope, Shape::OCCUPANTS))
    }

    pub fn add_room(&self, room: &RoomConfig) -> Result<()> {
        self.client.send(
            Method::POST,
            &self.endpoint,
            &service_param(&room.service),
            Some(&room.to_payload()),
        )
    }

    pub fn update_room(&self, room: &RoomConfig) -> Result<()> {
        self.client.send(
            Method::PUT,
            &join(&self.endpoint, &[room.room_name.as_str()]),
            &service_param(&room.service),
            Some(&room.to_payload()),
        )
    }

    pub fn delete_room(&self, roomname: &str, service: &str) -> Result<()> {
        self.client.send(
            Method::DELETE,
            &join(&self.endpoint, &[roomname]),
            &service_param(service),
            None,
        )
    }

    /// Grant an affiliation to a local username or JID
    pub fn grant_user_role(
        &self,
        roomname: &str,
        username: &str,
        role: Role,
        service: &str,
    ) -> Result<()> {
        self.client.send(
            Method::POST,
            &join(&self.endpoint, &[roomname, role.as_path(), username]),
            &service_param(service),
            None,
        )
    }

    pub fn revoke_user_role(
        &self,
        roomname: &str,
        username: &str,
        role: Role,
        service: &str,
    ) -> Result<()> {
        self.client.send(
            Method::DELETE,
            &join(&self.endpoint, &[roomname, role.as_path(), username]),
            &service_param(service),
            None,
        )
    }
}

fn service_param(service: &str) -> [(&'static str, String); 1] {
    [("servicename", service.to_string())]
}
