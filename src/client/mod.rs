//! REST client for the relationship-management backend
//!
//! Only the three endpoints the assistant needs: contact search, recent
//! contacts, and the AI command interpreter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::{normalize_base_url, ApiConfig};
use crate::dispatch::{CommandDispatcher, CommandRequest, CommandResponse};
use crate::error::ApiError;
use crate::search::{Candidate, EntitySearchProvider};

/// The subset of a contact record the assistant cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    pub id: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_addresses: Vec<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub organizations: Vec<OrganizationDto>,
}

/// One employer entry on a contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrganizationDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ContactDto {
    /// Display name, or "given family" when the backend left it blank
    pub fn label(&self) -> String {
        if !self.display_name.trim().is_empty() {
            return self.display_name.clone();
        }
        match &self.family_name {
            Some(family) if !family.is_empty() => format!("{} {}", self.given_name, family),
            _ => self.given_name.clone(),
        }
    }

    /// Title at the first listed organization
    pub fn job_title(&self) -> Option<String> {
        self.organizations
            .first()
            .and_then(|org| org.title.clone())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            id: self.id.clone(),
            label: self.label(),
            secondary_label: self
                .email_addresses
                .first()
                .cloned()
                .or_else(|| self.job_title()),
            avatar_ref: self.photo_url.clone(),
        }
    }
}

/// Command responses arrive either bare or wrapped in `{ "data": ... }`.
/// A bare response carries `success` at the top level; its own `data` field
/// is an arbitrary payload and must not be mistaken for the envelope.
fn unwrap_command(value: serde_json::Value) -> Result<CommandResponse, serde_json::Error> {
    match value {
        serde_json::Value::Object(mut map) if !map.contains_key("success") => {
            match map.remove("data") {
                Some(inner @ serde_json::Value::Object(_)) => serde_json::from_value(inner),
                Some(other) => {
                    map.insert("data".to_string(), other);
                    serde_json::from_value(serde_json::Value::Object(map))
                }
                None => serde_json::from_value(serde_json::Value::Object(map)),
            }
        }
        other => serde_json::from_value(other),
    }
}

/// Contact lists: a bare array, `{data: [...]}`, or `{data: {data: [...]}}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContactList {
    Items(Vec<ContactDto>),
    Page { data: Vec<ContactDto> },
    Nested { data: Box<ContactList> },
}

impl ContactList {
    fn into_contacts(self) -> Vec<ContactDto> {
        match self {
            ContactList::Items(items) | ContactList::Page { data: items } => items,
            ContactList::Nested { data } => data.into_contacts(),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: normalize_base_url(&config.base_url),
            token: config.token.clone().filter(|t| !t.is_empty()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// `GET /api/v1/contacts/search?q=`
    pub async fn search_contacts(&self, query: &str) -> Result<Vec<ContactDto>, ApiError> {
        let request = self
            .client
            .get(self.url("/api/v1/contacts/search"))
            .query(&[("q", query)]);
        let response = self.authorize(request).send().await?;
        let list: ContactList = Self::read_json(response).await?;
        Ok(list.into_contacts())
    }

    /// `GET /api/v1/contacts?page=1&limit=` (most recent first, server-side)
    pub async fn recent_contacts(&self, limit: usize) -> Result<Vec<ContactDto>, ApiError> {
        let request = self
            .client
            .get(self.url("/api/v1/contacts"))
            .query(&[("page", "1".to_string()), ("limit", limit.to_string())]);
        let response = self.authorize(request).send().await?;
        let list: ContactList = Self::read_json(response).await?;
        Ok(list.into_contacts())
    }

    /// `POST /api/v1/ai/command`
    pub async fn send_command(&self, request: &CommandRequest) -> Result<CommandResponse, ApiError> {
        let http = self
            .client
            .post(self.url("/api/v1/ai/command"))
            .json(request);
        let response = self.authorize(http).send().await?;
        let value: serde_json::Value = Self::read_json(response).await?;
        Ok(unwrap_command(value)?)
    }
}

#[async_trait]
impl EntitySearchProvider for ApiClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        let contacts = if query.is_empty() {
            self.recent_contacts(limit)
                .await
                .context("Failed to list recent contacts")?
        } else {
            self.search_contacts(query)
                .await
                .with_context(|| format!("Failed to search contacts for {:?}", query))?
        };

        Ok(contacts
            .iter()
            .take(limit)
            .map(ContactDto::to_candidate)
            .collect())
    }
}

#[async_trait]
impl CommandDispatcher for ApiClient {
    async fn dispatch(&self, request: &CommandRequest) -> Result<CommandResponse> {
        tracing::info!(
            "Dispatching command ({} chars, {} mentions)",
            request.message.len(),
            request.mentioned_contact_ids.len()
        );
        self.send_command(request)
            .await
            .context("Failed to send command")
    }
}
