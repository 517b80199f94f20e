//! Command dispatch
//!
//! The assistant box only builds and sends the payload; interpreting it is
//! the backend's job. This module owns the wire shapes and turns every
//! possible answer, including garbage, into a [`DispatchOutcome`].

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::mention::ComposedCommand;

/// Payload posted to the command interpreter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub mentioned_contact_ids: Vec<String>,
}

impl CommandRequest {
    pub fn from_command(command: &ComposedCommand, conversation_id: Option<String>) -> Self {
        Self {
            message: command.text().to_string(),
            conversation_id,
            mentioned_contact_ids: command.referenced_entity_ids().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// What the transcript shows for one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Reply {
        text: String,
        /// Named side effects the interpreter performed
        side_effects: Vec<String>,
        conversation_id: Option<String>,
    },
    Failure {
        kind: String,
        detail: String,
    },
}

impl DispatchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DispatchOutcome::Failure { .. })
    }

    /// Normalize a transport result into something renderable
    pub fn from_result(result: Result<CommandResponse>) -> Self {
        match result {
            Ok(response) => Self::from_response(response),
            Err(e) => DispatchOutcome::Failure {
                kind: e
                    .downcast_ref::<ApiError>()
                    .map_or("transport", ApiError::kind)
                    .to_string(),
                detail: format!(
                    "Sorry, I couldn't process your request. Please try again. ({:#})",
                    e
                ),
            },
        }
    }

    pub fn from_response(response: CommandResponse) -> Self {
        if response.success {
            return DispatchOutcome::Reply {
                text: response.message,
                side_effects: response.tools_used.unwrap_or_default(),
                conversation_id: response.conversation_id,
            };
        }

        let (kind, details) = match response.error {
            Some(CommandError { code, details }) if !code.is_empty() => (code, details),
            Some(CommandError { details, .. }) => ("unknown".to_string(), details),
            None => ("unknown".to_string(), None),
        };
        let details = details
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "Unknown error".to_string());

        DispatchOutcome::Failure {
            kind,
            detail: format!("Sorry, I encountered an error: {}", details),
        }
    }
}

/// Something that accepts composed commands
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, request: &CommandRequest) -> Result<CommandResponse>;
}

/// Send `request` and normalize whatever comes back
pub async fn send_command(dispatcher: &dyn CommandDispatcher, request: &CommandRequest) -> DispatchOutcome {
    let outcome = DispatchOutcome::from_result(dispatcher.dispatch(request).await);
    if let DispatchOutcome::Failure { kind, detail } = &outcome {
        tracing::warn!("Command dispatch failed ({}): {}", kind, detail);
    }
    outcome
}

/// Echoes the request back; stands in for the backend in demo mode
#[derive(Debug, Clone, Default)]
pub struct EchoDispatcher;

#[async_trait]
impl CommandDispatcher for EchoDispatcher {
    async fn dispatch(&self, request: &CommandRequest) -> Result<CommandResponse> {
        let message = if request.mentioned_contact_ids.is_empty() {
            format!("Got it: \"{}\"", request.message)
        } else {
            format!(
                "Got it: \"{}\" (contacts: {})",
                request.message,
                request.mentioned_contact_ids.join(", ")
            )
        };

        Ok(CommandResponse {
            success: true,
            message,
            tools_used: Some(vec!["echo".to_string()]),
            conversation_id: Some(
                request
                    .conversation_id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            ),
            ..Default::default()
        })
    }
}
