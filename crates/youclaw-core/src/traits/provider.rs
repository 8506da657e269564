// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for the language-model completion service.

use async_trait::async_trait;

use crate::error::YouclawError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for a black-box completion API.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    ///
    /// Transport failures map to [`YouclawError::InferenceUnavailable`].
    async fn complete(&self, request: ProviderRequest)
    -> Result<ProviderResponse, YouclawError>;

    /// Models the service can answer with. Providers that cannot enumerate
    /// them return an empty list.
    async fn list_models(&self) -> Result<Vec<String>, YouclawError> {
        Ok(Vec::new())
    }
}
