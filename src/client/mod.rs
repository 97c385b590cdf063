// This file is part of the terraform-provider-stackrox project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tf_provider::Diagnostics;
use tokio::sync::RwLock;

pub mod http;
pub mod models;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpClient;
use models::{
    AuthProvider, Cluster, Group, GroupBatchUpdate, ImageIntegration, Notifier, Policy,
};

/// Username used for every request; only the password is configurable.
pub const ADMIN_USERNAME: &str = "admin";

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    Endpoint { endpoint: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
}

impl Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Typed access to the StackRox REST API.
///
/// Every non-success status is returned as [`ApiError::Status`]; deciding
/// which statuses are benign is left to the caller.
#[async_trait]
pub trait StackroxApi: Debug + Send + Sync + 'static {
    /// Build a client for the given credentials
    fn connect(config: ClientConfig) -> Result<Self>
    where
        Self: Sized;

    async fn update_sensor_upgrade_config(&self, enable_auto_upgrade: bool) -> Result<()>;

    async fn get_image_integration(&self, id: &str) -> Result<ImageIntegration>;
    /// List image integrations, optionally restricted to an exact name
    async fn list_image_integrations(&self, name: Option<&str>) -> Result<Vec<ImageIntegration>>;
    async fn post_image_integration(
        &self,
        integration: &ImageIntegration,
    ) -> Result<ImageIntegration>;
    async fn delete_image_integration(&self, id: &str) -> Result<()>;

    async fn get_cluster(&self, id: &str) -> Result<Cluster>;
    /// Create or replace the cluster with the given id
    async fn put_cluster(&self, id: &str, cluster: &Cluster) -> Result<Cluster>;
    async fn delete_cluster(&self, id: &str) -> Result<()>;

    async fn get_auth_provider(&self, id: &str) -> Result<AuthProvider>;
    async fn post_auth_provider(&self, provider: &AuthProvider) -> Result<AuthProvider>;
    async fn put_auth_provider(&self, id: &str, provider: &AuthProvider) -> Result<AuthProvider>;
    async fn delete_auth_provider(&self, id: &str) -> Result<()>;

    /// Groups whose properties reference the given auth provider
    async fn find_groups(&self, auth_provider_id: &str) -> Result<Vec<Group>>;
    async fn batch_update_groups(&self, update: &GroupBatchUpdate) -> Result<()>;

    async fn get_policy(&self, id: &str) -> Result<Policy>;
    async fn post_policy(&self, policy: &Policy) -> Result<Policy>;
    async fn put_policy(&self, id: &str, policy: &Policy) -> Result<()>;
    async fn delete_policy(&self, id: &str) -> Result<()>;

    async fn get_notifier(&self, id: &str) -> Result<Notifier>;
    async fn post_notifier(&self, notifier: &Notifier) -> Result<Notifier>;
    async fn put_notifier(&self, id: &str, notifier: &Notifier) -> Result<()>;
    /// Delete a notifier, detaching it from policies that still reference it
    async fn delete_notifier(&self, id: &str) -> Result<()>;
}

/// Shared slot holding the client built by the provider `configure` call.
///
/// Resources are registered before the provider is configured, so they
/// receive the slot and resolve the client on each call.
#[derive(Debug)]
pub struct ApiHandle<A> {
    inner: Arc<RwLock<Option<Arc<A>>>>,
}

impl<A> Clone for ApiHandle<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A> Default for ApiHandle<A> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }
}

impl<A: StackroxApi> ApiHandle<A> {
    #[cfg(test)]
    pub fn configured(api: A) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Arc::new(api)))),
        }
    }

    pub async fn set(&self, api: A) {
        *self.inner.write().await = Some(Arc::new(api));
    }

    /// Get the configured client, or report that the provider is not configured
    pub async fn get(&self, diags: &mut Diagnostics) -> Option<Arc<A>> {
        let api = self.inner.read().await.clone();
        if api.is_none() {
            diags.root_error(
                "Provider is not configured",
                "The StackRox client is only available once the provider block has been configured.",
            );
        }
        api
    }
}
