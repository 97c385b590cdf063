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

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::models::{
    AuthProvider, Cluster, ClusterResponse, Group, GroupBatchUpdate, GroupList, ImageIntegration,
    ImageIntegrationList, Notifier, Policy, SensorUpgradeConfig, SensorUpgradeConfigRequest,
};
use super::{ApiError, ClientConfig, Result, StackroxApi};

/// StackRox client over HTTPS with basic authentication.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    endpoint: Url,
    username: String,
    password: String,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Endpoint {
                endpoint: self.endpoint.to_string(),
                reason: "cannot be a base URL".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        debug!(%method, %url, "stackrox request");
        Ok(self
            .client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, "stackrox response");
        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::Status { status, body })
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.send_json(self.request(Method::GET, segments)?).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        self.send_json(self.request(Method::POST, segments)?.json(body))
            .await
    }

    async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        self.send_json(self.request(Method::PUT, segments)?.json(body))
            .await
    }

    async fn delete(&self, segments: &[&str]) -> Result<()> {
        self.send(self.request(Method::DELETE, segments)?).await?;
        Ok(())
    }
}

/// Response of the endpoints returning `google.protobuf.Empty`
#[derive(serde::Deserialize)]
struct Empty {}

#[async_trait]
impl StackroxApi for HttpClient {
    fn connect(config: ClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|err| ApiError::Endpoint {
            endpoint: config.endpoint.clone(),
            reason: err.to_string(),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(ApiError::Endpoint {
                endpoint: config.endpoint,
                reason: "cannot be a base URL".to_owned(),
            });
        }

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            endpoint,
            username: config.username,
            password: config.password,
        })
    }

    async fn update_sensor_upgrade_config(&self, enable_auto_upgrade: bool) -> Result<()> {
        let request = SensorUpgradeConfigRequest {
            config: SensorUpgradeConfig {
                enable_auto_upgrade,
            },
        };
        let Empty {} = self
            .post(&["v1", "sensorupgrades", "config"], &request)
            .await?;
        Ok(())
    }

    async fn get_image_integration(&self, id: &str) -> Result<ImageIntegration> {
        self.get(&["v1", "imageintegrations", id]).await
    }

    async fn list_image_integrations(&self, name: Option<&str>) -> Result<Vec<ImageIntegration>> {
        let mut request = self.request(Method::GET, &["v1", "imageintegrations"])?;
        if let Some(name) = name {
            request = request.query(&[("name", name)]);
        }
        let list: ImageIntegrationList = self.send_json(request).await?;
        Ok(list.integrations)
    }

    async fn post_image_integration(
        &self,
        integration: &ImageIntegration,
    ) -> Result<ImageIntegration> {
        self.post(&["v1", "imageintegrations"], integration).await
    }

    async fn delete_image_integration(&self, id: &str) -> Result<()> {
        self.delete(&["v1", "imageintegrations", id]).await
    }

    async fn get_cluster(&self, id: &str) -> Result<Cluster> {
        let response: ClusterResponse = self.get(&["v1", "clusters", id]).await?;
        Ok(response.cluster)
    }

    async fn put_cluster(&self, id: &str, cluster: &Cluster) -> Result<Cluster> {
        let response: ClusterResponse = self.put(&["v1", "clusters", id], cluster).await?;
        Ok(response.cluster)
    }

    async fn delete_cluster(&self, id: &str) -> Result<()> {
        self.delete(&["v1", "clusters", id]).await
    }

    async fn get_auth_provider(&self, id: &str) -> Result<AuthProvider> {
        self.get(&["v1", "authProviders", id]).await
    }

    async fn post_auth_provider(&self, provider: &AuthProvider) -> Result<AuthProvider> {
        self.post(&["v1", "authProviders"], provider).await
    }

    async fn put_auth_provider(&self, id: &str, provider: &AuthProvider) -> Result<AuthProvider> {
        self.put(&["v1", "authProviders", id], provider).await
    }

    async fn delete_auth_provider(&self, id: &str) -> Result<()> {
        self.delete(&["v1", "authProviders", id]).await
    }

    async fn find_groups(&self, auth_provider_id: &str) -> Result<Vec<Group>> {
        let list: GroupList = self.get(&["v1", "groups"]).await?;
        Ok(list
            .groups
            .into_iter()
            .filter(|group| group.props.auth_provider_id == auth_provider_id)
            .collect())
    }

    async fn batch_update_groups(&self, update: &GroupBatchUpdate) -> Result<()> {
        let Empty {} = self.post(&["v1", "groupsbatch"], update).await?;
        Ok(())
    }

    async fn get_policy(&self, id: &str) -> Result<Policy> {
        self.get(&["v1", "policies", id]).await
    }

    async fn post_policy(&self, policy: &Policy) -> Result<Policy> {
        self.post(&["v1", "policies"], policy).await
    }

    async fn put_policy(&self, id: &str, policy: &Policy) -> Result<()> {
        let Empty {} = self.put(&["v1", "policies", id], policy).await?;
        Ok(())
    }

    async fn delete_policy(&self, id: &str) -> Result<()> {
        self.delete(&["v1", "policies", id]).await
    }

    async fn get_notifier(&self, id: &str) -> Result<Notifier> {
        self.get(&["v1", "notifiers", id]).await
    }

    async fn post_notifier(&self, notifier: &Notifier) -> Result<Notifier> {
        self.post(&["v1", "notifiers"], notifier).await
    }

    async fn put_notifier(&self, id: &str, notifier: &Notifier) -> Result<()> {
        let Empty {} = self.put(&["v1", "notifiers", id], notifier).await?;
        Ok(())
    }

    async fn delete_notifier(&self, id: &str) -> Result<()> {
        let request = self
            .request(Method::DELETE, &["v1", "notifiers", id])?
            .query(&[("force", "true")]);
        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_client(endpoint: &str) -> Result<HttpClient> {
        HttpClient::connect(ClientConfig {
            endpoint: endpoint.to_owned(),
            username: "admin".to_owned(),
            password: "secret".to_owned(),
        })
    }

    #[test]
    fn urls_are_built_from_segments() {
        let client = new_client("https://central.example.com/").unwrap();
        let url = client.url(&["v1", "clusters", "abc"]).unwrap();
        assert_eq!(url.as_str(), "https://central.example.com/v1/clusters/abc");

        let client = new_client("https://central.example.com/prefix").unwrap();
        let url = client.url(&["v1", "policies", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "https://central.example.com/prefix/v1/policies/a%2Fb");
    }

    #[test]
    fn invalid_endpoints_are_rejected() {
        assert!(matches!(
            new_client("central.example.com"),
            Err(ApiError::Endpoint { .. })
        ));
        assert!(matches!(
            new_client("mailto:admin@example.com"),
            Err(ApiError::Endpoint { .. })
        ));
    }

    #[test]
    fn debug_output_hides_the_password() {
        let client = new_client("https://central.example.com").unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("central.example.com"));
        assert!(!debug.contains("secret"));
    }
}
