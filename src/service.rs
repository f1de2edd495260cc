//! Client for the recipe-computation service

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::TransportError;
use crate::models::{BuildPath, ItemRef, ItemSummary, RecipeTree, ShoppingList};

/// Body of `POST recipe_tree`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeTreeRequest {
    pub items: Vec<ItemRef>,
    pub selected_build_paths: BuildPath,
}

/// Body of `POST shopping_list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListRequest {
    pub recipe_path: BuildPath,
    pub have_already: IndexMap<String, u32>,
}

/// The three calls the planner makes, per game-data version
#[async_trait]
pub trait RecipeService: Send + Sync {
    async fn items(&self, version: &str) -> Result<Vec<ItemSummary>, TransportError>;

    async fn recipe_tree(&self, version: &str, request: &RecipeTreeRequest) -> Result<RecipeTree, TransportError>;

    async fn shopping_list(
        &self,
        version: &str,
        request: &ShoppingListRequest,
    ) -> Result<ShoppingList, TransportError>;
}

/// JSON-over-HTTP implementation talking to `{base_url}/api/{version}/...`
#[derive(Debug, Clone)]
pub struct HttpRecipeService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecipeService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Self::new(&config.api_url, config.request_timeout)
    }

    fn endpoint(&self, version: &str, path: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, version, path)
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T, TransportError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn post<B, T>(&self, url: String, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        Self::decode(&url, response).await
    }
}

#[async_trait]
impl RecipeService for HttpRecipeService {
    async fn items(&self, version: &str) -> Result<Vec<ItemSummary>, TransportError> {
        let url = self.endpoint(version, "items");
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        Self::decode(&url, response).await
    }

    async fn recipe_tree(&self, version: &str, request: &RecipeTreeRequest) -> Result<RecipeTree, TransportError> {
        self.post(self.endpoint(version, "recipe_tree"), request).await
    }

    async fn shopping_list(
        &self,
        version: &str,
        request: &ShoppingListRequest,
    ) -> Result<ShoppingList, TransportError> {
        self.post(self.endpoint(version, "shopping_list"), request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PathNode;

    #[test]
    fn endpoints_are_versioned_and_tolerate_trailing_slash() {
        let service = HttpRecipeService::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();

        assert_eq!(
            service.endpoint("1.16", "recipe_tree"),
            "http://localhost:5000/api/1.16/recipe_tree"
        );
    }

    #[test]
    fn request_bodies_use_service_field_names() {
        let mut path = BuildPath::new();
        path.insert(
            "oak_log".to_string(),
            PathNode {
                name: Some("oak_log".into()),
                selected: true,
                amount_required: 4,
                ..PathNode::default()
            },
        );

        let tree_body = serde_json::to_value(RecipeTreeRequest {
            items: vec![ItemRef::item("oak_log", 4)],
            selected_build_paths: path.clone(),
        })
        .unwrap();
        assert_eq!(tree_body["items"][0]["name"], "oak_log");
        assert_eq!(tree_body["selected_build_paths"]["oak_log"]["amount_required"], 4);

        let mut have = IndexMap::new();
        have.insert("oak_log".to_string(), 2);
        let list_body = serde_json::to_value(ShoppingListRequest {
            recipe_path: path,
            have_already: have,
        })
        .unwrap();
        assert_eq!(list_body["recipe_path"]["oak_log"]["selected"], true);
        assert_eq!(list_body["have_already"]["oak_log"], 2);
    }
}
