use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{CatalogEntry, CatalogError, CatalogLookup};

#[derive(Serialize)]
struct LookupRequest<'a> {
    ids: &'a [i64],
}

/// 远程菜单服务客户端
///
/// `POST {base_url}/menu/items/lookup` with `{"ids": [...]}`, answering a
/// JSON array of [`CatalogEntry`]. Timeouts and 5xx surface as
/// [`CatalogError::Unavailable`] so order creation fails instead of pricing
/// from stale data.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn lookup_url(&self) -> String {
        format!("{}/menu/items/lookup", self.base_url)
    }
}

#[async_trait]
impl CatalogLookup for HttpCatalog {
    async fn lookup(&self, ids: &[i64]) -> Result<HashMap<i64, CatalogEntry>, CatalogError> {
        let response = self
            .client
            .post(self.lookup_url())
            .json(&LookupRequest { ids })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Menu catalog request failed");
                CatalogError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Menu catalog returned an error status");
            return Err(CatalogError::Unavailable(format!("catalog responded {status}")));
        }

        let entries: Vec<CatalogEntry> = response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;

        let mut found = HashMap::with_capacity(ids.len());
        for entry in entries.into_iter().filter(|entry| ids.contains(&entry.id)) {
            entry.check_price().inspect_err(|e| {
                tracing::warn!(error = %e, "Menu catalog returned an invalid entry");
            })?;
            found.insert(entry.id, entry);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_url_trims_slash() {
        let catalog = HttpCatalog::new("http://menu.local:9000/", 1000).unwrap();
        assert_eq!(catalog.lookup_url(), "http://menu.local:9000/menu/items/lookup");
    }

    /// Serve a fixed lookup answer on an ephemeral port
    async fn serve_lookup(body: serde_json::Value) -> String {
        let app = axum::Router::new().route(
            "/menu/items/lookup",
            axum::routing::post(move || {
                let body = body.clone();
                async move { axum::Json(body) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_lookup_keeps_requested_ids() {
        let url = serve_lookup(serde_json::json!([
            { "id": 1, "name": "Nasi Goreng", "price": "10.00" },
            { "id": 7, "name": "Extra", "price": "1.00" }
        ]))
        .await;
        let catalog = HttpCatalog::new(url, 1000).unwrap();
        let found = catalog.lookup(&[1, 2]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&1].price, rust_decimal::Decimal::new(1000, 2));
        assert!(found[&1].available);
    }

    #[tokio::test]
    async fn test_negative_price_is_malformed() {
        let url = serve_lookup(serde_json::json!([
            { "id": 1, "name": "Nasi Goreng", "price": "-10.00" }
        ]))
        .await;
        let catalog = HttpCatalog::new(url, 1000).unwrap();
        let err = catalog.lookup(&[1]).await.unwrap_err();
        assert!(matches!(err, CatalogError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let catalog = HttpCatalog::new("http://127.0.0.1:9", 200).unwrap();
        let err = catalog.lookup(&[1]).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }
}
