use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{HistoryRecord, Tester};

const FALLBACK_MESSAGE: &str = "The data store returned an unexpected error";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
}

/// Client for the hosted record store (Supabase's PostgREST API). Every
/// request authenticates with the service key; writes ask for
/// `return=minimal` since the callers only care about success.
pub struct Store {
    client: Client,
    base_url: String,
    api_key: String,
}

impl Store {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
    }

    /// All registered testers, newest first.
    pub async fn list_testers(&self) -> Result<Vec<Tester>, StoreError> {
        let response = self
            .request(Method::GET, "tester?select=*&order=created_at.desc")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Insert a new tester. The table has a unique index on email, so a
    /// duplicate registration surfaces as a 409 from the store.
    pub async fn insert_tester(
        &self,
        name: &str,
        email: &str,
        type_code: u8,
    ) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, "tester")
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "name": name, "email": email, "type": type_code }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    /// Flip the invite flag for the given testers.
    pub async fn mark_invited(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        let response = self
            .request(Method::PATCH, &format!("tester?{}", id_filter(ids)))
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "invite": true }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    /// Delete the given testers.
    pub async fn delete_testers(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, &format!("tester?{}", id_filter(ids)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    /// Append invite history rows.
    pub async fn append_history(&self, records: &[HistoryRecord]) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, "history")
            .header("Prefer", "return=minimal")
            .json(records)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    /// The shared admin password, kept as the single row of the admin table.
    pub async fn admin_password(&self) -> Result<String, StoreError> {
        #[derive(Deserialize)]
        struct AdminRow {
            password: String,
        }

        let response = self
            .request(Method::GET, "admin?id=eq.1&select=password")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let mut rows: Vec<AdminRow> = response.json().await?;
        match rows.pop() {
            Some(row) => Ok(row.password),
            None => Err(StoreError::Api {
                status: 404,
                message: "Admin record not found".to_string(),
            }),
        }
    }
}

/// PostgREST filter selecting a set of rows by id: `id=in.(a,b,c)`.
fn id_filter(ids: &[Uuid]) -> String {
    let joined = ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("id=in.({joined})")
}

/// Pull the `message` field out of a PostgREST error body, if there is one.
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
}

async fn api_error(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::Api {
        status,
        message: error_message(&body).unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_filter_joins_ids() {
        let ids = [
            Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap(),
            Uuid::parse_str("aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee").unwrap(),
        ];
        assert_eq!(
            id_filter(&ids),
            "id=in.(11111111-2222-3333-4444-555555555555,aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee)"
        );
    }

    #[test]
    fn error_message_reads_postgrest_body() {
        assert_eq!(
            error_message(r#"{"message":"duplicate key value"}"#).as_deref(),
            Some("duplicate key value")
        );
        assert_eq!(error_message(r#"{"hint":null}"#), None);
        assert_eq!(error_message("not json"), None);
        assert_eq!(error_message(""), None);
    }
}
