use crate::stores::table_store::{Filter, Row, StoreError, StoreResult, TableStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "return=representation,resolution=merge-duplicates";

/// Table store backed by the hosted PostgREST endpoint (`{url}/rest/v1/{table}`)
pub struct RestTableStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

/// Error body returned by the REST endpoint on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct RestErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl RestTableStore {
    pub fn new(endpoint: String, api_key: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.endpoint, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Vec<Row>> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        rows_from_response(response).await
    }
}

fn filter_query(filter: &Filter) -> [(String, String); 1] {
    [(filter.column.clone(), format!("eq.{}", filter.value))]
}

async fn rows_from_response(response: Response) -> StoreResult<Vec<Row>> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(StoreError::Remote {
            status: status.as_u16(),
            message: remote_message(status.as_u16(), &body),
        });
    }

    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str::<Vec<Row>>(&body).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Pick the most useful message out of an error body
fn remote_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<RestErrorBody>(body) {
        Ok(RestErrorBody { message: Some(message), .. }) => message,
        Ok(RestErrorBody { details: Some(details), .. }) => details,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => format!("Table store returned error status: {}", status),
    }
}

#[async_trait]
impl TableStore for RestTableStore {
    async fn insert(&self, table: &str, row: Row) -> StoreResult<Vec<Row>> {
        debug!(table, "insert");
        let request = self
            .request(Method::POST, table)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[row]);
        self.send(request).await
    }

    async fn upsert(&self, table: &str, row: Row, on_conflict: &str) -> StoreResult<Vec<Row>> {
        debug!(table, on_conflict, "upsert");
        let request = self
            .request(Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", MERGE_DUPLICATES)
            .json(&[row]);
        self.send(request).await
    }

    async fn select(&self, table: &str, filter: Option<&Filter>) -> StoreResult<Vec<Row>> {
        debug!(table, filter = ?filter, "select");
        let mut request = self
            .request(Method::GET, table)
            .query(&[("select", "*")]);
        if let Some(filter) = filter {
            request = request.query(&filter_query(filter));
        }
        self.send(request).await
    }

    async fn update_fields(
        &self,
        table: &str,
        filter: &Filter,
        fields: Row,
    ) -> StoreResult<Vec<Row>> {
        debug!(table, filter = %filter, "update");
        let request = self
            .request(Method::PATCH, table)
            .query(&filter_query(filter))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&fields);
        self.send(request).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Row>> {
        debug!(table, filter = %filter, "delete");
        let request = self
            .request(Method::DELETE, table)
            .query(&filter_query(filter))
            .header("Prefer", RETURN_REPRESENTATION);
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{header, HeaderMap, StatusCode, Uri};
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    /// What the fake endpoint saw for one request
    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        path: String,
        query: String,
        headers: HeaderMap,
        body: String,
    }

    struct FakeEndpoint {
        status: StatusCode,
        reply: String,
        seen: Mutex<Vec<Seen>>,
    }

    impl FakeEndpoint {
        fn last(&self) -> Seen {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    async fn record(
        State(endpoint): State<Arc<FakeEndpoint>>,
        method: axum::http::Method,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
        endpoint.seen.lock().unwrap().push(Seen {
            method: method.to_string(),
            path: uri.path().to_string(),
            query: uri.query().unwrap_or_default().to_string(),
            headers,
            body,
        });
        (
            endpoint.status,
            [(header::CONTENT_TYPE, "application/json")],
            endpoint.reply.clone(),
        )
    }

    /// Serve a canned reply on a local port and record every request
    async fn fake_endpoint(status: StatusCode, reply: &str) -> (RestTableStore, Arc<FakeEndpoint>) {
        let endpoint = Arc::new(FakeEndpoint {
            status,
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(record).with_state(endpoint.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let store = RestTableStore::new(
            format!("http://{}/", addr),
            "anon-key".to_string(),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        (store, endpoint)
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn assert_auth_headers(seen: &Seen) {
        assert_eq!(seen.headers["apikey"], "anon-key");
        assert_eq!(seen.headers[header::AUTHORIZATION], "Bearer anon-key");
    }

    #[test]
    fn test_rest_store_creation() {
        let store = RestTableStore::new(
            "https://project.supabase.co/".to_string(),
            "anon-key".to_string(),
            None,
        );
        assert!(store.is_ok());
        assert_eq!(
            store.unwrap().table_url("u1"),
            "https://project.supabase.co/rest/v1/u1"
        );
    }

    #[test]
    fn test_filter_query_uses_eq_operator() {
        let query = filter_query(&Filter::eq("phone", "9876543210"));
        assert_eq!(query[0], ("phone".to_string(), "eq.9876543210".to_string()));
    }

    #[test]
    fn test_remote_message_prefers_message_field() {
        let body = r#"{"code":"23505","details":"Key exists.","hint":null,"message":"duplicate key value"}"#;
        assert_eq!(remote_message(409, body), "duplicate key value");
    }

    #[test]
    fn test_remote_message_falls_back_to_details_and_raw_body() {
        assert_eq!(remote_message(400, r#"{"details":"bad column"}"#), "bad column");
        assert_eq!(remote_message(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(
            remote_message(500, ""),
            "Table store returned error status: 500"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let store = RestTableStore::new(
            "http://127.0.0.1:1".to_string(),
            "anon-key".to_string(),
            Some(Duration::from_secs(2)),
        )
        .unwrap();

        let result = store.select("users", None).await;
        assert!(matches!(result, Err(StoreError::Transport(_))));
    }

    #[tokio::test]
    async fn test_empty_endpoint_is_transport_error() {
        let store = RestTableStore::new(String::new(), String::new(), None).unwrap();

        let result = store.select("users", None).await;
        assert!(matches!(result, Err(StoreError::Transport(_))));
    }

    #[tokio::test]
    async fn test_upsert_sends_conflict_column_and_merge_preference() {
        let (store, endpoint) =
            fake_endpoint(StatusCode::CREATED, r#"[{"id":1,"phone_no":"9876543210","amount":300}]"#).await;

        let user = row(json!({"phone_no": "9876543210", "pass": [[1]], "amount": 300}));
        let rows = store.upsert("users", user.clone(), "phone_no").await.unwrap();
        assert_eq!(rows[0]["id"], json!(1));

        let seen = endpoint.last();
        assert_eq!(seen.method, "POST");
        assert_eq!(seen.path, "/rest/v1/users");
        assert_eq!(seen.query, "on_conflict=phone_no");
        assert_eq!(
            seen.headers["prefer"],
            "return=representation,resolution=merge-duplicates"
        );
        assert_auth_headers(&seen);

        let sent: Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(sent, json!([user]));
        assert!(seen.body.contains(r#""amount":300"#));
    }

    #[tokio::test]
    async fn test_insert_has_no_conflict_resolution() {
        let (store, endpoint) = fake_endpoint(StatusCode::CREATED, r#"[{"phone":"9876543210"}]"#).await;

        store
            .insert("u1", row(json!({"phone": "9876543210"})))
            .await
            .unwrap();

        let seen = endpoint.last();
        assert_eq!(seen.method, "POST");
        assert_eq!(seen.path, "/rest/v1/u1");
        assert_eq!(seen.query, "");
        assert_eq!(seen.headers["prefer"], "return=representation");
        assert_auth_headers(&seen);
    }

    #[tokio::test]
    async fn test_select_requests_all_columns_with_optional_filter() {
        let (store, endpoint) = fake_endpoint(StatusCode::OK, "[]").await;

        assert!(store.select("users", None).await.unwrap().is_empty());
        let seen = endpoint.last();
        assert_eq!(seen.method, "GET");
        assert_eq!(seen.path, "/rest/v1/users");
        assert_eq!(seen.query, "select=*");
        assert_auth_headers(&seen);

        store
            .select("u1", Some(&Filter::eq("phone", "9876543210")))
            .await
            .unwrap();
        assert_eq!(endpoint.last().query, "select=*&phone=eq.9876543210");
    }

    #[tokio::test]
    async fn test_update_and_delete_filter_by_equality() {
        let (store, endpoint) = fake_endpoint(StatusCode::OK, r#"[{"phone_no":"9876543210","paid":true}]"#).await;

        let rows = store
            .update_fields(
                "users",
                &Filter::eq("phone_no", "9876543210"),
                row(json!({"paid": true})),
            )
            .await
            .unwrap();
        assert_eq!(rows[0]["paid"], json!(true));

        let seen = endpoint.last();
        assert_eq!(seen.method, "PATCH");
        assert_eq!(seen.path, "/rest/v1/users");
        assert_eq!(seen.query, "phone_no=eq.9876543210");
        assert_eq!(seen.headers["prefer"], "return=representation");
        assert_eq!(serde_json::from_str::<Value>(&seen.body).unwrap(), json!({"paid": true}));

        store
            .delete("u1", &Filter::eq("phone", "9876543210"))
            .await
            .unwrap();

        let seen = endpoint.last();
        assert_eq!(seen.method, "DELETE");
        assert_eq!(seen.path, "/rest/v1/u1");
        assert_eq!(seen.query, "phone=eq.9876543210");
        assert_eq!(seen.headers["prefer"], "return=representation");
        assert_auth_headers(&seen);
    }

    #[tokio::test]
    async fn test_conflict_body_becomes_remote_error() {
        let (store, _) = fake_endpoint(
            StatusCode::CONFLICT,
            r#"{"code":"23505","details":"Key (phone)=(9876543210) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"u1_phone_key\""}"#,
        )
        .await;

        let result = store.insert("u1", row(json!({"phone": "9876543210"}))).await;
        match result {
            Err(StoreError::Remote { status, message }) => {
                assert_eq!(status, 409);
                assert_eq!(
                    message,
                    "duplicate key value violates unique constraint \"u1_phone_key\""
                );
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_with_unexpected_body_is_decode_error() {
        let (store, _) = fake_endpoint(StatusCode::OK, r#"{"not":"an array"}"#).await;

        let result = store.select("users", None).await;
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }
}
