//! CouchDB REST client implementing `DocumentDatabase`.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};
use url::Url;

use oidc_docdb::{
    BulkItemResult, DatabaseError, DesignDocument, DocumentDatabase, DocumentRevision,
    FindRequest, ViewQuery, ViewRef, ViewResult,
};

use crate::config::{HttpConfigError, HttpDatabaseConfig};
use crate::error::{from_response, map_transport};

/// Response of a single-document write.
#[derive(Debug, Deserialize)]
struct WriteResponse {
    id: String,
    rev: String,
}

/// Response of `_find`.
#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    docs: Vec<Value>,
}

/// Path segments of a document ID. Design documents keep their literal
/// `_design/` prefix; any other `/` is percent-encoded.
fn id_segments(id: &str) -> Vec<&str> {
    match id.strip_prefix("_design/") {
        Some(name) => vec!["_design", name],
        None => vec![id],
    }
}

/// Encodes a view key parameter as JSON.
fn json_param(value: &Value) -> String {
    value.to_string()
}

/// Query string for a view request. `keys` travel in the request body.
fn view_params(query: &ViewQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(key) = &query.key {
        params.push(("key", json_param(key)));
    }
    if let Some(start) = &query.start_key {
        params.push(("start_key", json_param(start)));
    }
    if let Some(end) = &query.end_key {
        params.push(("end_key", json_param(end)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(skip) = query.skip {
        params.push(("skip", skip.to_string()));
    }
    if query.descending {
        params.push(("descending", "true".to_string()));
    }
    if query.include_docs {
        params.push(("include_docs", "true".to_string()));
    }
    if let Some(reduce) = query.reduce {
        params.push(("reduce", reduce.to_string()));
    }
    params
}

/// A CouchDB database reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDatabase {
    http_client: reqwest::Client,
    database_url: Url,
    database: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpDatabase {
    /// Creates a client for `database` on the configured server.
    ///
    /// Does not contact the server; see [`HttpDatabase::connect`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &HttpDatabaseConfig, database: &str) -> Result<Self, HttpConfigError> {
        if database.is_empty() {
            return Err(HttpConfigError::InvalidValue(
                "database name cannot be empty".to_string(),
            ));
        }

        let mut database_url = config.validate()?;
        database_url
            .path_segments_mut()
            .map_err(|()| HttpConfigError::InvalidValue(format!("url '{}' cannot be a base", config.url)))?
            .pop_if_empty()
            .push(database)
            .push("");

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HttpConfigError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            database_url,
            database: database.to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Creates a client and, when configured, creates the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the database
    /// cannot be created.
    pub async fn connect(
        config: &HttpDatabaseConfig,
        database: &str,
    ) -> Result<Self, DatabaseError> {
        let db = Self::new(config, database)
            .map_err(|e| DatabaseError::connection(e.to_string()))?;
        if config.create_database {
            db.ensure_database().await?;
        }
        Ok(db)
    }

    /// Name of the database this client addresses.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Creates the database unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than "already exists".
    #[instrument(skip(self), fields(database = %self.database))]
    pub async fn ensure_database(&self) -> Result<(), DatabaseError> {
        let response = self
            .request(Method::PUT, self.database_url.clone())
            .send()
            .await
            .map_err(map_transport)?;

        match response.status() {
            StatusCode::CREATED | StatusCode::ACCEPTED => {
                info!("Created database");
                Ok(())
            }
            StatusCode::PRECONDITION_FAILED => {
                debug!("Database already exists");
                Ok(())
            }
            _ => Err(from_response(response, &self.database).await),
        }
    }

    /// URL of a path below the database.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.database_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn document_url(&self, id: &str) -> Url {
        self.url(&id_segments(id))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http_client
            .request(method, url)
            .header("Accept", "application/json");
        match &self.username {
            Some(username) => builder.basic_auth(username, self.password.as_deref()),
            None => builder,
        }
    }

    async fn write(&self, method: Method, url: Url, id: &str, body: &Value) -> Result<DocumentRevision, DatabaseError> {
        let response = self
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(map_transport)?;

        if !response.status().is_success() {
            return Err(from_response(response, id).await);
        }

        let written: WriteResponse = response.json().await.map_err(map_transport)?;
        Ok(DocumentRevision {
            id: written.id,
            rev: written.rev,
        })
    }
}

#[async_trait]
impl DocumentDatabase for HttpDatabase {
    async fn get(&self, id: &str) -> Result<Option<Value>, DatabaseError> {
        let response = self
            .request(Method::GET, self.document_url(id))
            .send()
            .await
            .map_err(map_transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                Ok(Some(response.json().await.map_err(map_transport)?))
            }
            _ => Err(from_response(response, id).await),
        }
    }

    async fn create(&self, document: &Value) -> Result<DocumentRevision, DatabaseError> {
        match document.get("_id").and_then(Value::as_str) {
            Some(id) => self.write(Method::PUT, self.document_url(id), id, document).await,
            None => {
                self.write(Method::POST, self.database_url.clone(), &self.database, document)
                    .await
            }
        }
    }

    async fn put(&self, id: &str, document: &Value) -> Result<DocumentRevision, DatabaseError> {
        self.write(Method::PUT, self.document_url(id), id, document).await
    }

    async fn delete(&self, id: &str, rev: &str) -> Result<DocumentRevision, DatabaseError> {
        let response = self
            .request(Method::DELETE, self.document_url(id))
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(map_transport)?;

        if !response.status().is_success() {
            return Err(from_response(response, id).await);
        }

        let written: WriteResponse = response.json().await.map_err(map_transport)?;
        Ok(DocumentRevision {
            id: written.id,
            rev: written.rev,
        })
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn bulk_docs(&self, documents: &[Value]) -> Result<Vec<BulkItemResult>, DatabaseError> {
        let response = self
            .request(Method::POST, self.url(&["_bulk_docs"]))
            .json(&json!({ "docs": documents }))
            .send()
            .await
            .map_err(map_transport)?;

        if !response.status().is_success() {
            return Err(from_response(response, "_bulk_docs").await);
        }

        response.json().await.map_err(map_transport)
    }

    #[instrument(skip(self, query), fields(view = %view))]
    async fn query_view(
        &self,
        view: &ViewRef,
        query: &ViewQuery,
    ) -> Result<ViewResult, DatabaseError> {
        let url = self.url(&["_design", &view.design, "_view", &view.view]);
        let params = view_params(query);

        let request = match &query.keys {
            Some(keys) => self
                .request(Method::POST, url)
                .query(&params)
                .json(&json!({ "keys": keys })),
            None => self.request(Method::GET, url).query(&params),
        };

        let response = request.send().await.map_err(map_transport)?;
        if !response.status().is_success() {
            return Err(from_response(response, &view.to_string()).await);
        }

        let result: ViewResult = response.json().await.map_err(map_transport)?;
        debug!(rows = result.rows.len(), "View queried");
        Ok(result)
    }

    #[instrument(skip(self, design), fields(design = design.name()))]
    async fn ensure_design_document(&self, design: &DesignDocument) -> Result<(), DatabaseError> {
        let id = design.id();
        let mut body = design.to_json();

        if let Some(existing) = self.get(&id).await? {
            if existing.get("views") == body.get("views") {
                debug!("Design document up to date");
                return Ok(());
            }
            if let (Some(rev), Some(obj)) = (existing.get("_rev").cloned(), body.as_object_mut()) {
                obj.insert("_rev".to_string(), rev);
            }
        }

        self.put(&id, &body).await?;
        info!("Installed design document");
        Ok(())
    }

    #[instrument(skip(self, request))]
    async fn find(&self, request: &FindRequest) -> Result<Vec<Value>, DatabaseError> {
        let mut body = Map::new();
        body.insert("selector".to_string(), request.selector.to_mango());
        if let Some(limit) = request.limit {
            body.insert("limit".to_string(), json!(limit));
        }
        if let Some(skip) = request.skip {
            body.insert("skip".to_string(), json!(skip));
        }

        let response = self
            .request(Method::POST, self.url(&["_find"]))
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(map_transport)?;

        if !response.status().is_success() {
            return Err(from_response(response, "_find").await);
        }

        let found: FindResponse = response.json().await.map_err(map_transport)?;
        debug!(docs = found.docs.len(), "Selector query served");
        Ok(found.docs)
    }

    fn backend_name(&self) -> &'static str {
        "couchdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let db = HttpDatabase::new(&HttpDatabaseConfig::new("http://couch:5984"), "openiddict")
            .unwrap();

        assert_eq!(db.database_url.as_str(), "http://couch:5984/openiddict/");
        assert_eq!(
            db.document_url("_design/openiddict").as_str(),
            "http://couch:5984/openiddict/_design/openiddict"
        );
        assert_eq!(
            db.document_url("a/b").as_str(),
            "http://couch:5984/openiddict/a%2Fb"
        );
        assert_eq!(
            db.url(&["_design", "openiddict", "_view", "token.subject"]).as_str(),
            "http://couch:5984/openiddict/_design/openiddict/_view/token.subject"
        );
    }

    #[test]
    fn test_view_params_are_json_encoded() {
        let query = ViewQuery::new()
            .with_key("alice")
            .with_start_key(json!(["2024-01-01", null]))
            .with_limit(10)
            .descending()
            .with_reduce(false);

        let params = view_params(&query);
        assert!(params.contains(&("key", "\"alice\"".to_string())));
        assert!(params.contains(&("start_key", "[\"2024-01-01\",null]".to_string())));
        assert!(params.contains(&("limit", "10".to_string())));
        assert!(params.contains(&("descending", "true".to_string())));
        assert!(params.contains(&("reduce", "false".to_string())));
        assert!(!params.iter().any(|(name, _)| *name == "include_docs"));
    }

    #[test]
    fn test_empty_database_name_rejected() {
        let err = HttpDatabase::new(&HttpDatabaseConfig::default(), "").unwrap_err();
        assert!(matches!(err, HttpConfigError::InvalidValue(_)));
    }
}
