use crate::config::BackendConfig;
use crate::firestore::{Document, ErrorEnvelope, ListDocumentsResponse};
use crate::{
    ChatMessage, Collection, Match, MatchUpdate, Registration, ReviewStatus, Role, SITE_CONFIG_ID,
    SiteConfig, UserProfile, validate_chat_body,
};
use chrono::Utc;
use futures_util::Stream;
use futures_util::stream;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

pub type ApiResult<T> = Result<T, ApiError>;

const PAGE_SIZE: &str = "300";

/// Client for the club's managed backend: documents, auth and uploads.
#[derive(Debug, Clone)]
pub struct HubApi {
    client: Client,
    config: BackendConfig,
    id_token: Option<String>,
    timeout: Duration,
}

impl Default for HubApi {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(StatusCode, String),
    Parsing(serde_json::Error, String),
    NotFound(String),
    Unauthorized(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(status, msg) => write!(f, "API error {status}: {msg}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Result of an email/password sign-in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSession {
    pub id_token: String,
    pub refresh_token: String,
    #[serde(rename = "localId")]
    pub uid: String,
    pub email: String,
    pub display_name: String,
}

/// An account whose id token has been verified by the auth service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthAccount {
    #[serde(rename = "localId")]
    pub uid: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Deserialize, Default, Debug)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AuthAccount>,
}

#[derive(Deserialize, Default, Debug)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

impl HubApi {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent("esports-hub/0.1 (club tournament hub)")
                .build()
                .unwrap_or_default(),
            config,
            id_token: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Attach a bearer token sent with every document request.
    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    /// Fetch every document of a collection, following page tokens.
    pub async fn list_documents(&self, collection: Collection) -> ApiResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("pageSize", PAGE_SIZE)];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let url = self.document_url(collection, None, &query)?;
            let page: ListDocumentsResponse = self.fetch(Method::GET, url, None).await?;
            documents.extend(page.documents);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(documents)
    }

    /// Every decodable document of a collection. Malformed documents are
    /// skipped with a warning rather than failing the snapshot.
    pub async fn list<T: DeserializeOwned>(&self, collection: Collection) -> ApiResult<Vec<T>> {
        let documents = self.list_documents(collection).await?;
        Ok(decode_all(collection, &documents))
    }

    pub async fn get<T: DeserializeOwned>(&self, collection: Collection, id: &str) -> ApiResult<T> {
        let url = self.document_url(collection, Some(id), &[])?;
        let label = url.to_string();
        let document: Document = self.fetch(Method::GET, url, None).await?;
        document.decode().map_err(|e| ApiError::Parsing(e, label))
    }

    /// Create a document with a backend-assigned id and return that id.
    pub async fn create<T: Serialize>(&self, collection: Collection, value: &T) -> ApiResult<String> {
        let body = Document::from_value(value)
            .map_err(|e| ApiError::Other(format!("cannot encode {}: {e}", collection.as_str())))?;
        let url = self.document_url(collection, None, &[])?;
        let created: Document = self.fetch(Method::POST, url, Some(&body)).await?;
        Ok(created.id().to_string())
    }

    /// Overwrite the given top-level fields of an existing document.
    pub async fn patch<T: Serialize>(&self, collection: Collection, id: &str, fields: &T) -> ApiResult<()> {
        let body = Document::from_value(fields)
            .map_err(|e| ApiError::Other(format!("cannot encode {}: {e}", collection.as_str())))?;
        let mut query: Vec<(&str, &str)> = body
            .fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));
        let url = self.document_url(collection, Some(id), &query)?;
        let _: Document = self.fetch(Method::PATCH, url, Some(&body)).await?;
        Ok(())
    }

    pub async fn delete(&self, collection: Collection, id: &str) -> ApiResult<()> {
        let url = self.document_url(collection, Some(id), &[("currentDocument.exists", "true")])?;
        let label = url.to_string();
        self.send(self.authorized(Method::DELETE, url), &label).await?;
        Ok(())
    }

    /// Live query over a collection.
    ///
    /// Polls immediately and then every `every`, yielding a snapshot only
    /// when some document was added, removed or updated. Errors are yielded
    /// without ending the stream; the first good poll after an error always
    /// yields. Dropping the stream cancels the subscription.
    pub fn subscribe<T>(
        &self,
        collection: Collection,
        every: Duration,
    ) -> impl Stream<Item = ApiResult<Vec<T>>> + Send + use<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        struct Poll {
            api: HubApi,
            ticker: Option<Interval>,
            last: Option<Vec<(String, Option<String>)>>,
        }

        let start = Poll { api: self.clone(), ticker: None, last: None };
        stream::unfold(start, move |mut poll| async move {
            loop {
                poll.ticker
                    .get_or_insert_with(|| {
                        let mut ticker = interval(every);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        ticker
                    })
                    .tick()
                    .await;

                match poll.api.list_documents(collection).await {
                    Ok(documents) => {
                        let current = fingerprint(&documents);
                        if poll.last.as_ref() == Some(&current) {
                            continue;
                        }
                        poll.last = Some(current);
                        let snapshot = decode_all(collection, &documents);
                        return Some((Ok(snapshot), poll));
                    }
                    Err(e) => {
                        poll.last = None;
                        return Some((Err(e), poll));
                    }
                }
            }
        })
    }

    // -----------------------------------------------------------------------
    // Typed operations
    // -----------------------------------------------------------------------

    pub async fn user_profile(&self, uid: &str) -> ApiResult<Option<UserProfile>> {
        match self.get::<UserProfile>(Collection::Users, uid).await {
            Ok(profile) => Ok(Some(profile)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn site_config(&self) -> ApiResult<SiteConfig> {
        match self.get::<SiteConfig>(Collection::Config, SITE_CONFIG_ID).await {
            Err(ApiError::NotFound(_)) => Ok(SiteConfig::default()),
            other => other,
        }
    }

    pub async fn set_user_role(&self, uid: &str, role: Role) -> ApiResult<()> {
        self.patch(Collection::Users, uid, &json!({ "role": role })).await
    }

    pub async fn set_team_status(&self, team_id: &str, status: ReviewStatus) -> ApiResult<()> {
        self.patch(Collection::Teams, team_id, &json!({ "status": status })).await
    }

    pub async fn update_match(&self, match_id: &str, update: &MatchUpdate) -> ApiResult<()> {
        if update.is_empty() {
            return Err(ApiError::Other("match update has no fields".into()));
        }
        self.patch(Collection::Matches, match_id, update).await
    }

    pub async fn event_matches(&self, event_id: &str) -> ApiResult<Vec<Match>> {
        let matches: Vec<Match> = self.list(Collection::Matches).await?;
        Ok(matches.into_iter().filter(|m| m.event_id == event_id).collect())
    }

    pub async fn send_chat_message(&self, author: &str, uid: &str, body: &str) -> ApiResult<String> {
        let body = validate_chat_body(body).map_err(ApiError::Other)?;
        let message = ChatMessage {
            id: String::new(),
            author: author.to_string(),
            uid: uid.to_string(),
            body,
            sent_at: Some(Utc::now()),
        };
        self.create(Collection::LiveChat, &message).await
    }

    pub async fn delete_chat_message(&self, message_id: &str) -> ApiResult<()> {
        self.delete(Collection::LiveChat, message_id).await
    }

    pub async fn submit_registration(&self, registration: &Registration) -> ApiResult<String> {
        let mut registration = registration.clone();
        registration.status = ReviewStatus::Pending;
        registration.submitted_at = Some(Utc::now());
        self.create(Collection::Registrations, &registration).await
    }

    /// Approve or reject a pending registration. Approval creates the team
    /// document first, then marks the registration.
    pub async fn review_registration(&self, registration_id: &str, decision: ReviewStatus) -> ApiResult<()> {
        if decision == ReviewStatus::Pending {
            return Err(ApiError::Other("a review must approve or reject".into()));
        }
        let registration: Registration = self.get(Collection::Registrations, registration_id).await?;
        if registration.status != ReviewStatus::Pending {
            return Err(ApiError::Other(format!(
                "registration {registration_id} already {}",
                registration.status.label()
            )));
        }
        if decision == ReviewStatus::Approved {
            let team_id = self.create(Collection::Teams, &registration.to_team()).await?;
            log::info!("registration {registration_id} approved as team {team_id}");
        }
        self.patch(Collection::Registrations, registration_id, &json!({ "status": decision }))
            .await
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<AuthSession> {
        let url = self.auth_url("accounts:signInWithPassword")?;
        let label = url.to_string();
        let request = self.client.post(url).json(&json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        }));
        let response = self.send(request, &label).await.map_err(bad_request_is_unauthorized)?;
        parse_body(response, &label).await
    }

    /// Verify an id token and return the account it belongs to.
    pub async fn lookup_account(&self, id_token: &str) -> ApiResult<AuthAccount> {
        let url = self.auth_url("accounts:lookup")?;
        let label = url.to_string();
        let request = self.client.post(url).json(&json!({ "idToken": id_token }));
        let response = self.send(request, &label).await.map_err(bad_request_is_unauthorized)?;
        let lookup: LookupResponse = parse_body(response, &label).await?;
        lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Unauthorized("token matches no account".into()))
    }

    // -----------------------------------------------------------------------
    // Uploads
    // -----------------------------------------------------------------------

    /// Upload an image file with the configured unsigned preset and return
    /// its hosted URL.
    pub async fn upload_image(&self, path: &Path) -> ApiResult<String> {
        let (Some(endpoint), Some(preset)) = (&self.config.upload_url, &self.config.upload_preset) else {
            return Err(ApiError::Other(
                "image uploads need HUB_UPLOAD_URL and HUB_UPLOAD_PRESET".into(),
            ));
        };
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Other(format!("could not read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("logo")
            .to_string();

        let form = reqwest::multipart::Form::new()
            .text("upload_preset", preset.clone())
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));
        let request = self.client.post(endpoint.as_str()).multipart(form);
        let response = self.send(request, endpoint).await?;
        let uploaded: UploadResponse = parse_body(response, endpoint).await?;
        uploaded
            .secure_url
            .or(uploaded.url)
            .ok_or_else(|| ApiError::Other("upload response carried no URL".into()))
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn document_url(&self, collection: Collection, id: Option<&str>, query: &[(&str, &str)]) -> ApiResult<Url> {
        let base = format!("{}/{}", self.config.documents_root(), collection.as_str());
        let mut url =
            Url::parse(&base).map_err(|e| ApiError::Other(format!("invalid backend url {base}: {e}")))?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|_| ApiError::Other(format!("backend url {base} cannot take a path")))?
                .push(id);
        }
        self.append_query(&mut url, query);
        Ok(url)
    }

    fn auth_url(&self, method: &str) -> ApiResult<Url> {
        let raw = format!("{}/{method}", self.config.auth_url.trim_end_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| ApiError::Other(format!("invalid auth url {raw}: {e}")))?;
        self.append_query(&mut url, &[]);
        Ok(url)
    }

    fn append_query(&self, url: &mut Url, query: &[(&str, &str)]) {
        if self.config.api_key.is_none() && query.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        if let Some(key) = &self.config.api_key {
            pairs.append_pair("key", key);
        }
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }

    fn authorized(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, method: Method, url: Url, body: Option<&Document>) -> ApiResult<T> {
        let label = url.to_string();
        let mut request = self.authorized(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.send(request, &label).await?;
        parse_body(response, &label).await
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> ApiResult<Response> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .map(|e| e.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or(body);
        log::debug!("{url} failed with {status}: {message}");

        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            _ => ApiError::Api(status, message),
        })
    }
}

async fn parse_body<T: DeserializeOwned>(response: Response, url: &str) -> ApiResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Network(e, url.to_owned()))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Parsing(e, url.to_owned()))
}

/// The auth service answers bad credentials and bad tokens with 400.
fn bad_request_is_unauthorized(err: ApiError) -> ApiError {
    match err {
        ApiError::Api(StatusCode::BAD_REQUEST, msg) => ApiError::Unauthorized(msg),
        other => other,
    }
}

fn decode_all<T: DeserializeOwned>(collection: Collection, documents: &[Document]) -> Vec<T> {
    documents
        .iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("skipping malformed {} document {}: {e}", collection.as_str(), doc.id());
                None
            }
        })
        .collect()
}

fn fingerprint(documents: &[Document]) -> Vec<(String, Option<String>)> {
    documents
        .iter()
        .map(|d| (d.name.clone(), d.update_time.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatchStatus, Team};
    use futures_util::StreamExt;
    use mockito::{Matcher, Server};
    use std::io::Write;

    const ROOT: &str = "/v1/projects/club/databases/(default)/documents";

    fn api_for(server: &Server) -> HubApi {
        HubApi::new(BackendConfig {
            project_id: "club".into(),
            firestore_url: format!("{}/v1", server.url()),
            auth_url: format!("{}/auth/v1", server.url()),
            upload_url: Some(format!("{}/upload", server.url())),
            upload_preset: Some("club-logos".into()),
            ..BackendConfig::default()
        })
    }

    fn doc(collection: &str, id: &str, fields: serde_json::Value) -> serde_json::Value {
        json!({
            "name": format!("projects/club/databases/(default)/documents/{collection}/{id}"),
            "fields": fields,
            "updateTime": "2026-03-01T18:30:00Z"
        })
    }

    #[tokio::test]
    async fn list_follows_pages_and_skips_malformed_documents() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", format!("{ROOT}/matches").as_str())
            .match_query(Matcher::Exact("pageSize=300".into()))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "documents": [
                        doc("matches", "m1", json!({ "teamA": { "stringValue": "Owls" } })),
                        doc("matches", "bad", json!({ "scoreA": { "stringValue": "lots" } }))
                    ],
                    "nextPageToken": "p2"
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", format!("{ROOT}/matches").as_str())
            .match_query(Matcher::Exact("pageSize=300&pageToken=p2".into()))
            .with_header("content-type", "application/json")
            .with_body(json!({ "documents": [doc("matches", "m2", json!({}))] }).to_string())
            .create_async()
            .await;

        let matches: Vec<Match> = api_for(&server).list(Collection::Matches).await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(matches[0].team_a, "Owls");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("{ROOT}/users/ghost").as_str())
            .with_status(404)
            .with_body(json!({ "error": { "code": 404, "message": "no such document", "status": "NOT_FOUND" } }).to_string())
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api.get::<UserProfile>(Collection::Users, "ghost").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "no such document"), "{err}");
        assert_eq!(api.user_profile("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn patch_sends_mask_precondition_and_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", format!("{ROOT}/teams/t1").as_str())
            .match_header("authorization", "Bearer admin-token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("updateMask.fieldPaths".into(), "status".into()),
                Matcher::UrlEncoded("currentDocument.exists".into(), "true".into()),
            ]))
            .match_body(Matcher::PartialJson(json!({
                "fields": { "status": { "stringValue": "approved" } }
            })))
            .with_body(doc("teams", "t1", json!({})).to_string())
            .create_async()
            .await;

        api_for(&server)
            .with_id_token("admin-token")
            .set_team_status("t1", ReviewStatus::Approved)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_match_writes_only_given_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", format!("{ROOT}/matches/m7").as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("updateMask.fieldPaths=scoreB".into()),
                Matcher::Regex("updateMask.fieldPaths=status".into()),
            ]))
            .match_body(Matcher::Json(json!({
                "fields": {
                    "scoreB": { "integerValue": "2" },
                    "status": { "stringValue": "ongoing" }
                }
            })))
            .with_body(doc("matches", "m7", json!({})).to_string())
            .create_async()
            .await;

        let api = api_for(&server);
        let update = MatchUpdate { score_a: None, score_b: Some(2), status: Some(MatchStatus::Ongoing) };
        api.update_match("m7", &update).await.unwrap();
        mock.assert_async().await;

        assert!(api.update_match("m7", &MatchUpdate::default()).await.is_err());
    }

    #[tokio::test]
    async fn approving_registration_creates_team_then_marks_it() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("{ROOT}/registrations/r1").as_str())
            .with_body(
                doc(
                    "registrations",
                    "r1",
                    json!({
                        "eventId": { "stringValue": "spring" },
                        "teamName": { "stringValue": " Night Owls " },
                        "captain": { "stringValue": "Ana" },
                        "members": { "arrayValue": { "values": [{ "stringValue": "Ana" }, { "stringValue": "Bo" }] } },
                        "status": { "stringValue": "pending" }
                    }),
                )
                .to_string(),
            )
            .create_async()
            .await;
        let team = server
            .mock("POST", format!("{ROOT}/teams").as_str())
            .match_body(Matcher::PartialJson(json!({
                "fields": {
                    "name": { "stringValue": "Night Owls" },
                    "eventId": { "stringValue": "spring" },
                    "status": { "stringValue": "approved" }
                }
            })))
            .with_body(doc("teams", "t9", json!({})).to_string())
            .create_async()
            .await;
        let mark = server
            .mock("PATCH", format!("{ROOT}/registrations/r1").as_str())
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({
                "fields": { "status": { "stringValue": "approved" } }
            })))
            .with_body(doc("registrations", "r1", json!({})).to_string())
            .create_async()
            .await;

        api_for(&server)
            .review_registration("r1", ReviewStatus::Approved)
            .await
            .unwrap();
        team.assert_async().await;
        mark.assert_async().await;
    }

    #[tokio::test]
    async fn rejecting_registration_creates_no_team() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("{ROOT}/registrations/r2").as_str())
            .with_body(doc("registrations", "r2", json!({})).to_string())
            .create_async()
            .await;
        let team = server
            .mock("POST", format!("{ROOT}/teams").as_str())
            .expect(0)
            .create_async()
            .await;
        server
            .mock("PATCH", format!("{ROOT}/registrations/r2").as_str())
            .match_query(Matcher::Any)
            .with_body(doc("registrations", "r2", json!({})).to_string())
            .create_async()
            .await;

        let api = api_for(&server);
        api.review_registration("r2", ReviewStatus::Rejected).await.unwrap();
        team.assert_async().await;
        assert!(api.review_registration("r2", ReviewStatus::Pending).await.is_err());
    }

    #[tokio::test]
    async fn reviewed_registration_is_not_reviewed_again() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("{ROOT}/registrations/r3").as_str())
            .with_body(
                doc(
                    "registrations",
                    "r3",
                    json!({
                        "teamName": { "stringValue": "Night Owls" },
                        "status": { "stringValue": "approved" }
                    }),
                )
                .to_string(),
            )
            .create_async()
            .await;
        let team = server
            .mock("POST", format!("{ROOT}/teams").as_str())
            .expect(0)
            .create_async()
            .await;
        let mark = server
            .mock("PATCH", format!("{ROOT}/registrations/r3").as_str())
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api.review_registration("r3", ReviewStatus::Approved).await.unwrap_err();
        assert!(matches!(err, ApiError::Other(ref m) if m.contains("already approved")), "{err}");
        assert!(api.review_registration("r3", ReviewStatus::Rejected).await.is_err());
        team.assert_async().await;
        mark.assert_async().await;
    }

    #[tokio::test]
    async fn lookup_maps_bad_token_to_unauthorized() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/v1/accounts:lookup")
            .match_body(Matcher::Json(json!({ "idToken": "stale" })))
            .with_status(400)
            .with_body(json!({ "error": { "code": 400, "message": "INVALID_ID_TOKEN" } }).to_string())
            .create_async()
            .await;
        server
            .mock("POST", "/auth/v1/accounts:lookup")
            .match_body(Matcher::Json(json!({ "idToken": "fresh" })))
            .with_body(
                json!({ "users": [{ "localId": "u1", "email": "ana@club.example", "displayName": "Ana" }] })
                    .to_string(),
            )
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api.lookup_account("stale").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "INVALID_ID_TOKEN"), "{err}");

        let account = api.lookup_account("fresh").await.unwrap();
        assert_eq!(account.uid, "u1");
        assert_eq!(account.display_name, "Ana");
    }

    #[tokio::test]
    async fn sign_in_returns_session() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/v1/accounts:signInWithPassword")
            .match_body(Matcher::PartialJson(json!({ "email": "ana@club.example", "returnSecureToken": true })))
            .with_body(
                json!({ "idToken": "tok", "refreshToken": "ref", "localId": "u1", "email": "ana@club.example" })
                    .to_string(),
            )
            .create_async()
            .await;

        let session = api_for(&server).sign_in("ana@club.example", "hunter2").await.unwrap();
        assert_eq!(session.id_token, "tok");
        assert_eq!(session.uid, "u1");
        assert_eq!(session.display_name, "");
    }

    #[tokio::test]
    async fn chat_send_validates_then_creates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", format!("{ROOT}/live_chat").as_str())
            .match_body(Matcher::PartialJson(json!({
                "fields": {
                    "author": { "stringValue": "Ana" },
                    "body": { "stringValue": "gg" }
                }
            })))
            .with_body(doc("live_chat", "c1", json!({})).to_string())
            .create_async()
            .await;

        let api = api_for(&server);
        assert_eq!(api.send_chat_message("Ana", "u1", "  gg ").await.unwrap(), "c1");
        assert!(matches!(api.send_chat_message("Ana", "u1", "   ").await, Err(ApiError::Other(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upload_posts_preset_and_returns_secure_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .match_body(Matcher::Regex("club-logos".into()))
            .with_body(json!({ "secure_url": "https://img.example/owls.png" }).to_string())
            .create_async()
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"fake png bytes").unwrap();

        let url = api_for(&server).upload_image(file.path()).await.unwrap();
        assert_eq!(url, "https://img.example/owls.png");
        mock.assert_async().await;

        let unconfigured = HubApi::default();
        assert!(unconfigured.upload_image(file.path()).await.is_err());
    }

    #[tokio::test]
    async fn subscription_yields_first_snapshot() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("{ROOT}/news").as_str())
            .match_query(Matcher::Any)
            .with_body(
                json!({ "documents": [doc("news", "n1", json!({ "title": { "stringValue": "Spring Cup" } }))] })
                    .to_string(),
            )
            .create_async()
            .await;

        let api = api_for(&server);
        let mut live = Box::pin(api.subscribe::<crate::NewsPost>(Collection::News, Duration::from_millis(20)));
        let first = live.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "Spring Cup");
    }

    #[tokio::test]
    async fn subscription_skips_unchanged_polls() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", format!("{ROOT}/rules").as_str())
            .match_query(Matcher::Any)
            .with_body(json!({ "documents": [doc("rules", "r1", json!({}))] }).to_string())
            .expect_at_least(3)
            .create_async()
            .await;

        let api = api_for(&server);
        let mut live = Box::pin(api.subscribe::<crate::Rule>(Collection::Rules, Duration::from_millis(20)));
        assert_eq!(live.next().await.unwrap().unwrap().len(), 1);
        let again = tokio::time::timeout(Duration::from_millis(200), live.next()).await;
        assert!(again.is_err(), "identical poll yielded a snapshot");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn subscription_survives_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("{ROOT}/teams").as_str())
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("backend down")
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", format!("{ROOT}/teams").as_str())
            .match_query(Matcher::Any)
            .with_body(
                json!({ "documents": [doc("teams", "t1", json!({ "name": { "stringValue": "Owls" } }))] })
                    .to_string(),
            )
            .create_async()
            .await;

        let api = api_for(&server);
        let mut live = Box::pin(api.subscribe::<Team>(Collection::Teams, Duration::from_millis(20)));
        let err = live.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ApiError::Api(StatusCode::INTERNAL_SERVER_ERROR, _)), "{err}");
        let teams = live.next().await.unwrap().unwrap();
        assert_eq!(teams[0].name, "Owls");
    }

    #[test]
    fn fingerprint_tracks_update_times() {
        let a = Document { name: "x/teams/a".into(), update_time: Some("1".into()), ..Document::default() };
        let mut b = a.clone();
        assert_eq!(fingerprint(&[a.clone()]), fingerprint(&[b.clone()]));
        b.update_time = Some("2".into());
        assert_ne!(fingerprint(&[a]), fingerprint(&[b]));
    }

    #[test]
    fn decode_all_keeps_good_documents() {
        let good = Document::from_value(&Team { name: "Owls".into(), ..Team::default() }).unwrap();
        let bad = Document::from_value(&json!({ "members": "not-a-list" })).unwrap();
        let teams: Vec<Team> = decode_all(Collection::Teams, &[good, bad]);
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name, "Owls");
    }
}
