//! Async HTTP client wrapping the canvass JSON API as a [`CrmStore`].

use std::time::Duration;

use canvass_core::{
  contact::{
    Address, Contact, ContactPatch, Email, Gender, NewAddress, NewContact,
    NewEmail, NewPhoneNumber, NewSocialMediaAccount, PhoneNumber, Race,
    SocialMediaAccount, Tag, TagAssignment, Workspace,
  },
  field::ContactField,
  store::CrmStore,
  view::{ContactView, NewContactView},
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Connection settings for the canvass API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{status}: {message}")]
  Api { status: StatusCode, message: String },

  #[error("contact not found: {0}")]
  ContactNotFound(Uuid),

  #[error("view not found: {0}")]
  ViewNotFound(Uuid),
}

impl ClientError {
  fn is_not_found(&self) -> bool {
    matches!(self, Self::Api { status, .. } if *status == StatusCode::NOT_FOUND)
  }

  fn or_not_found(self, missing: impl FnOnce() -> Self) -> Self {
    if self.is_not_found() { missing() } else { self }
  }
}

impl From<ClientError> for canvass_core::Error {
  fn from(err: ClientError) -> Self {
    match err {
      ClientError::Api { status, message } if status == StatusCode::BAD_REQUEST => {
        Self::Validation(message)
      }
      ClientError::Api { status, .. }
        if status == StatusCode::SERVICE_UNAVAILABLE =>
      {
        Self::NotInitialized
      }
      ClientError::ContactNotFound(id) => Self::ContactNotFound(id),
      ClientError::ViewNotFound(id) => Self::ViewNotFound(id),
      other => Self::network(other),
    }
  }
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the canvass JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct RemoteStore {
  client: Client,
  config: ApiConfig,
}

impl RemoteStore {
  pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, ClientError> {
    let resp = self.auth(req).send().await?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.error,
      Err(_) => status.canonical_reason().unwrap_or("error").to_owned(),
    };
    tracing::debug!(%status, %message, "api request failed");
    Err(ClientError::Api { status, message })
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
    Ok(self.send(self.client.get(self.url(path))).await?.json().await?)
  }

  async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ClientError> {
    let req = self.client.post(self.url(path)).json(body);
    Ok(self.send(req).await?.json().await?)
  }

  async fn delete(&self, path: &str) -> Result<(), ClientError> {
    self.send(self.client.delete(self.url(path))).await?;
    Ok(())
  }
}

impl CrmStore for RemoteStore {
  type Error = ClientError;

  // ── Workspaces ──────────────────────────────────────────────────────────

  async fn add_workspace(&self, name: String) -> Result<Workspace, ClientError> {
    self.post("/workspaces", &json!({ "name": name })).await
  }

  async fn list_workspaces(&self) -> Result<Vec<Workspace>, ClientError> {
    self.get("/workspaces").await
  }

  // ── Lookups ─────────────────────────────────────────────────────────────

  async fn list_races(&self) -> Result<Vec<Race>, ClientError> {
    self.get("/races").await
  }

  async fn list_genders(&self) -> Result<Vec<Gender>, ClientError> {
    self.get("/genders").await
  }

  async fn list_tags(&self, workspace_id: Uuid) -> Result<Vec<Tag>, ClientError> {
    self.get(&format!("/workspaces/{workspace_id}/tags")).await
  }

  async fn add_tag(&self, workspace_id: Uuid, tag: String) -> Result<Tag, ClientError> {
    let path = format!("/workspaces/{workspace_id}/tags");
    self.post(&path, &json!({ "tag": tag })).await
  }

  // ── Contacts ────────────────────────────────────────────────────────────

  async fn list_contacts(&self, workspace_id: Uuid) -> Result<Vec<Contact>, ClientError> {
    self.get(&format!("/workspaces/{workspace_id}/contacts")).await
  }

  async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>, ClientError> {
    match self.get(&format!("/contacts/{id}")).await {
      Ok(contact) => Ok(Some(contact)),
      Err(e) if e.is_not_found() => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn insert_contact(&self, input: NewContact) -> Result<Contact, ClientError> {
    self.post("/contacts", &input).await
  }

  async fn update_contact(
    &self,
    id: Uuid,
    patch: ContactPatch,
  ) -> Result<Contact, ClientError> {
    let req = self.client.patch(self.url(&format!("/contacts/{id}"))).json(&patch);
    let resp = self
      .send(req)
      .await
      .map_err(|e| e.or_not_found(|| ClientError::ContactNotFound(id)))?;
    Ok(resp.json().await?)
  }

  async fn delete_contact(&self, id: Uuid) -> Result<(), ClientError> {
    self
      .delete(&format!("/contacts/{id}"))
      .await
      .map_err(|e| e.or_not_found(|| ClientError::ContactNotFound(id)))
  }

  // ── Child collections ───────────────────────────────────────────────────

  async fn insert_emails(
    &self,
    contact_id: Uuid,
    emails: Vec<NewEmail>,
  ) -> Result<Vec<Email>, ClientError> {
    self.post(&format!("/contacts/{contact_id}/emails"), &emails).await
  }

  async fn insert_phone_numbers(
    &self,
    contact_id: Uuid,
    phones: Vec<NewPhoneNumber>,
  ) -> Result<Vec<PhoneNumber>, ClientError> {
    self.post(&format!("/contacts/{contact_id}/phone_numbers"), &phones).await
  }

  async fn insert_addresses(
    &self,
    contact_id: Uuid,
    addresses: Vec<NewAddress>,
  ) -> Result<Vec<Address>, ClientError> {
    self.post(&format!("/contacts/{contact_id}/addresses"), &addresses).await
  }

  async fn insert_social_media_accounts(
    &self,
    contact_id: Uuid,
    accounts: Vec<NewSocialMediaAccount>,
  ) -> Result<Vec<SocialMediaAccount>, ClientError> {
    let path = format!("/contacts/{contact_id}/social_media_accounts");
    self.post(&path, &accounts).await
  }

  async fn assign_tags(
    &self,
    contact_id: Uuid,
    tag_ids: Vec<Uuid>,
  ) -> Result<Vec<TagAssignment>, ClientError> {
    let path = format!("/contacts/{contact_id}/tags");
    self.post(&path, &json!({ "tag_ids": tag_ids })).await
  }

  // ── Views ───────────────────────────────────────────────────────────────

  async fn list_views(&self, workspace_id: Uuid) -> Result<Vec<ContactView>, ClientError> {
    self.get(&format!("/workspaces/{workspace_id}/views")).await
  }

  async fn insert_view(&self, input: NewContactView) -> Result<ContactView, ClientError> {
    self.post("/views", &input).await
  }

  async fn update_view(&self, view: ContactView) -> Result<ContactView, ClientError> {
    let id = view.id;
    let req = self.client.put(self.url(&format!("/views/{id}"))).json(&view);
    let resp = self
      .send(req)
      .await
      .map_err(|e| e.or_not_found(|| ClientError::ViewNotFound(id)))?;
    Ok(resp.json().await?)
  }

  async fn set_view_visibility(
    &self,
    view_id: Uuid,
    field: ContactField,
    visible: bool,
  ) -> Result<ContactView, ClientError> {
    let req = self
      .client
      .patch(self.url(&format!("/views/{view_id}/visibility")))
      .json(&json!({ "field": field, "visible": visible }));
    let resp = self
      .send(req)
      .await
      .map_err(|e| e.or_not_found(|| ClientError::ViewNotFound(view_id)))?;
    Ok(resp.json().await?)
  }

  async fn delete_view(&self, view_id: Uuid) -> Result<(), ClientError> {
    self
      .delete(&format!("/views/{view_id}"))
      .await
      .map_err(|e| e.or_not_found(|| ClientError::ViewNotFound(view_id)))
  }
}
