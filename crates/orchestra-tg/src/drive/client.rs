use super::{Config, DriveError};
use crate::prelude::*;
use crate::{err, http, Result};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const FILE_FIELDS: &str = "id,name,webViewLink";

/// Tokens are refreshed a bit earlier than Google expires them
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const MULTIPART_BOUNDARY: &str = "orchestra_tg_multipart_boundary";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveItem {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) web_view_link: Option<String>,
}

#[derive(Deserialize)]
struct FileList {
    files: Vec<DriveItem>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct AccessToken {
    token: String,
    expires_at: Instant,
}

/// Thin client of the Google Drive v3 REST API authorized via an OAuth
/// refresh token
pub(crate) struct DriveClient {
    http: http::Client,
    cfg: Config,
    token: Mutex<Option<AccessToken>>,
}

impl DriveClient {
    pub(crate) fn new(cfg: Config, http: http::Client) -> Self {
        Self {
            http,
            cfg,
            token: Mutex::new(None),
        }
    }

    pub(crate) fn root_folder_id(&self) -> &str {
        &self.cfg.root_folder_id
    }

    async fn access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;

        if let Some(token) = &*token {
            if Instant::now() < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        let response: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.cfg.client_id.as_str()),
                ("client_secret", self.cfg.client_secret.as_str()),
                ("refresh_token", self.cfg.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .read_json()
            .await
            .map_err(|source| err!(DriveError::Auth { source }))?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);

        debug!(lifetime = tracing_duration(lifetime), "Refreshed Google Drive access token");

        *token = Some(AccessToken {
            token: response.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(response.access_token)
    }

    /// Looks up a non-trashed child of `parent` by its exact name
    pub(crate) async fn find_child(
        &self,
        parent: &str,
        name: &str,
        mime_type: Option<&str>,
    ) -> Result<Option<DriveItem>> {
        let token = self.access_token().await?;
        let query = child_query(parent, name, mime_type);

        let list: FileList = self
            .http
            .get(FILES_URL)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name,webViewLink)"),
                ("pageSize", "10"),
            ])
            .read_json()
            .await?;

        let mut files = list.files.into_iter();
        let first = files.next();

        if files.next().is_some() {
            warn!(parent, name, "Multiple Google Drive items share the same name, using the first one");
        }

        Ok(first)
    }

    pub(crate) async fn create_folder(&self, parent: &str, name: &str) -> Result<DriveItem> {
        if name.is_empty() {
            return Err(err!(DriveError::EmptyFolderName {
                parent: parent.to_owned()
            }));
        }

        let token = self.access_token().await?;

        let folder: DriveItem = self
            .http
            .post(FILES_URL)
            .bearer_auth(token)
            .query(&[("fields", FILE_FIELDS)])
            .json(&serde_json::json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
                "parents": [parent],
            }))
            .read_json()
            .await?;

        info!(parent, name, id = %folder.id, "Created Google Drive folder");

        Ok(folder)
    }

    pub(crate) async fn get_or_create_folder(&self, parent: &str, name: &str) -> Result<DriveItem> {
        if let Some(folder) = self.find_child(parent, name, Some(FOLDER_MIME_TYPE)).await? {
            return Ok(folder);
        }
        self.create_folder(parent, name).await
    }

    /// Creates a plain text file or replaces the content of the existing one
    pub(crate) async fn put_text_file(&self, parent: &str, name: &str, text: &str) -> Result<DriveItem> {
        let existing = self.find_child(parent, name, None).await?;
        let token = self.access_token().await?;

        let request = match &existing {
            Some(file) => self
                .http
                .patch(format!("{UPLOAD_URL}/{}", file.id))
                .query(&[("uploadType", "media"), ("fields", FILE_FIELDS)])
                .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=UTF-8")
                .body(text.to_owned()),
            None => self
                .http
                .post(UPLOAD_URL)
                .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
                .header(
                    reqwest::header::CONTENT_TYPE,
                    format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
                )
                .body(multipart_body(parent, name, text)),
        };

        let file: DriveItem = request.bearer_auth(token).read_json().await?;

        info!(
            parent,
            name,
            id = %file.id,
            replaced = existing.is_some(),
            "Stored text file in Google Drive"
        );

        Ok(file)
    }
}

/// Drive query language uses single-quoted strings with backslash escapes
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn child_query(parent: &str, name: &str, mime_type: Option<&str>) -> String {
    let mut query = format!(
        "name = '{}' and '{}' in parents and trashed = false",
        escape_query_value(name),
        escape_query_value(parent),
    );

    if let Some(mime_type) = mime_type {
        query += &format!(" and mimeType = '{mime_type}'");
    }

    query
}

fn multipart_body(parent: &str, name: &str, text: &str) -> String {
    let metadata = serde_json::json!({
        "name": name,
        "mimeType": "text/plain",
        "parents": [parent],
    });

    format!(
        "--{MULTIPART_BOUNDARY}\r\n\
        Content-Type: application/json; charset=UTF-8\r\n\r\n\
        {metadata}\r\n\
        --{MULTIPART_BOUNDARY}\r\n\
        Content-Type: text/plain; charset=UTF-8\r\n\r\n\
        {text}\r\n\
        --{MULTIPART_BOUNDARY}--"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn child_query_escapes_quotes() {
        expect![[r#"name = 'Rock\'n\'Roll' and 'root-id' in parents and trashed = false and mimeType = 'application/vnd.google-apps.folder'"#]]
            .assert_eq(&child_query("root-id", "Rock'n'Roll", Some(FOLDER_MIME_TYPE)));

        expect![[r#"name = 'script.txt' and 'a\\b' in parents and trashed = false"#]]
            .assert_eq(&child_query(r"a\b", "script.txt", None));
    }

    #[test]
    fn multipart_body_layout() {
        let body = multipart_body("folder-id", "script.txt", "Hello");
        let parts: Vec<_> = body.split("\r\n").collect();

        assert_eq!(
            parts,
            [
                "--orchestra_tg_multipart_boundary",
                "Content-Type: application/json; charset=UTF-8",
                "",
                r#"{"mimeType":"text/plain","name":"script.txt","parents":["folder-id"]}"#,
                "--orchestra_tg_multipart_boundary",
                "Content-Type: text/plain; charset=UTF-8",
                "",
                "Hello",
                "--orchestra_tg_multipart_boundary--",
            ]
        );
    }
}
