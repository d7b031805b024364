//! Typed CRUD operations over the management API
//!
//! [`SftpgoClient`] is safe to share across concurrent callers; every
//! operation is a single independent HTTP exchange through the shared
//! executor. Read-modify-write consistency across operations is the
//! caller's responsibility.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::Credentials;
use crate::config::{ClientConfig, Edition};
use crate::error::{ClientError, Result};
use crate::http::Executor;
use crate::types::{
    Admin, BackupData, EventAction, EventRule, Folder, Group, License, Role, User,
};

/// Page size for paginated list endpoints
const PAGE_LIMIT: usize = 100;

const USERS_PATH: &str = "/api/v2/users";
const ADMINS_PATH: &str = "/api/v2/admins";
const GROUPS_PATH: &str = "/api/v2/groups";
const FOLDERS_PATH: &str = "/api/v2/folders";
const ROLES_PATH: &str = "/api/v2/roles";
const EVENT_ACTIONS_PATH: &str = "/api/v2/eventactions";
const EVENT_RULES_PATH: &str = "/api/v2/eventrules";
const DUMPDATA_PATH: &str = "/api/v2/dumpdata";
const LICENSE_PATH: &str = "/api/v2/license";

/// Client for the SFTPGo management API
#[derive(Debug)]
pub struct SftpgoClient {
    executor: Executor,
    edition: Edition,
}

impl SftpgoClient {
    /// Create a client from a configuration and credentials.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] when the credentials are
    /// incomplete or the base URL is invalid; no request is attempted
    /// in that case.
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let edition = config.edition;
        let executor = Executor::new(&config, credentials)?;
        Ok(Self { executor, edition })
    }

    // ---- users ----------------------------------------------------------

    /// List every user via the bulk export endpoint
    pub async fn get_users(&self) -> Result<Vec<User>> {
        Ok(self.dump("users").await?.users)
    }

    pub async fn get_user(&self, username: &str) -> Result<User> {
        let path = format!("{USERS_PATH}/{}", escape(username));
        self.get_json(&path, &self.confidential_query()).await
    }

    /// Create a user and return the server's view of it
    pub async fn create_user(&self, user: &User) -> Result<User> {
        self.create_json(USERS_PATH, &self.confidential_query(), user).await
    }

    pub async fn update_user(&self, user: &User) -> Result<()> {
        let path = format!("{USERS_PATH}/{}", escape(&user.username));
        self.update_json(&path, user).await
    }

    pub async fn delete_user(&self, username: &str) -> Result<()> {
        let path = format!("{USERS_PATH}/{}", escape(username));
        self.delete(&path).await
    }

    // ---- admins ---------------------------------------------------------

    /// List every admin, following the paginated list endpoint
    pub async fn get_admins(&self) -> Result<Vec<Admin>> {
        self.list_paginated(ADMINS_PATH).await
    }

    pub async fn get_admin(&self, username: &str) -> Result<Admin> {
        let path = format!("{ADMINS_PATH}/{}", escape(username));
        self.get_json(&path, &self.confidential_query()).await
    }

    pub async fn create_admin(&self, admin: &Admin) -> Result<Admin> {
        self.create_json(ADMINS_PATH, &self.confidential_query(), admin).await
    }

    pub async fn update_admin(&self, admin: &Admin) -> Result<()> {
        let path = format!("{ADMINS_PATH}/{}", escape(&admin.username));
        self.update_json(&path, admin).await
    }

    pub async fn delete_admin(&self, username: &str) -> Result<()> {
        let path = format!("{ADMINS_PATH}/{}", escape(username));
        self.delete(&path).await
    }

    // ---- groups ---------------------------------------------------------

    pub async fn get_groups(&self) -> Result<Vec<Group>> {
        self.list_paginated(GROUPS_PATH).await
    }

    pub async fn get_group(&self, name: &str) -> Result<Group> {
        let path = format!("{GROUPS_PATH}/{}", escape(name));
        self.get_json(&path, &[]).await
    }

    pub async fn create_group(&self, group: &Group) -> Result<Group> {
        self.create_json(GROUPS_PATH, &[], group).await
    }

    pub async fn update_group(&self, group: &Group) -> Result<()> {
        let path = format!("{GROUPS_PATH}/{}", escape(&group.name));
        self.update_json(&path, group).await
    }

    pub async fn delete_group(&self, name: &str) -> Result<()> {
        let path = format!("{GROUPS_PATH}/{}", escape(name));
        self.delete(&path).await
    }

    // ---- folders --------------------------------------------------------

    pub async fn get_folders(&self) -> Result<Vec<Folder>> {
        self.list_paginated(FOLDERS_PATH).await
    }

    pub async fn get_folder(&self, name: &str) -> Result<Folder> {
        let path = format!("{FOLDERS_PATH}/{}", escape(name));
        self.get_json(&path, &[]).await
    }

    pub async fn create_folder(&self, folder: &Folder) -> Result<Folder> {
        self.create_json(FOLDERS_PATH, &[], folder).await
    }

    pub async fn update_folder(&self, folder: &Folder) -> Result<()> {
        let path = format!("{FOLDERS_PATH}/{}", escape(&folder.name));
        self.update_json(&path, folder).await
    }

    pub async fn delete_folder(&self, name: &str) -> Result<()> {
        let path = format!("{FOLDERS_PATH}/{}", escape(name));
        self.delete(&path).await
    }

    // ---- roles ----------------------------------------------------------

    pub async fn get_roles(&self) -> Result<Vec<Role>> {
        self.list_paginated(ROLES_PATH).await
    }

    pub async fn get_role(&self, name: &str) -> Result<Role> {
        let path = format!("{ROLES_PATH}/{}", escape(name));
        self.get_json(&path, &[]).await
    }

    pub async fn create_role(&self, role: &Role) -> Result<Role> {
        self.create_json(ROLES_PATH, &[], role).await
    }

    pub async fn update_role(&self, role: &Role) -> Result<()> {
        let path = format!("{ROLES_PATH}/{}", escape(&role.name));
        self.update_json(&path, role).await
    }

    pub async fn delete_role(&self, name: &str) -> Result<()> {
        let path = format!("{ROLES_PATH}/{}", escape(name));
        self.delete(&path).await
    }

    // ---- event actions --------------------------------------------------

    /// List every event action via the bulk export endpoint
    pub async fn get_event_actions(&self) -> Result<Vec<EventAction>> {
        Ok(self.dump("event_actions").await?.event_actions)
    }

    pub async fn get_event_action(&self, name: &str) -> Result<EventAction> {
        let path = format!("{EVENT_ACTIONS_PATH}/{}", escape(name));
        self.get_json(&path, &[]).await
    }

    pub async fn create_event_action(&self, action: &EventAction) -> Result<EventAction> {
        self.create_json(EVENT_ACTIONS_PATH, &[], action).await
    }

    pub async fn update_event_action(&self, action: &EventAction) -> Result<()> {
        let path = format!("{EVENT_ACTIONS_PATH}/{}", escape(&action.name));
        self.update_json(&path, action).await
    }

    pub async fn delete_event_action(&self, name: &str) -> Result<()> {
        let path = format!("{EVENT_ACTIONS_PATH}/{}", escape(name));
        self.delete(&path).await
    }

    // ---- event rules ----------------------------------------------------

    /// List every event rule via the bulk export endpoint
    pub async fn get_event_rules(&self) -> Result<Vec<EventRule>> {
        Ok(self.dump("event_rules").await?.event_rules)
    }

    pub async fn get_event_rule(&self, name: &str) -> Result<EventRule> {
        let path = format!("{EVENT_RULES_PATH}/{}", escape(name));
        self.get_json(&path, &[]).await
    }

    pub async fn create_event_rule(&self, rule: &EventRule) -> Result<EventRule> {
        self.create_json(EVENT_RULES_PATH, &[], rule).await
    }

    pub async fn update_event_rule(&self, rule: &EventRule) -> Result<()> {
        let path = format!("{EVENT_RULES_PATH}/{}", escape(&rule.name));
        self.update_json(&path, rule).await
    }

    pub async fn delete_event_rule(&self, name: &str) -> Result<()> {
        let path = format!("{EVENT_RULES_PATH}/{}", escape(name));
        self.delete(&path).await
    }

    // ---- license --------------------------------------------------------

    pub async fn get_license(&self) -> Result<License> {
        self.get_json(LICENSE_PATH, &[]).await
    }

    /// Apply a license key. The server answers 200 on success.
    pub async fn set_license(&self, license: &License) -> Result<()> {
        let payload = serde_json::to_vec(license).map_err(ClientError::Serialization)?;
        self.executor
            .send_with_retry(Method::POST, LICENSE_PATH, &[], Some(payload), StatusCode::OK)
            .await?;
        Ok(())
    }

    // ---- shared plumbing ------------------------------------------------

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let bytes = self
            .executor
            .send_with_retry(Method::GET, path, query, None, StatusCode::OK)
            .await?;
        serde_json::from_slice(&bytes).map_err(ClientError::Deserialization)
    }

    async fn create_json<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &T,
    ) -> Result<R> {
        let payload = serde_json::to_vec(body).map_err(ClientError::Serialization)?;
        let bytes = self
            .executor
            .send_with_retry(Method::POST, path, query, Some(payload), StatusCode::CREATED)
            .await?;
        serde_json::from_slice(&bytes).map_err(ClientError::Deserialization)
    }

    async fn update_json<T: Serialize>(&self, path: &str, body: &T) -> Result<()> {
        let payload = serde_json::to_vec(body).map_err(ClientError::Serialization)?;
        self.executor
            .send_with_retry(Method::PUT, path, &[], Some(payload), StatusCode::OK)
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.executor.send_with_retry(Method::DELETE, path, &[], None, StatusCode::OK).await?;
        Ok(())
    }

    /// Collect a full listing by walking `limit`/`offset` pages.
    ///
    /// A page shorter than the limit is the end-of-data sentinel. An
    /// exactly full final page therefore costs one extra empty-page
    /// round trip; that termination rule matches the server's other
    /// consumers and must not change.
    async fn list_paginated<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut results: Vec<T> = Vec::new();
        loop {
            let query =
                [("limit", PAGE_LIMIT.to_string()), ("offset", results.len().to_string())];
            let page: Vec<T> = self.get_json(path, &query).await?;
            let last_page = page.len() < PAGE_LIMIT;
            results.extend(page);
            if last_page {
                break;
            }
        }
        Ok(results)
    }

    /// One bulk-export request; callers project their own collection
    /// out of the shared envelope.
    async fn dump(&self, scope: &str) -> Result<BackupData> {
        let query = [("output-data", "1".to_string()), ("scopes", scope.to_string())];
        self.get_json(DUMPDATA_PATH, &query).await
    }

    fn confidential_query(&self) -> Vec<(&'static str, String)> {
        match self.edition {
            Edition::Enterprise => vec![("confidential_data", "1".to_string())],
            Edition::Community => Vec::new(),
        }
    }
}

/// Percent-escape an identifier used as a URL path segment. Names may
/// contain `/` or spaces; sending them raw would corrupt the request
/// path.
fn escape(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
