//! # sftpgo-client
//!
//! Typed async client for the SFTPGo management REST API, built for
//! infrastructure-as-code tooling that declares and reconciles server
//! state (users, admins, groups, folders, roles, event rules/actions,
//! licensing).
//!
//! The interesting parts live in three places:
//! - [`auth`]: credential sum type and bearer-token lifecycle with an
//!   expiry safety margin, guarded by a reader/writer lock
//! - [`http`]: request execution with auth-header injection and
//!   expected-status enforcement
//! - [`retry`]: bounded exponential backoff with jitter, applied only
//!   to errors classified as transient backend contention
//!
//! Everything else is a mechanical mapping between typed structs and
//! the API's JSON resource shapes.
//!
//! ## Example
//! ```no_run
//! use sftpgo_client::{ClientConfig, Credentials, SftpgoClient};
//!
//! # async fn example() -> sftpgo_client::Result<()> {
//! let config = ClientConfig::builder("https://sftpgo.example.com:8080").build();
//! let credentials = Credentials::Password {
//!     username: "admin".to_string(),
//!     password: "password".to_string(),
//! };
//! let client = SftpgoClient::new(config, credentials)?;
//!
//! for user in client.get_users().await? {
//!     println!("{}", user.username);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
mod http;
pub mod retry;
pub mod types;

pub use auth::Credentials;
pub use client::SftpgoClient;
pub use config::{ClientConfig, ClientConfigBuilder, Edition, KeyValue};
pub use error::{ClientError, Result};
pub use retry::RetryPolicy;
pub use types::{
    Admin, BackupData, EventAction, EventRule, Folder, Group, GroupMapping, License, Role, User,
};
