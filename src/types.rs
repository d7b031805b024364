//! Wire-format entity records
//!
//! These structs mirror the resource shapes of the management API. The
//! client treats them as opaque apart from the name/username fields
//! used to build URL paths; deep sub-objects it never interprets
//! (filesystem configs, filters, event options) stay as raw JSON
//! values. Optional fields are omitted from request bodies rather than
//! sent as null.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An SFTPGo user account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub id: i64,
    /// 1 enabled, 0 disabled
    #[serde(default)]
    pub status: i32,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Account expiration as milliseconds since epoch, 0 for none
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub expiration_date: i64,
    /// Plain text on create/update, hashed or absent on reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub home_dir: String,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub uid: i32,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub gid: i32,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub max_sessions: i32,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub quota_size: i64,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub quota_files: i32,
    /// Directory path -> granted permissions
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub permissions: HashMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub used_quota_size: i64,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub used_quota_files: i32,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub last_login: i64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub upload_bandwidth: i64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub download_bandwidth: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub virtual_folders: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<Value>,
}

/// Membership of a user in a group, with the group's role for the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMapping {
    pub name: String,
    /// 1 primary, 2 secondary, 3 membership only
    #[serde(rename = "type", default)]
    pub group_type: i32,
}

/// An SFTPGo administrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub id: i64,
    #[serde(default)]
    pub status: i32,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub additional_info: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub last_login: i64,
}

/// A group of settings applied to the users that belong to it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_settings: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub virtual_folders: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admins: Vec<String>,
}

/// A folder that can be mounted into user accounts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mapped_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub used_quota_size: i64,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub used_quota_files: i32,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub last_quota_update: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<Value>,
}

/// A role restricting what its members can see and do
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admins: Vec<String>,
}

/// An action executed by event rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventAction {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Action type discriminant (HTTP, command, email, ...)
    #[serde(rename = "type", default)]
    pub action_type: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

/// A rule binding trigger conditions to ordered actions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRule {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Trigger discriminant (filesystem event, schedule, ...)
    #[serde(default)]
    pub trigger: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Value>,
}

/// Server license state (meaningful on Enterprise deployments)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licensee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

/// Envelope returned by the bulk-export endpoint.
///
/// One response carries every requested collection; list operations
/// backed by the export decode this envelope once and project their
/// own slice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub admins: Vec<Admin>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub event_actions: Vec<EventAction>,
    #[serde(default)]
    pub event_rules: Vec<EventRule>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_omits_empty_optional_fields() {
        let user = User { username: "alice".to_string(), status: 1, ..Default::default() };

        let value = serde_json::to_value(&user).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.get("username").unwrap(), "alice");
        // Absent, not null
        assert!(!object.contains_key("email"));
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("public_keys"));
        assert!(!object.contains_key("filesystem"));
    }

    #[test]
    fn user_round_trips_permissions() {
        let json = r#"{
            "username": "bob",
            "status": 1,
            "home_dir": "/srv/sftpgo/bob",
            "permissions": {"/": ["*"], "/upload": ["upload", "list"]}
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.permissions["/"], vec!["*"]);
        assert_eq!(user.permissions["/upload"].len(), 2);
    }

    #[test]
    fn group_mapping_uses_wire_field_name() {
        let mapping = GroupMapping { name: "staff".to_string(), group_type: 1 };
        let value = serde_json::to_value(&mapping).unwrap();

        assert_eq!(value.as_object().unwrap().get("type").unwrap(), 1);
    }

    #[test]
    fn backup_envelope_defaults_missing_collections() {
        let data: BackupData =
            serde_json::from_str(r#"{"users": [{"username": "u1"}]}"#).unwrap();

        assert_eq!(data.users.len(), 1);
        assert!(data.roles.is_empty());
        assert!(data.event_rules.is_empty());
    }
}
