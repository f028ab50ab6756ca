//! Device notifications and blobs.

use serde::{Deserialize, Serialize};

use crate::security::Key;

/// Description of the device that generated a set of keys.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceMetadata {
    /// Application name.
    #[serde(default)]
    pub application: String,
    /// Application version.
    #[serde(default)]
    pub application_version: String,
    /// Device name (e.g. `"Alice's phone"`).
    #[serde(default)]
    pub device: String,
}

/// Request to approve keys generated on a new device.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct AddKey {
    /// Keys awaiting approval.
    pub keys: Vec<Key>,
    /// Where the keys come from.
    #[serde(default)]
    pub device_metadata: DeviceMetadata,
}

/// Body of a notification sent to a member's devices.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotifyBody {
    /// Ask the member to approve new keys.
    AddKey(AddKey),
}

/// Delivery status of a notification.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyStatus {
    /// Unset.
    #[default]
    Invalid,
    /// Delivered to at least one device.
    Accepted,
    /// No device was subscribed.
    NoSubscribers,
}

/// Who may read a blob.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessMode {
    /// Only the owner and parties to tokens referencing it.
    #[default]
    Default,
    /// Anyone with the id.
    Public,
}

/// Content of a blob.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BlobPayload {
    /// Owning member.
    pub owner_id: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub content_type: String,
    /// File name.
    #[serde(default)]
    pub name: String,
    /// Base64-encoded data.
    pub data: String,
    /// Access mode.
    #[serde(default)]
    pub access_mode: AccessMode,
}

/// A stored file (e.g. an attachment).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    /// Blob id.
    pub id: String,
    /// Content.
    pub payload: BlobPayload,
}
