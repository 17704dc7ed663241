//! Wire types of the storage node's HTTP API.
//!
//! Field names follow the node's PascalCase JSON convention. Only the
//! fields the proxy reads are modelled; unknown fields are ignored.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

pub const ADD_PATH: &str = "/api/v0/add";
pub const DAG_IMPORT_PATH: &str = "/api/v0/dag/import";
pub const PIN_LS_PATH: &str = "/api/v0/pin/ls";
pub const PIN_RM_PATH: &str = "/api/v0/pin/rm";

/// Key of the content id inside a dag-import root link (`{"/": "<cid>"}`).
pub const ROOT_CID_KEY: &str = "/";

/// Pin type reported for every key listed by the proxy.
pub const RECURSIVE_PIN_TYPE: &str = "recursive";

/// One message of an add response stream, emitted per uploaded file,
/// directory entry, and (if requested) the wrapping directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct AddResponseMessage {
    #[schema(example = "first.jpg")]
    pub name: String,
    #[schema(example = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG")]
    pub hash: String,
    /// Size in bytes, encoded as a decimal string by the node.
    #[schema(example = "1024")]
    pub size: String,
}

/// One message of a dag-import response stream. Exactly one of the two
/// fields is populated per message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct DagImportMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<RootMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<CarImportStats>,
}

/// Metadata for a root pinned by a dag import.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct RootMeta {
    /// IPLD link; the content id lives under the `"/"` key.
    pub cid: HashMap<String, String>,
    /// Non-empty when the node failed to pin this root.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pin_error_msg: String,
}

impl RootMeta {
    pub fn root_cid(&self) -> Option<&str> {
        self.cid.get(ROOT_CID_KEY).map(String::as_str)
    }
}

/// Aggregate statistics for a whole dag-import request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct CarImportStats {
    pub block_count: i64,
    pub block_bytes_count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PinInfo {
    #[serde(rename = "Type")]
    #[schema(example = "recursive")]
    pub pin_type: String,
}

impl PinInfo {
    pub fn recursive() -> Self {
        Self {
            pin_type: RECURSIVE_PIN_TYPE.to_string(),
        }
    }
}

/// Body of a pin listing, keyed by content id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PinLsResponse {
    pub keys: BTreeMap<String, PinInfo>,
}

/// Body of a successful pin removal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PinRmResponse {
    pub pins: Vec<String>,
}
