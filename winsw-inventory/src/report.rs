use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use winsw_registry::SoftwareRecord;

#[derive(Serialize)]
pub struct Report {
    pub metadata: Metadata,
    pub software: Vec<SoftwareRecord>,
}

#[derive(Serialize)]
pub struct Metadata {
    // Provided by the user to map the report to a host, falls back to the hostname
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    pub record_count: usize,
    /// Hex SHA-256 of the serialized `software` list.
    pub digest: String,
}

impl Report {
    pub fn new(
        id: String,
        os_version: Option<String>,
        software: Vec<SoftwareRecord>,
    ) -> serde_json::Result<Self> {
        Ok(Report {
            metadata: Metadata {
                id,
                timestamp: Utc::now(),
                os_version,
                record_count: software.len(),
                digest: digest(&software)?,
            },
            software,
        })
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

fn digest(software: &[SoftwareRecord]) -> serde_json::Result<String> {
    let bytes = serde_json::to_vec(software)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
