//! Reference directories (series, room counts, repair, documents, heating,
//! furniture, districts)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use estate_gateway::{ApiRequest, Gateway};

use crate::call::{execute, fetch, segment};
use crate::error::ApiError;
use crate::Result;

const DIRECTORIES_PATH: &str = "/references";

/// Directory kinds, serialized with the slugs the API routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectoryKind {
    #[serde(rename = "series")]
    Series,
    #[serde(rename = "roomcount")]
    RoomCount,
    #[serde(rename = "renovationtype")]
    Renovation,
    #[serde(rename = "document")]
    Document,
    #[serde(rename = "heatingtype", alias = "heating")]
    Heating,
    #[serde(rename = "furnituretype")]
    Furniture,
    #[serde(rename = "district")]
    District,
}

impl DirectoryKind {
    pub fn all() -> [DirectoryKind; 7] {
        [
            DirectoryKind::Series,
            DirectoryKind::RoomCount,
            DirectoryKind::Renovation,
            DirectoryKind::Document,
            DirectoryKind::Heating,
            DirectoryKind::Furniture,
            DirectoryKind::District,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryKind::Series => "series",
            DirectoryKind::RoomCount => "roomcount",
            DirectoryKind::Renovation => "renovationtype",
            DirectoryKind::Document => "document",
            DirectoryKind::Heating => "heatingtype",
            DirectoryKind::Furniture => "furnituretype",
            DirectoryKind::District => "district",
        }
    }
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectoryKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("heating") {
            return Ok(DirectoryKind::Heating);
        }
        DirectoryKind::all()
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ApiError::Invalid(format!("unknown directory: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DirectoryKind,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct DirectoriesApi {
    gateway: Gateway,
}

impl DirectoriesApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Entries of one directory, or of all of them when `kind` is `None`.
    pub async fn list(&self, kind: Option<DirectoryKind>) -> Result<Vec<Directory>> {
        let path = match kind {
            Some(kind) => format!("{}/{}", DIRECTORIES_PATH, kind),
            None => format!("{}/", DIRECTORIES_PATH),
        };
        fetch(&self.gateway, ApiRequest::get(path)).await
    }

    pub async fn create(&self, kind: DirectoryKind, name: &str) -> Result<Directory> {
        let name = required_name(name)?;
        let request = ApiRequest::post(format!("{}/{}", DIRECTORIES_PATH, kind))
            .with_json(json!({ "name": name }));
        let entry: Directory = fetch(&self.gateway, request).await?;

        tracing::info!(kind = %kind, entry_id = %entry.id, "Created directory entry");
        Ok(entry)
    }

    pub async fn update(&self, kind: DirectoryKind, id: &str, name: &str) -> Result<Directory> {
        let name = required_name(name)?;
        let path = format!("{}/{}/{}", DIRECTORIES_PATH, kind, segment(id)?);
        fetch(&self.gateway, ApiRequest::patch(path).with_json(json!({ "name": name }))).await
    }

    pub async fn delete(&self, kind: DirectoryKind, id: &str) -> Result<()> {
        let path = format!("{}/{}/{}", DIRECTORIES_PATH, kind, segment(id)?);
        execute(&self.gateway, ApiRequest::delete(path)).await?;

        tracing::info!(kind = %kind, entry_id = %id, "Deleted directory entry");
        Ok(())
    }
}

fn required_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Invalid("name is required".to_string()));
    }
    Ok(name)
}
