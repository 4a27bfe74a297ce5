//! Context item types shared by the store, the index and the query surface.

use crate::error::ItemError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single selectable context item supplied by a provider.
///
/// Items are value-equal by `id` within their provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique within the owning provider (usually an absolute path or URI)
    pub id: String,
    /// Primary display and match field
    pub title: String,
    /// Secondary match field, often a workspace-relative path
    pub description: String,
    /// Tag of the owning provider
    pub provider_title: String,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        provider_title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            provider_title: provider_title.into(),
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.provider_title == other.provider_title && self.id == other.id
    }
}

impl Eq for Item {}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{} [{}]", self.title, self.provider_title)
        } else {
            write!(
                f,
                "{}  {} [{}]",
                self.title, self.description, self.provider_title
            )
        }
    }
}

/// An item record as delivered by the host, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub provider_title: Option<String>,
}

impl RawItem {
    /// Validates the record, filling `provider_title` from the provider being loaded
    /// when the host omitted it.
    pub fn into_item(self, provider: &str) -> Result<Item, ItemError> {
        let id = self.id.filter(|id| !id.trim().is_empty()).ok_or(
            ItemError::Malformed {
                field: "id",
                id: None,
            },
        )?;
        let title = match self.title.filter(|title| !title.trim().is_empty()) {
            Some(title) => title,
            None => {
                return Err(ItemError::Malformed {
                    field: "title",
                    id: Some(id),
                });
            }
        };

        Ok(Item {
            id,
            title,
            description: self.description.unwrap_or_default(),
            provider_title: self
                .provider_title
                .unwrap_or_else(|| provider.to_string()),
        })
    }
}

impl From<Item> for RawItem {
    fn from(item: Item) -> Self {
        Self {
            id: Some(item.id),
            title: Some(item.title),
            description: Some(item.description),
            provider_title: Some(item.provider_title),
        }
    }
}
