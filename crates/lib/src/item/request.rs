//! Wire forms of create/update requests.
//!
//! Every field is optional at the serde level so that a missing field is
//! reported as an [`ItemError::MissingField`] rather than an opaque decode
//! failure. Identifiers and timestamps are never accepted from clients.

use serde::{Deserialize, Serialize};

use super::{ItemError, ItemPatch, NewItem, Position, Size};

/// Body of a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: Option<String>,
    pub position_x: Option<i64>,
    pub position_y: Option<i64>,
    pub depth: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl CreateItemRequest {
    /// Check required fields and convert into a [`NewItem`].
    pub fn validate(self) -> Result<NewItem, ItemError> {
        let name = required("name", self.name)?;
        let x = required("positionX", self.position_x)?;
        let y = required("positionY", self.position_y)?;
        let width = required("width", self.width)?;
        let height = required("height", self.height)?;

        let new = NewItem::new(name, Position { x, y }, Size { width, height })?;
        Ok(match self.depth {
            Some(depth) => new.with_depth(depth),
            None => new,
        })
    }
}

/// Body of a partial update request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub position_x: Option<i64>,
    pub position_y: Option<i64>,
    pub depth: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl UpdateItemRequest {
    /// Convert into a validated [`ItemPatch`].
    pub fn validate(self) -> Result<ItemPatch, ItemError> {
        let patch = ItemPatch {
            name: self.name,
            x: self.position_x,
            y: self.position_y,
            depth: self.depth,
            width: self.width,
            height: self.height,
        };
        patch.validate()?;
        Ok(patch)
    }
}

fn required<T>(field: &'static str, value: Option<T>) -> Result<T, ItemError> {
    value.ok_or(ItemError::MissingField { field })
}
