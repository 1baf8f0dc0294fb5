//! Placed items: the single entity managed by the engine.
//!
//! A [`PlacedItem`] sits on the canvas at a [`Position`], has a [`Size`], and
//! holds a `depth` that is unique across all items at any instant. Writes come
//! in as a validated [`NewItem`] (create) or [`ItemPatch`] (partial update);
//! the wire forms accepted from clients live in [`request`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Timestamp;

pub mod errors;
pub mod request;

pub use errors::ItemError;
pub use request::{CreateItemRequest, UpdateItemRequest};

/// Opaque, immutable identifier assigned when an item is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ItemId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for ItemId {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ItemError::InvalidId {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Offsets on the canvas plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// Extent of an item; both dimensions are positive once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i64,
    pub height: i64,
}

/// An item stored on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedItem {
    pub id: ItemId,
    pub name: String,
    pub position: Position,
    /// Stacking key; no two stored items share a value.
    pub depth: i64,
    pub size: Size,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PlacedItem {
    /// Materialize a new item at `depth`, stamping both timestamps with `now`.
    pub fn from_new(id: ItemId, new: NewItem, depth: i64, now: Timestamp) -> Self {
        Self {
            id,
            name: new.name,
            position: new.position,
            depth,
            size: new.size,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overlay the present fields of `patch` onto this item.
    ///
    /// Absent fields keep their current value. `id` and `created_at` never
    /// change; `updated_at` always becomes `now`.
    pub fn merged(&self, patch: &ItemPatch, now: Timestamp) -> Self {
        Self {
            id: self.id,
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            position: Position {
                x: patch.x.unwrap_or(self.position.x),
                y: patch.y.unwrap_or(self.position.y),
            },
            depth: patch.depth.unwrap_or(self.depth),
            size: Size {
                width: patch.width.unwrap_or(self.size.width),
                height: patch.height.unwrap_or(self.size.height),
            },
            created_at: self.created_at,
            updated_at: now,
        }
    }

    /// Same item relocated to `depth`, all other fields untouched.
    pub fn at_depth(&self, depth: i64) -> Self {
        Self {
            depth,
            ..self.clone()
        }
    }
}

/// Validated input for creating an item.
///
/// `depth` is optional: when absent the engine places the item on top of the
/// current stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub position: Position,
    pub depth: Option<i64>,
    pub size: Size,
}

impl NewItem {
    /// Build a create input, rejecting non-positive dimensions.
    pub fn new(
        name: impl Into<String>,
        position: Position,
        size: Size,
    ) -> Result<Self, ItemError> {
        let item = Self {
            name: name.into(),
            position,
            depth: None,
            size,
        };
        item.validate()?;
        Ok(item)
    }

    /// Request an explicit target depth.
    pub fn with_depth(mut self, depth: i64) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Check invariants that cannot be expressed in the field types.
    pub fn validate(&self) -> Result<(), ItemError> {
        ensure_positive("width", self.size.width)?;
        ensure_positive("height", self.size.height)
    }
}

/// Partial update: every `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub depth: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl ItemPatch {
    /// Check that any supplied dimension is positive.
    pub fn validate(&self) -> Result<(), ItemError> {
        if let Some(width) = self.width {
            ensure_positive("width", width)?;
        }
        if let Some(height) = self.height {
            ensure_positive("height", height)?;
        }
        Ok(())
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn ensure_positive(field: &'static str, value: i64) -> Result<(), ItemError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ItemError::NonPositive { field, value })
    }
}
