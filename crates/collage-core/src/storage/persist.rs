//! Mirrors editor state into three string slots.

use super::{SlotStorage, StorageError, StorageResult};
use crate::catalog::FontFamily;
use crate::color::HexColor;
use crate::item::{Item, ItemId, ItemKind};
use crate::state::CanvasBackground;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Keys of the three persisted slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotKeys {
    /// JSON array of item records.
    pub items: String,
    /// Background image data URI.
    pub background_image: String,
    /// Background color as `#rrggbb`.
    pub background_color: String,
}

impl Default for SlotKeys {
    fn default() -> Self {
        Self {
            items: "collage-items".to_string(),
            background_image: "collage-bg-image".to_string(),
            background_color: "collage-bg-color".to_string(),
        }
    }
}

fn default_opacity() -> f64 {
    1.0
}

fn default_white() -> HexColor {
    HexColor::WHITE
}

/// On-disk form of an [`Item`].
///
/// Fields that carry no information for the item's kind are left out:
/// images have no `color`, only text has a `font_family`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub content: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_white")]
    pub bg_color: HexColor,
    #[serde(default = "default_opacity")]
    pub bg_opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,
}

impl From<&Item> for StoredItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            kind: item.kind,
            content: item.content.clone(),
            x: item.position.x,
            y: item.position.y,
            size: item.size,
            angle: item.angle,
            color: (item.kind != ItemKind::Image).then_some(item.color),
            opacity: item.opacity,
            bg_color: item.background_color,
            bg_opacity: item.background_opacity,
            font_family: item.is_text().then_some(item.font_family),
        }
    }
}

impl From<StoredItem> for Item {
    fn from(stored: StoredItem) -> Self {
        let mut item = Item::new(stored.id, stored.kind, stored.content);
        item.position = Point::new(stored.x, stored.y);
        item.size = stored.size.max(Item::MIN_SIZE);
        item.angle = stored.angle;
        item.color = stored.color.unwrap_or(HexColor::BLACK);
        item.opacity = stored.opacity.clamp(0.0, 1.0);
        item.background_color = stored.bg_color;
        item.background_opacity = stored.bg_opacity.clamp(0.0, 1.0);
        item.font_family = stored.font_family.unwrap_or_default();
        item
    }
}

/// What was recovered from storage at session start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restored {
    pub items: Vec<Item>,
    pub background: CanvasBackground,
}

/// Reads and writes editor state through a [`SlotStorage`].
pub struct Persistence<S> {
    storage: S,
    keys: SlotKeys,
}

impl<S: SlotStorage> Persistence<S> {
    pub fn new(storage: S) -> Self {
        Self::with_keys(storage, SlotKeys::default())
    }

    pub fn with_keys(storage: S, keys: SlotKeys) -> Self {
        Self { storage, keys }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn keys(&self) -> &SlotKeys {
        &self.keys
    }

    /// Load the item slot. A missing slot is an empty canvas.
    pub fn load_items(&self) -> StorageResult<Vec<Item>> {
        let Some(json) = self.storage.read(&self.keys.items)? else {
            return Ok(Vec::new());
        };
        let stored: Vec<StoredItem> =
            serde_json::from_str(&json).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut items: Vec<Item> = Vec::with_capacity(stored.len());
        for record in stored {
            if items.iter().any(|item| item.id == record.id) {
                log::warn!("Dropping stored item with duplicate id {}", record.id);
                continue;
            }
            items.push(record.into());
        }
        Ok(items)
    }

    /// Load both background slots.
    pub fn load_background(&self) -> StorageResult<CanvasBackground> {
        let color = match self.storage.read(&self.keys.background_color)? {
            Some(hex) => hex
                .trim()
                .parse()
                .map_err(|e| StorageError::Serialization(format!("{}", e)))?,
            None => HexColor::WHITE,
        };
        let image = self
            .storage
            .read(&self.keys.background_image)?
            .filter(|uri| !uri.is_empty());
        Ok(CanvasBackground { color, image })
    }

    /// Load everything, replacing unreadable slots with defaults.
    pub fn restore(&self) -> Restored {
        let items = self.load_items().unwrap_or_else(|e| {
            log::warn!("Failed to restore items: {}", e);
            Vec::new()
        });
        let background = self.load_background().unwrap_or_else(|e| {
            log::warn!("Failed to restore background: {}", e);
            CanvasBackground::default()
        });
        log::info!("Restored {} item(s) from storage", items.len());
        Restored { items, background }
    }

    pub fn save_items(&self, items: &[Item]) -> StorageResult<()> {
        let stored: Vec<StoredItem> = items.iter().map(StoredItem::from).collect();
        let json =
            serde_json::to_string(&stored).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.write(&self.keys.items, &json)
    }

    /// Write the background color and image. A cleared image removes its slot.
    pub fn save_background(&self, background: &CanvasBackground) -> StorageResult<()> {
        self.storage
            .write(&self.keys.background_color, &background.color.to_string())?;
        match &background.image {
            Some(uri) => self.storage.write(&self.keys.background_image, uri),
            None => self.storage.remove(&self.keys.background_image),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn sample_items() -> Vec<Item> {
        let mut text = Item::new(ItemId(1), ItemKind::Text, "hello");
        text.font_family = FontFamily::Jua;
        text.color = HexColor::new(0x12, 0x34, 0x56);
        let emoji = Item::new(ItemId(2), ItemKind::Emoji, "🎉").at(Point::new(10.0, 20.0));
        let mut image = Item::new(ItemId(3), ItemKind::Image, "data:image/png;base64,AAAA");
        image.angle = 30.0;
        vec![text, emoji, image]
    }

    #[test]
    fn test_items_round_trip() {
        let persistence = Persistence::new(MemoryStorage::new());
        let items = sample_items();
        persistence.save_items(&items).unwrap();
        assert_eq!(persistence.load_items().unwrap(), items);
    }

    #[test]
    fn test_redundant_fields_omitted() {
        let persistence = Persistence::new(MemoryStorage::new());
        persistence.save_items(&sample_items()).unwrap();

        let json = persistence.storage().read("collage-items").unwrap().unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(records[0]["font_family"], "jua");
        assert!(records[1].get("font_family").is_none());
        assert!(records[2].get("color").is_none());
        assert!(records[2].get("font_family").is_none());
        assert_eq!(records[1]["type"], "emoji");
        assert_eq!(records[1]["x"], 10.0);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let storage = MemoryStorage::new();
        storage
            .write("collage-items", r#"[{"id":5,"type":"image","x":1,"y":2,"size":50}]"#)
            .unwrap();
        let items = Persistence::new(storage).load_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].color, HexColor::BLACK);
        assert_eq!(items[0].opacity, 1.0);
        assert_eq!(items[0].background_color, HexColor::WHITE);
        assert_eq!(items[0].content, "");
    }

    #[test]
    fn test_corrupt_slots_restore_empty() {
        let storage = MemoryStorage::new();
        storage.write("collage-items", "{not json").unwrap();
        storage.write("collage-bg-color", "blue").unwrap();
        let restored = Persistence::new(storage).restore();
        assert_eq!(restored, Restored::default());
    }

    #[test]
    fn test_duplicate_stored_ids_dropped() {
        let storage = MemoryStorage::new();
        storage
            .write(
                "collage-items",
                r#"[{"id":1,"type":"text","content":"a","x":0,"y":0,"size":24},
                    {"id":1,"type":"text","content":"b","x":0,"y":0,"size":24}]"#,
            )
            .unwrap();
        let items = Persistence::new(storage).load_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "a");
    }

    #[test]
    fn test_background_round_trip_and_clear() {
        let persistence = Persistence::new(MemoryStorage::new());
        let background = CanvasBackground {
            color: HexColor::new(0, 0x80, 0xff),
            image: Some("data:image/png;base64,AAAA".to_string()),
        };
        persistence.save_background(&background).unwrap();
        assert_eq!(persistence.load_background().unwrap(), background);

        let cleared = CanvasBackground {
            image: None,
            ..background
        };
        persistence.save_background(&cleared).unwrap();
        assert_eq!(persistence.storage().read("collage-bg-image").unwrap(), None);
        assert_eq!(persistence.load_background().unwrap(), cleared);
    }

    #[test]
    fn test_custom_keys() {
        let keys = SlotKeys {
            items: "i".into(),
            background_image: "bi".into(),
            background_color: "bc".into(),
        };
        let persistence = Persistence::with_keys(MemoryStorage::new(), keys);
        persistence.save_items(&sample_items()).unwrap();
        assert!(persistence.storage().read("i").unwrap().is_some());
        assert!(persistence.storage().read("collage-items").unwrap().is_none());
    }
}
