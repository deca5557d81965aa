//! Plain serializable form of the stage.

use serde::{Deserialize, Serialize};

fn default_background() -> String {
    "#ffffff".to_string()
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageSnapshot {
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default)]
    pub sprites: Vec<SpriteSnapshot>,
}

impl Default for StageSnapshot {
    fn default() -> Self {
        Self {
            background_color: default_background(),
            sprites: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpriteSnapshot {
    /// Kept as text so ids that are not uuids still load; those get a fresh id.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default)]
    pub draggable: bool,
    #[serde(default, rename = "defaultEmoji")]
    pub glyph: Option<String>,
    #[serde(default)]
    pub current_costume_index: Option<usize>,
    #[serde(default)]
    pub costumes: Vec<CostumeRef>,
}

/// A costume by source reference; pixels are reloaded on restore.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CostumeRef {
    pub name: String,
    pub src: String,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}
