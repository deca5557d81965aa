pub mod costume;
pub mod snapshot;
#[allow(clippy::module_inception)]
pub mod sprite;
pub mod stage;

pub use costume::{Costume, PendingCostume};
pub use snapshot::{CostumeRef, SpriteSnapshot, StageSnapshot};
pub use sprite::{Appearance, GlideHandle, GlideOutcome, Sprite, SpriteId, SpriteOptions};
pub use stage::{Stage, StageHandle};
