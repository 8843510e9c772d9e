pub mod api;
pub mod assets;
pub mod components;
pub mod core;
pub mod error;
pub mod input;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::context::{Frame, StageContext, UpdateContext};
pub use api::game::{Game, GameConfig};
pub use api::types::{Color, ColorParseError, EntityId, GameId};
pub use assets::bitmap::Bitmap;
pub use assets::loader::{load_image, load_image_list, Fetch, FetchCallback, FileFetch};
pub use assets::manifest::{AssetManifest, CropDescriptor, SheetDescriptor};
pub use assets::registry::{AssetRegistry, SheetRegistry};
pub use components::animation::{Animation, AnimationDef};
pub use components::entity::{Entity, EntityBehavior};
pub use components::sprite::{Crop, Sprite};
pub use crate::core::collision::{Hitbox, Rect};
pub use crate::core::stage::{Stage, StageBehavior};
pub use crate::core::time::FrameClock;
pub use error::AssetError;
pub use input::queue::{InputEvent, InputQueue};
pub use input::state::{InputState, KeyState};
pub use renderer::draw_list::{DrawCommand, DrawList};
pub use renderer::traits::Surface;
pub use systems::debug::draw_hitboxes;
pub use systems::render::{draw_frame, Placement};

pub use glam::Vec2;
