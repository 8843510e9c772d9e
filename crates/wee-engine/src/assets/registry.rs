use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::assets::bitmap::Bitmap;
use crate::assets::manifest::{AssetManifest, SheetDescriptor};
use crate::components::animation::AnimationDef;
use crate::components::sprite::{Crop, Sprite};
use crate::error::AssetError;

/// How a source image was cut into frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FrameKey {
    source: u64,
    crop: Crop,
    frame_width: Option<u32>,
    frame_height: Option<u32>,
}

/// Decoded images keyed by the path they were loaded from.
///
/// Cloning the registry clones the handle, not the images: loaders running
/// in the background and the game that renders sprites share one map.
/// Several sprites may slice the same source without decoding it twice,
/// and sprites cut the same way share one set of frame bitmaps, so a
/// backend caching uploads by bitmap id sees each frame once.
#[derive(Clone, Default)]
pub struct AssetRegistry {
    images: Rc<RefCell<HashMap<String, Rc<Bitmap>>>>,
    frames: Rc<RefCell<HashMap<FrameKey, Rc<[Bitmap]>>>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a decoded image under `path`, replacing any previous one.
    pub fn insert(&self, path: &str, bitmap: Bitmap) -> Rc<Bitmap> {
        let bitmap = Rc::new(bitmap);
        let old = self
            .images
            .borrow_mut()
            .insert(path.to_string(), Rc::clone(&bitmap));
        if let Some(old) = old {
            self.forget_frames(old.id());
        }
        bitmap
    }

    /// The image previously loaded from `path`. Returns None if never loaded.
    pub fn get_asset(&self, path: &str) -> Option<Rc<Bitmap>> {
        self.images.borrow().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.images.borrow().contains_key(path)
    }

    pub fn remove(&self, path: &str) -> Option<Rc<Bitmap>> {
        let old = self.images.borrow_mut().remove(path);
        if let Some(old) = &old {
            self.forget_frames(old.id());
        }
        old
    }

    pub fn len(&self) -> usize {
        self.images.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.images.borrow_mut().clear();
        self.frames.borrow_mut().clear();
    }

    /// Frames of `path` cut by `crop` into a row-major grid of
    /// `frame_width x frame_height` cells. A `None` dimension spans the
    /// whole cropped region on that axis.
    ///
    /// The first request for a given cut slices the image; later ones
    /// return the same bitmaps.
    pub fn frames(
        &self,
        path: &str,
        crop: Crop,
        frame_width: Option<u32>,
        frame_height: Option<u32>,
    ) -> Result<Rc<[Bitmap]>, AssetError> {
        let source = self
            .get_asset(path)
            .ok_or_else(|| AssetError::MissingAsset(path.to_string()))?;
        let key = FrameKey {
            source: source.id(),
            crop,
            frame_width,
            frame_height,
        };
        if let Some(frames) = self.frames.borrow().get(&key) {
            return Ok(Rc::clone(frames));
        }

        let region = source
            .crop(
                crop.x,
                crop.y,
                crop.width.unwrap_or(u32::MAX),
                crop.height.unwrap_or(u32::MAX),
            )
            .ok_or_else(|| AssetError::EmptyCrop {
                path: path.to_string(),
            })?;
        let width = frame_width.unwrap_or(region.width());
        let height = frame_height.unwrap_or(region.height());
        let frames: Rc<[Bitmap]> = region.slice_grid(width, height).into();
        if frames.is_empty() {
            log::warn!(
                "{}: {}x{} frames do not fit in a {}x{} region",
                path,
                width,
                height,
                region.width(),
                region.height()
            );
        } else {
            log::debug!("{}: sliced {} frame(s)", path, frames.len());
        }
        self.frames.borrow_mut().insert(key, Rc::clone(&frames));
        Ok(frames)
    }

    /// Number of distinct cuts currently cached.
    pub fn cached_cuts(&self) -> usize {
        self.frames.borrow().len()
    }

    fn forget_frames(&self, source: u64) {
        self.frames.borrow_mut().retain(|key, _| key.source != source);
    }
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let images = self.images.borrow();
        let mut keys: Vec<&String> = images.keys().collect();
        keys.sort();
        f.debug_struct("AssetRegistry").field("images", &keys).finish()
    }
}

/// Named sprite sheets, built from an [`AssetManifest`].
/// Hands out fresh, unloaded sprites by name for game code.
#[derive(Debug, Clone, Default)]
pub struct SheetRegistry {
    sheets: HashMap<String, SheetDescriptor>,
}

impl SheetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifest(manifest: &AssetManifest) -> Self {
        Self {
            sheets: manifest.sheets.clone(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, sheet: SheetDescriptor) {
        self.sheets.insert(name.into(), sheet);
    }

    pub fn get(&self, name: &str) -> Option<&SheetDescriptor> {
        self.sheets.get(name)
    }

    /// A new sprite cut the way sheet `name` describes. Returns None if
    /// the sheet is unknown. The sprite finishes loading on first render.
    pub fn sprite(&self, name: &str) -> Option<Sprite> {
        let sheet = self.sheets.get(name)?;
        let mut sprite =
            Sprite::whole(&sheet.asset).with_frame_size(sheet.frame_width, sheet.frame_height);
        if let Some(crop) = sheet.crop {
            sprite = sprite.with_crop(crop.into());
        }
        Some(sprite)
    }

    /// Named animation `animation` of sheet `sheet`.
    pub fn animation(&self, sheet: &str, animation: &str) -> Option<&AnimationDef> {
        self.sheets.get(sheet)?.animations.get(animation)
    }

    /// Start the named animation on `sprite`. Returns false if it is unknown
    /// or was already playing (see [`Sprite::play`]).
    pub fn play(&self, sprite: &mut Sprite, sheet: &str, animation: &str, force: bool) -> bool {
        match self.animation(sheet, animation) {
            Some(def) => sprite.play(&def.frames, def.speed, force),
            None => {
                log::debug!("unknown animation {}/{}", sheet, animation);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
