use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::assets::loader::{load_image_list, Fetch};
use crate::assets::registry::AssetRegistry;
use crate::components::animation::AnimationDef;
use crate::components::sprite::Crop;
use crate::error::AssetError;

/// Asset manifest describing the images to preload and the named sprite
/// sheets cut from them. Loaded from a JSON file at runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Extra image paths to preload (sheet sources are loaded regardless).
    #[serde(default)]
    pub images: Vec<String>,
    /// Named sprite sheets.
    #[serde(default)]
    pub sheets: HashMap<String, SheetDescriptor>,
}

/// How to cut a sprite from one source image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetDescriptor {
    /// Path of the source image (the asset registry key).
    pub asset: String,
    /// Frame size; omitted means the whole cropped region is one frame.
    #[serde(default)]
    pub frame_width: Option<u32>,
    #[serde(default)]
    pub frame_height: Option<u32>,
    #[serde(default)]
    pub crop: Option<CropDescriptor>,
    /// Named frame sequences.
    #[serde(default)]
    pub animations: HashMap<String, AnimationDef>,
}

/// Source sub-rectangle; missing extents run to the image edge.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CropDescriptor {
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl From<CropDescriptor> for Crop {
    fn from(desc: CropDescriptor) -> Self {
        Crop {
            x: desc.x,
            y: desc.y,
            width: desc.width,
            height: desc.height,
        }
    }
}

impl AssetManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every image the manifest needs, deduplicated, in a stable order.
    pub fn image_paths(&self) -> Vec<String> {
        let mut paths: BTreeSet<&str> = self.images.iter().map(String::as_str).collect();
        paths.extend(self.sheets.values().map(|sheet| sheet.asset.as_str()));
        paths.into_iter().map(str::to_string).collect()
    }

    /// Load every image the manifest needs. See [`load_image_list`].
    pub fn preload<F, S, C>(&self, fetch: &F, registry: &AssetRegistry, step: S, callback: C)
    where
        F: Fetch + ?Sized,
        S: FnMut(&str, bool) + 'static,
        C: FnOnce(Result<(), AssetError>) + 'static,
    {
        let paths = self.image_paths();
        log::info!(
            "preloading {} image(s) for {} sheet(s)",
            paths.len(),
            self.sheets.len()
        );
        load_image_list(fetch, registry, &paths, step, callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::bitmap::tests::{encode_png, grid_sheet};
    use crate::assets::loader::tests::DeferredFetch;
    use std::cell::RefCell;
    use std::rc::Rc;

    const MANIFEST: &str = r#"{
        "images": ["bg.png", "hero.png"],
        "sheets": {
            "hero": {
                "asset": "hero.png",
                "frame_width": 16,
                "frame_height": 16,
                "animations": {
                    "walk": { "frames": [0, 1, 2, 1], "speed": 8 },
                    "idle": { "frames": [0] }
                }
            },
            "coin": {
                "asset": "items.png",
                "frame_width": 8,
                "frame_height": 8,
                "crop": { "x": 0, "y": 16 }
            }
        }
    }"#;

    #[test]
    fn parses_sheets_and_defaults() {
        let manifest = AssetManifest::from_json(MANIFEST).unwrap();
        let hero = &manifest.sheets["hero"];
        assert_eq!(hero.frame_width, Some(16));
        assert_eq!(hero.animations["walk"].frames, vec![0, 1, 2, 1]);
        assert_eq!(hero.animations["walk"].speed, 8.0);
        assert_eq!(hero.animations["idle"].speed, 1.0);

        let crop: Crop = manifest.sheets["coin"].crop.unwrap().into();
        assert_eq!(crop.y, 16);
        assert_eq!(crop.width, None);
    }

    #[test]
    fn image_paths_include_sheet_sources_once() {
        let manifest = AssetManifest::from_json(MANIFEST).unwrap();
        assert_eq!(manifest.image_paths(), vec!["bg.png", "hero.png", "items.png"]);
    }

    #[test]
    fn bad_json_is_a_manifest_error() {
        assert!(matches!(
            AssetManifest::from_json("{ \"sheets\": 3 }"),
            Err(AssetError::Manifest(_))
        ));
    }

    #[test]
    fn preload_fills_the_registry() {
        let png = encode_png(&grid_sheet(32, 32, 16));
        let fetch = DeferredFetch::default()
            .with_file("bg.png", png.clone())
            .with_file("hero.png", png.clone())
            .with_file("items.png", png);
        let reg = AssetRegistry::new();
        let done = Rc::new(RefCell::new(None));
        let seen = Rc::clone(&done);

        let manifest = AssetManifest::from_json(MANIFEST).unwrap();
        manifest.preload(&fetch, &reg, |_, _| {}, move |r| {
            *seen.borrow_mut() = Some(r.is_ok());
        });
        assert_eq!(fetch.pending(), 3);
        for path in ["items.png", "bg.png", "hero.png"] {
            fetch.resolve(path);
        }
        assert_eq!(*done.borrow(), Some(true));
        assert_eq!(reg.len(), 3);
    }
}
