use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlCanvasElement};
use wee_engine::{
    load_image_list, AssetError, AssetManifest, AssetRegistry, Game, GameConfig, SheetRegistry,
};

use crate::canvas::CanvasSurface;
use crate::fetch::WebFetch;
use crate::keyboard::KeyboardListener;

type FrameCallback = Closure<dyn FnMut(f64)>;

/// Owns a [`Game`] mounted on a page canvas and keeps it running.
///
/// `mount` creates the canvas, wires the keyboard and starts the
/// `requestAnimationFrame` loop; the loop runs for the rest of the page's
/// life. Each concrete game keeps its runner in a `thread_local!` (see
/// [`export_game!`](crate::export_game)), because wasm-bindgen cannot export
/// generic structs directly.
pub struct GameRunner {
    game: Rc<RefCell<Game<CanvasSurface>>>,
    fetch: WebFetch,
    sheets: Rc<RefCell<SheetRegistry>>,
    _keyboard: KeyboardListener,
    _frame: Rc<RefCell<Option<FrameCallback>>>,
}

impl GameRunner {
    /// Create a `width x height` canvas under the element matching
    /// `parent_selector` (or `<body>`), and start the game loop.
    pub fn mount(config: GameConfig, parent_selector: Option<&str>) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        canvas.set_width(config.width);
        canvas.set_height(config.height);

        let parent: Element = match parent_selector {
            Some(selector) => document
                .query_selector(selector)?
                .ok_or_else(|| JsValue::from_str(&format!("no element matches {}", selector)))?,
            None => document
                .body()
                .ok_or_else(|| JsValue::from_str("document has no body"))?
                .into(),
        };
        parent.append_child(&canvas)?;

        let surface = CanvasSurface::new(canvas)?;
        let game = Rc::new(RefCell::new(Game::new(config, surface)));
        let keyboard = KeyboardListener::attach(&game)?;
        let frame = start_loop(Rc::clone(&game))?;

        Ok(Self {
            game,
            fetch: WebFetch::default(),
            sheets: Rc::new(RefCell::new(SheetRegistry::new())),
            _keyboard: keyboard,
            _frame: frame,
        })
    }

    /// Resolve asset paths against `base` instead of the page URL.
    pub fn with_asset_base(mut self, base: impl Into<String>) -> Self {
        self.fetch = WebFetch::new(base);
        self
    }

    /// Run `f` with the game borrowed mutably.
    ///
    /// # Panics
    /// If called from inside a tick (game logic has no runner access, so
    /// this only happens through a re-entrant host callback).
    pub fn with_game<R>(&self, f: impl FnOnce(&mut Game<CanvasSurface>) -> R) -> R {
        f(&mut self.game.borrow_mut())
    }

    /// Handle to the game's asset registry.
    pub fn assets(&self) -> AssetRegistry {
        self.game.borrow().assets().clone()
    }

    pub fn fetch(&self) -> &WebFetch {
        &self.fetch
    }

    /// Sprite sheets from every manifest loaded so far.
    pub fn sheets(&self) -> SheetRegistry {
        self.sheets.borrow().clone()
    }

    /// Start loading `paths` into the game's registry.
    /// See [`load_image_list`] for callback semantics.
    pub fn preload<S, C>(&self, paths: &[&str], step: S, callback: C)
    where
        S: FnMut(&str, bool) + 'static,
        C: FnOnce(Result<(), AssetError>) + 'static,
    {
        load_image_list(&self.fetch, &self.assets(), paths, step, callback);
    }

    /// Parse a manifest, register its sheets and preload its images.
    /// Sprites built from its sheets draw as soon as their image arrives.
    pub fn load_manifest(&self, json: &str) -> Result<(), AssetError> {
        let manifest = AssetManifest::from_json(json)?;
        {
            let mut sheets = self.sheets.borrow_mut();
            for (name, sheet) in &manifest.sheets {
                sheets.insert(name.clone(), sheet.clone());
            }
        }
        manifest.preload(
            &self.fetch,
            &self.assets(),
            |path, ok| log::debug!("{} {}", if ok { "loaded" } else { "failed" }, path),
            |result| match result {
                Ok(()) => log::info!("manifest assets loaded"),
                Err(e) => log::warn!("{}", e),
            },
        );
        Ok(())
    }
}

fn request_frame(callback: &FrameCallback) -> Result<i32, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    window.request_animation_frame(callback.as_ref().unchecked_ref())
}

/// Self-rearming `requestAnimationFrame` loop: every callback ticks the game
/// once and schedules the next one. The callback holds its own slot, so it
/// lives as long as the page.
fn start_loop(
    game: Rc<RefCell<Game<CanvasSurface>>>,
) -> Result<Rc<RefCell<Option<FrameCallback>>>, JsValue> {
    let slot: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    let rearm = Rc::clone(&slot);

    *slot.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |now: f64| {
        match game.try_borrow_mut() {
            Ok(mut game) => game.tick(now),
            Err(_) => log::warn!("frame skipped: game busy"),
        }
        if let Some(callback) = rearm.borrow().as_ref() {
            if let Err(e) = request_frame(callback) {
                log::error!("requestAnimationFrame failed, loop stopped: {:?}", e);
            }
        }
    }));

    if let Some(callback) = slot.borrow().as_ref() {
        request_frame(callback)?;
    }
    log::info!("frame loop started");
    Ok(slot)
}
