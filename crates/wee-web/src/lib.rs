pub mod canvas;
pub mod fetch;
pub mod keyboard;
pub mod runner;

pub use canvas::CanvasSurface;
pub use fetch::WebFetch;
pub use keyboard::KeyboardListener;
pub use runner::GameRunner;
pub use wee_engine;

/// Install the console logger and panic hook. Safe to call more than once.
pub fn init_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level).is_err() {
        log::debug!("logger already installed");
    }
}

/// Generate the `#[wasm_bindgen]` exports for a game.
///
/// Generates a `thread_local!` holding the [`GameRunner`], a `with_runner()`
/// helper, and these exports:
/// - `game_init(width, height, parent_selector?)`: mount the canvas, start the
///   loop, then call `$setup(&runner)` to load assets and set the first stage
/// - `game_set_debug(on)`: toggle the hitbox overlay
/// - `game_load_manifest(json)`: register sheets and preload their images
/// - `game_elapsed()`: seconds covered by the last tick
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
///
/// mod game;
///
/// wee_web::export_game!(game::setup, "my-game");
/// ```
///
/// # Arguments
///
/// - `$setup`: a `fn(&wee_web::GameRunner)` run once after mounting
/// - `$game_name`: a string literal used in log messages
#[macro_export]
macro_rules! export_game {
    ($setup:path, $game_name:literal) => {
        thread_local! {
            static RUNNER: std::cell::RefCell<Option<$crate::GameRunner>> =
                std::cell::RefCell::new(None);
        }

        fn with_runner<R>(f: impl FnOnce(&$crate::GameRunner) -> R) -> Option<R> {
            RUNNER.with(|cell| match cell.borrow().as_ref() {
                Some(runner) => Some(f(runner)),
                None => {
                    log::warn!("{}: call game_init() first", $game_name);
                    None
                }
            })
        }

        #[wasm_bindgen]
        pub fn game_init(
            width: u32,
            height: u32,
            parent_selector: Option<String>,
        ) -> Result<(), JsValue> {
            $crate::init_logging(log::Level::Info);

            let config = $crate::wee_engine::GameConfig {
                width,
                height,
                ..Default::default()
            };
            let runner = $crate::GameRunner::mount(config, parent_selector.as_deref())?;
            $setup(&runner);

            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });
            log::info!("{}: initialized", $game_name);
            Ok(())
        }

        #[wasm_bindgen]
        pub fn game_set_debug(on: bool) {
            with_runner(|r| r.with_game(|g| g.set_debug(on)));
        }

        #[wasm_bindgen]
        pub fn game_load_manifest(json: &str) -> Result<(), JsValue> {
            match with_runner(|r| r.load_manifest(json)) {
                Some(Err(e)) => Err(JsValue::from_str(&e.to_string())),
                _ => Ok(()),
            }
        }

        #[wasm_bindgen]
        pub fn game_elapsed() -> f32 {
            with_runner(|r| r.with_game(|g| g.elapsed())).unwrap_or(0.0)
        }
    };
}
