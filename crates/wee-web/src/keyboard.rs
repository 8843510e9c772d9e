use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, KeyboardEvent, Window};
use wee_engine::{Game, InputEvent, Surface};

/// Keys whose browser default (page scroll) is suppressed while a game runs.
const CAPTURED: &[&str] = &["ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight", "Space"];

type KeyHandler = Closure<dyn FnMut(KeyboardEvent)>;

/// Window key listeners feeding a game's input queue.
/// Listeners are removed when this is dropped.
pub struct KeyboardListener {
    window: Window,
    keydown: KeyHandler,
    keyup: KeyHandler,
    blur: Closure<dyn FnMut(Event)>,
}

impl KeyboardListener {
    pub fn attach<S: Surface + 'static>(game: &Rc<RefCell<Game<S>>>) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        let keydown = key_handler(Rc::downgrade(game), |code| InputEvent::KeyDown { code });
        let keyup = key_handler(Rc::downgrade(game), |code| InputEvent::KeyUp { code });

        // keyup never arrives for keys held while focus leaves the page
        let weak = Rc::downgrade(game);
        let blur = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            if let Some(game) = weak.upgrade() {
                if let Ok(mut game) = game.try_borrow_mut() {
                    game.reset_input();
                }
            }
        });

        window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        log::debug!("keyboard listeners attached");

        Ok(Self {
            window,
            keydown,
            keyup,
            blur,
        })
    }
}

fn key_handler<S, F>(game: Weak<RefCell<Game<S>>>, event: F) -> KeyHandler
where
    S: Surface + 'static,
    F: Fn(String) -> InputEvent + 'static,
{
    Closure::<dyn FnMut(KeyboardEvent)>::new(move |e: KeyboardEvent| {
        let code = e.code();
        if CAPTURED.contains(&code.as_str()) {
            e.prevent_default();
        }
        let Some(game) = game.upgrade() else {
            return;
        };
        match game.try_borrow_mut() {
            Ok(mut game) => game.push_input(event(code)),
            Err(_) => log::warn!("key {} dropped: game busy", code),
        };
    })
}

impl Drop for KeyboardListener {
    fn drop(&mut self) {
        let pairs: [(&str, &JsValue); 3] = [
            ("keydown", self.keydown.as_ref()),
            ("keyup", self.keyup.as_ref()),
            ("blur", self.blur.as_ref()),
        ];
        for (kind, callback) in pairs {
            if let Err(e) = self
                .window
                .remove_event_listener_with_callback(kind, callback.unchecked_ref())
            {
                log::warn!("removing {} listener failed: {:?}", kind, e);
            }
        }
    }
}
