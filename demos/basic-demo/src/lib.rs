use wasm_bindgen::prelude::*;

mod game;

wee_web::export_game!(game::setup, "basic-demo");
