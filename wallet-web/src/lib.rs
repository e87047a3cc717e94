//! Browser wallet connector
//!
//! wasm-bindgen bindings around `lib-connect`: EIP-6963 discovery over window events,
//! injected EIP-1193 providers, `localStorage` persistence and ENS lookups over HTTP.
//! Pages drive it through the [`ConnectWallet`] class.

use wasm_bindgen::prelude::*;

mod api;
mod services;
mod utils;

pub use api::ConnectWallet;

#[wasm_bindgen(start)]
pub fn main() {
    // Readable panic messages in the browser console
    console_error_panic_hook::set_once();

    wasm_logger::init(wasm_logger::Config::default());
    log::info!("[Connect] wallet-web loaded");
}
