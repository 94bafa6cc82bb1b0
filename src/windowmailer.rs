//! Mailbox on the browser `window` object, used to hand results of JS
//! futures over to ECS systems polling each frame.

use wasm_bindgen::prelude::*;
use js_sys::Map;
use js_sys::Array;

const MAIL_VAR: &str = "WINDOW_MAILER_MAILBOX";

fn mailbox() -> Option<Map> {
    let window = web_sys::window()?;

    // Create the mail-storing map if needed
    if !js_sys::Reflect::has(&window, &JsValue::from(MAIL_VAR)).ok()? {
        let map: Map = Map::new();
        js_sys::Reflect::set(&window, &JsValue::from(MAIL_VAR), &map).ok()?;
    }

    Some(js_sys::Reflect::get(&window, &JsValue::from(MAIL_VAR)).ok()?.into())
}

fn channel(channel_name: &str) -> Option<Array> {
    let map = mailbox()?;
    let channel_name = JsValue::from(channel_name);

    // Create the channel message array if needed
    if !map.has(&channel_name) {
        map.set(&channel_name, &Array::new());
    }

    Some(map.get(&channel_name).into())
}

pub fn send_message(channel_name: &str, message: String) {
    if let Some(arr) = channel(channel_name) {
        arr.push(&JsValue::from(message));
    }
}

/// Oldest message first.
pub fn read_message(channel_name: &str) -> Option<String> {
    channel(channel_name)?.shift().as_string()
}
