//! EIP-6963 discovery over window events

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Object, Reflect};
use lib_connect::{AnnouncementListener, DiscoveryPort, ProviderAnnouncement, ProviderInfo};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CustomEvent, Event, Window};

use super::provider::InjectedProvider;

const ANNOUNCE_EVENT: &str = "eip6963:announceProvider";
const REQUEST_EVENT: &str = "eip6963:requestProvider";

pub struct WindowDiscovery {
    window: Window,
    /// `announceProvider` handlers, alive as long as the discovery.
    handlers: RefCell<Vec<Closure<dyn FnMut(Event)>>>,
}

impl WindowDiscovery {
    pub fn new() -> Result<Self, JsError> {
        let window = web_sys::window().ok_or_else(|| JsError::new("No window object"))?;
        Ok(Self {
            window,
            handlers: RefCell::new(Vec::new()),
        })
    }
}

impl DiscoveryPort for WindowDiscovery {
    fn subscribe(&self, listener: AnnouncementListener) {
        let handler = Closure::wrap(Box::new(move |event: Event| {
            match parse_announcement(&event) {
                Ok(announcement) => listener(announcement),
                Err(reason) => log::warn!("[Discovery] Ignoring announcement: {}", reason),
            }
        }) as Box<dyn FnMut(Event)>);

        if let Err(err) = self
            .window
            .add_event_listener_with_callback(ANNOUNCE_EVENT, handler.as_ref().unchecked_ref())
        {
            log::error!("[Discovery] Failed to listen for {}: {:?}", ANNOUNCE_EVENT, err);
            return;
        }
        self.handlers.borrow_mut().push(handler);
    }

    fn request_providers(&self) {
        let dispatched = Event::new(REQUEST_EVENT).and_then(|event| self.window.dispatch_event(&event));
        if let Err(err) = dispatched {
            log::error!("[Discovery] Failed to dispatch {}: {:?}", REQUEST_EVENT, err);
        }
    }
}

fn parse_announcement(event: &Event) -> Result<ProviderAnnouncement, String> {
    let detail = event
        .dyn_ref::<CustomEvent>()
        .map(CustomEvent::detail)
        .ok_or("not a CustomEvent")?;

    let info = Reflect::get(&detail, &JsValue::from_str("info"))
        .map_err(|_| "missing detail.info".to_string())?;
    let info: ProviderInfo =
        serde_wasm_bindgen::from_value(info).map_err(|e| format!("bad detail.info: {e}"))?;
    if info.name.is_empty() {
        return Err("provider without a name".to_string());
    }

    let provider = Reflect::get(&detail, &JsValue::from_str("provider"))
        .ok()
        .and_then(|provider| provider.dyn_into::<Object>().ok())
        .ok_or_else(|| format!("{} announced without a provider object", info.name))?;

    Ok(ProviderAnnouncement {
        info,
        provider: Rc::new(InjectedProvider::new(provider)),
    })
}
