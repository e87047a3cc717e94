//! Fire-and-forget task spawning on the local event loop.

use futures::future::LocalBoxFuture;

/// Runs `'static` local futures to completion without the caller awaiting them.
///
/// The browser host spawns with `wasm_bindgen_futures::spawn_local`. The controller
/// uses it for identity lookups and for provider-initiated disconnects, which start
/// inside synchronous event listeners.
pub trait Spawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}
