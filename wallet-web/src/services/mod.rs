//! Browser implementations of the connection core's ports.

pub mod discovery;
pub mod provider;
pub mod rpc;
pub mod storage;

use futures::future::LocalBoxFuture;
use lib_connect::Spawner;

pub use discovery::WindowDiscovery;
pub use provider::InjectedProvider;
pub use rpc::HttpRpc;
pub use storage::LocalSessionStore;

/// Spawns onto the page's microtask queue.
pub struct LocalSpawner;

impl Spawner for LocalSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
