// Adapters layer: concrete implementations for external systems (http, storage, downstream clients).

pub mod clients;
pub mod http;
pub mod store;
