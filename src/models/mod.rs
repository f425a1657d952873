//! ViewModels exposed to the adapter

pub(crate) mod async_requests;
pub mod event_bridge;
pub mod events;
pub mod state_updater;
pub mod stream_item;
