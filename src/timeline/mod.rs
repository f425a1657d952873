pub mod frontend_events;
pub mod notifications;
pub mod sources;
pub mod timeline_screen;
