pub mod timeline_store;
