//! Foreign-caller bindings for the native loader.

pub mod api;
