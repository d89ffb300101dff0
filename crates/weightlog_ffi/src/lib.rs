//! Flutter-facing bindings over `weightlog_core`.

pub mod api;
