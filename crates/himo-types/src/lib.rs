pub mod api;
pub mod ids;
