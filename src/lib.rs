pub mod core;
pub mod flows;
pub mod main_module;
pub mod security;
pub mod store;
