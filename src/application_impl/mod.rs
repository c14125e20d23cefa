mod account_service_impl;
mod auth_gate;
mod jwt_codec;
mod token_config;
mod token_manager;

pub use account_service_impl::*;
pub use auth_gate::*;
pub use jwt_codec::*;
pub use token_config::*;
pub use token_manager::*;
