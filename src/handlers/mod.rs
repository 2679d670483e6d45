/// HTTP handlers module
/// Provides the REST endpoints under /api

pub mod rest;

pub use rest::{
    authenticate, get_presale_end, get_progress_bar, health, init_admin, json_config,
    list_wallet_addresses, register_wallet_address, set_presale_end, set_progress_bar,
    verify_token,
};
