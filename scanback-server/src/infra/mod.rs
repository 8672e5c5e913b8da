pub mod app_state;
pub mod startup;
pub mod tls;
