pub mod app;
pub mod interactive;
pub mod login;
pub mod proxy_client;
