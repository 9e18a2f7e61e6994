pub mod api;

#[cfg(any(feature = "client", test))]
pub mod client;

#[cfg(any(feature = "server", test))]
pub mod app_config;
#[cfg(any(feature = "server", test))]
pub mod domain;
#[cfg(any(feature = "server", test))]
mod handlers;
#[cfg(any(feature = "server", test))]
pub mod mapping;
#[cfg(any(feature = "server", test))]
pub mod repository;
#[cfg(any(feature = "server", test))]
pub mod services;
#[cfg(any(feature = "server", test))]
pub mod settings;
