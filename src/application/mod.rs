// Application layer - Use cases, upstream access and caching
pub mod cache;
pub mod clock;
pub mod error;
pub mod maintenance;
pub mod proxy_service;
pub mod retry;
pub mod station_service;
pub mod upstream;
