pub mod beacon;
pub mod camera;
pub mod capture;
pub mod config;
pub mod display;
pub mod feed;
pub mod logger;
pub mod lux;
pub mod publisher;
pub mod state;
pub mod station;
pub mod tv;
pub mod weather;

#[cfg(test)]
pub(crate) mod testutil;
