//! Catalog admin backend: accounts with OTP password recovery, role-gated
//! category/product management, and CSV export.

pub mod audit;
pub mod clock;
pub mod config;
pub mod dto;
pub mod error;
pub mod export;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod store;
