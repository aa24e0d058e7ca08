#![allow(clippy::needless_return)]
// src/lib.rs

pub mod audit;
pub mod core;
pub mod monitoring;
pub mod pricing;
pub mod providers;
pub mod service;
pub mod transactions;

pub use crate::core::domain::{ProviderKind, WalletDescriptor};
pub use crate::core::errors::WalletError;
pub use crate::service::WalletService;
