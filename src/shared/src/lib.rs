//! Shared types and configuration for the MindLoom content transformation services

pub mod config;
pub mod types;

pub use config::{ProviderConfig, ServerConfig, SupabaseConfig};

// Export all types from types module
pub use types::*;
