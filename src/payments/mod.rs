//! Payment gateway adapters
//!
//! One [`PaymentProvider`] trait, three variants: the placeholder card gateway, the
//! checksum-signed redirect gateway and the manual UPI transfer.

pub mod checksum;
pub mod error;
pub mod factory;
pub mod provider;
pub mod providers;
pub mod types;
pub mod utils;

pub use error::{PaymentError, PaymentResult};
pub use factory::PaymentProviderFactory;
pub use provider::PaymentProvider;
pub use types::ProviderName;
