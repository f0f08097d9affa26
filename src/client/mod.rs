//! Storefront client: the cart, checkout and payment-return logic a browser runs,
//! with client-durable storage behind a trait

pub mod api;
pub mod cart;
pub mod checkout;
pub mod pending_order;
pub mod storage;

pub use api::{ApiError, GatewayRequest, HttpStorefrontApi, InProcessStorefrontApi, StorefrontApi};
pub use cart::{Cart, CartEntry, CartError};
pub use checkout::{Checkout, CheckoutError, CheckoutState, GatewayForm, PaymentReturn, Session};
pub use pending_order::{PendingOrder, PendingOrderStore};
pub use storage::{ClientStorage, FileStorage, MemoryStorage, StorageError};
