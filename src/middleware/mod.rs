//! HTTP middleware: error rendering, request logging, bearer-token gates

pub mod auth;
pub mod error;
pub mod logging;
