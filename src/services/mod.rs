//! Domain services over the repositories

pub mod admin;
pub mod contact;
pub mod customers;
pub mod menu;
pub mod orders;
pub mod reservations;

pub use admin::{AdminLoginRequest, AdminLoginResponse, AdminService, DashboardStats};
pub use contact::{ContactService, NewContactMessage};
pub use customers::{CustomerService, LoginRequest, SessionResponse, SignupRequest};
pub use menu::{MenuItemPatch, MenuService, NewMenuItem};
pub use orders::{NewOrder, NewOrderItem, OrderService, PaymentOutcome};
pub use reservations::{NewReservation, ReservationService};
