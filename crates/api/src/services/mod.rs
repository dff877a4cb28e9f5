//! Business services and external collaborators.

pub mod auth0;
pub mod identity;
pub mod jwks;
pub mod orders;
pub mod registration;
pub mod sms;

pub use auth0::Auth0Client;
pub use identity::{
    IdentityError, IdentityProvider, NewIdentityUser, PasswordGrant, TokenSet, VerifiedIdentity,
};
pub use orders::{OrderError, OrderService};
pub use registration::{RegistrationError, RegistrationRequest, register_customer};
pub use sms::{AfricasTalkingClient, LogNotifier, NotificationError, OrderNotifier};
