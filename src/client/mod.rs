//! Typed client for the admin API, carrying the front end's contract-level
//! behaviour: form checks before sending, confirmation before destructive
//! actions, and session expiry handling.

mod api;
pub mod confirm;
pub mod display;
mod error;
pub mod forms;
pub mod token_store;


pub use api::{
    ApiClient, ClientConfig, LoginRedirect, NoRedirect, API_URL_ENV, DEFAULT_API_URL, LOGIN_ROUTE,
};
pub use confirm::{Confirm, FixedAnswer};
pub use error::{ClientError, FormError};
pub use forms::{prepare_password_overrides, CreateTeamForm, MemberSlot, PasswordOverrideRow};
pub use token_store::{FileTokenStore, MemoryTokenStore, StoredIdentity, TokenStore};
