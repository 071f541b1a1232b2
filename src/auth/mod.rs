//! Authorization code + PKCE sign-in flow

pub mod callback;
pub mod discovery;
pub mod flow;
pub mod pkce;
pub mod token;

pub use callback::{CallbackResult, CallbackServer};
pub use discovery::ProviderEndpoints;
pub use flow::{AuthFlow, PrintUrl, SystemBrowser, UrlPresenter};
pub use pkce::PkcePair;
pub use token::TokenResponse;
