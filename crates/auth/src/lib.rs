//! `auth` crate — session bridge, edge request gate, and post-load redirect flow.
//!
//! The auth provider itself is external; everything here is cookie plumbing
//! and a few decision tables. The provider is reached through the
//! [`AuthProvider`] trait so the bridge can be tested against
//! [`mock::MockAuthProvider`].

pub mod bridge;
pub mod cookies;
pub mod error;
pub mod gate;
pub mod mock;
pub mod provider;
pub mod redirect;
pub mod session;

pub use bridge::{ResolvedSession, SessionBridge};
pub use cookies::{CookieOptions, SameSite, SetCookie};
pub use error::AuthError;
pub use gate::{GateDecision, PathClass, RouteTable};
pub use provider::{AuthProvider, GoTrueClient};
pub use redirect::{FlowState, Membership, RedirectFlow, SessionView};
pub use session::{AuthSession, User};
