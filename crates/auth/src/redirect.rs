//! Post-load redirect flow for the admin UI.
//!
//! ```text
//! Loading ─┬─ no user ─────────────────────────────► /signup
//!          ├─ user, unverified ────────────────────► (stay)
//!          ├─ user, verified, exempt path ─────────► (stay)
//!          ├─ user, verified, no school / failed ──► /select-organization
//!          └─ user, verified, has school ──────────► /
//! ```
//!
//! A [`RedirectFlow`] lives for one page mount; once it has dispatched a
//! redirect it stays quiet until [`RedirectFlow::reset`].

use uuid::Uuid;

use crate::User;

pub const SIGNUP_PATH: &str = "/signup";
pub const SELECT_ORGANIZATION_PATH: &str = "/select-organization";
pub const CREATE_SCHOOL_PATH: &str = "/create-school";
pub const HOME_PATH: &str = "/";

/// Paths on which the school-membership check is skipped.
pub const MEMBERSHIP_EXEMPT_PATHS: &[&str] = &[CREATE_SCHOOL_PATH, SELECT_ORGANIZATION_PATH];

/// Result of fetching the user's organization-membership record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    HasSchool(Uuid),
    NoSchool,
    /// The lookup itself failed; handled exactly like `NoSchool`.
    Failed,
}

/// What the page currently knows about the visitor.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionView {
    Loading,
    SignedOut,
    SignedIn {
        user: User,
        /// `None` when the membership check was not performed.
        membership: Option<Membership>,
    },
}

/// Flow state derived from a [`SessionView`] and the current path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Loading,
    NoUser,
    Unverified,
    Exempt,
    NeedsSchool,
    Ready,
}

impl FlowState {
    pub fn of(view: &SessionView, path: &str) -> Self {
        match view {
            SessionView::Loading => Self::Loading,
            SessionView::SignedOut => Self::NoUser,
            SessionView::SignedIn { user, .. } if !user.is_verified() => Self::Unverified,
            SessionView::SignedIn { .. } if is_membership_exempt(path) => Self::Exempt,
            SessionView::SignedIn { membership, .. } => match membership {
                Some(Membership::HasSchool(_)) => Self::Ready,
                Some(Membership::NoSchool | Membership::Failed) | None => Self::NeedsSchool,
            },
        }
    }

    /// Target of this state, if it redirects at all.
    pub fn target(self) -> Option<&'static str> {
        match self {
            Self::Loading | Self::Unverified | Self::Exempt => None,
            Self::NoUser => Some(SIGNUP_PATH),
            Self::NeedsSchool => Some(SELECT_ORGANIZATION_PATH),
            Self::Ready => Some(HOME_PATH),
        }
    }
}

/// True when the membership lookup should be skipped for `path`.
pub fn is_membership_exempt(path: &str) -> bool {
    MEMBERSHIP_EXEMPT_PATHS.contains(&path.trim_end_matches('/'))
}

/// Redirect dispatcher with a once-per-mount guard.
#[derive(Debug, Default)]
pub struct RedirectFlow {
    is_redirecting: bool,
}

impl RedirectFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the flow; returns the path to navigate to, at most once.
    pub fn evaluate(&mut self, view: &SessionView, path: &str) -> Option<&'static str> {
        if self.is_redirecting {
            return None;
        }

        let target = FlowState::of(view, path).target()?;
        if target == path {
            return None;
        }

        self.is_redirecting = true;
        Some(target)
    }

    pub fn is_redirecting(&self) -> bool {
        self.is_redirecting
    }

    /// Start a new mount lifecycle.
    pub fn reset(&mut self) {
        self.is_redirecting = false;
    }
}
