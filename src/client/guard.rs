use crate::client::session::SessionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
}

/// Route guard consulted before entering the complaint view. Blocks navigation
/// and sends the caller back to the login view unless the session is live.
pub fn check_access(session: &SessionManager) -> GuardDecision {
    if session.is_logged_in() {
        GuardDecision::Allow
    } else {
        session.clear_stale();
        GuardDecision::RedirectToLogin
    }
}
