use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::storage::SessionStorage;
use crate::db::models::UserProfile;

pub const USER_KEY: &str = "student_portal_user";
pub const LOGIN_TIME_KEY: &str = "student_portal_login_time";

/// Idle window before an authenticated session expires.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Client-side session state: two storage keys (serialized profile, last
/// activity time in epoch milliseconds), an observable current user, and an
/// idle timer that logs out after [`DEFAULT_IDLE_TIMEOUT`] without activity.
///
/// Not a security mechanism; the server issues no tokens. This only gates the
/// complaint view as a UX convenience, like the browser original.
///
/// Must live inside a Tokio runtime once a session is active, since the idle
/// timer is a spawned task.
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    storage: Arc<dyn SessionStorage>,
    idle_timeout: Duration,
    current_user: watch::Sender<Option<UserProfile>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_timeout(storage, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_timeout(storage: Arc<dyn SessionStorage>, idle_timeout: Duration) -> Self {
        let (current_user, _) = watch::channel(None);
        let manager = SessionManager {
            inner: Arc::new(SessionInner {
                storage,
                idle_timeout,
                current_user,
                timer: Mutex::new(None),
            }),
        };

        // Restore a previously stored session, expiring it if it is stale.
        if let Some(profile) = manager.stored_user() {
            manager.inner.current_user.send_replace(Some(profile));
            if manager.is_logged_in() {
                arm_timer(&manager.inner);
            }
        }

        manager
    }

    /// Observable current user; receivers see every login/logout transition.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.inner.current_user.subscribe()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.inner.current_user.borrow().clone()
    }

    /// Record a successful login response: persist the profile and activity
    /// timestamp, publish the user, and arm the idle timer.
    pub fn handle_login(&self, profile: UserProfile) {
        let json = match serde_json::to_string(&profile) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!("failed to serialize session profile: {}", err);
                return;
            }
        };

        self.inner.storage.set(USER_KEY, json);
        self.inner
            .storage
            .set(LOGIN_TIME_KEY, now_millis().to_string());
        self.inner.current_user.send_replace(Some(profile));
        arm_timer(&self.inner);
    }

    pub fn logout(&self) {
        self.inner.clear_timer();
        self.inner.storage.remove(USER_KEY);
        self.inner.storage.remove(LOGIN_TIME_KEY);
        self.inner.current_user.send_replace(None);
    }

    /// Authenticated when both keys are present and the idle window has not
    /// elapsed since the last recorded activity. A stale session is expired
    /// on the spot.
    pub fn is_logged_in(&self) -> bool {
        let Some(_profile) = self.stored_user() else {
            return false;
        };
        let Some(last_activity) = self.stored_login_time() else {
            return false;
        };

        let session_age = now_millis().saturating_sub(last_activity);
        if session_age > self.inner.idle_timeout.as_millis() as i64 {
            tracing::info!("session expired after {}ms of inactivity", session_age);
            self.logout();
            return false;
        }

        true
    }

    /// Called on any tracked user interaction (click, keypress, mouse move,
    /// scroll in the original). Refreshes the activity timestamp and reschedules
    /// the idle timer; cancel-and-rearm happens under the timer lock, so
    /// concurrent activity events cannot leave two timers running.
    pub fn record_activity(&self) {
        if !self.is_logged_in() {
            return;
        }

        self.inner
            .storage
            .set(LOGIN_TIME_KEY, now_millis().to_string());
        arm_timer(&self.inner);
    }

    /// Local-only profile edit; lost on logout or expiry, like the original.
    pub fn update_profile(&self, update: impl FnOnce(&mut UserProfile)) {
        let Some(mut profile) = self.current_user() else {
            return;
        };
        update(&mut profile);

        match serde_json::to_string(&profile) {
            Ok(json) => self.inner.storage.set(USER_KEY, json),
            Err(err) => {
                tracing::error!("failed to serialize session profile: {}", err);
                return;
            }
        }
        self.inner.current_user.send_replace(Some(profile));
    }

    /// Drop whatever is in storage without publishing a transition. Used by the
    /// route guard to scrub partial state on denied navigation.
    pub fn clear_stale(&self) {
        self.inner.storage.remove(USER_KEY);
        self.inner.storage.remove(LOGIN_TIME_KEY);
    }

    fn stored_user(&self) -> Option<UserProfile> {
        let raw = self.inner.storage.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::error!("corrupt session profile in storage: {}", err);
                None
            }
        }
    }

    fn stored_login_time(&self) -> Option<i64> {
        self.inner.storage.get(LOGIN_TIME_KEY)?.parse().ok()
    }
}

impl SessionInner {
    fn timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clear_timer(&self) {
        if let Some(handle) = self.timer_slot().take() {
            handle.abort();
        }
    }

    fn expire(&self) {
        self.clear_timer();
        self.storage.remove(USER_KEY);
        self.storage.remove(LOGIN_TIME_KEY);
        self.current_user.send_replace(None);
    }
}

/// Cancel any pending expiry and schedule a fresh one, atomically with respect
/// to other activity events racing on the same session.
fn arm_timer(inner: &Arc<SessionInner>) {
    let mut slot = inner.timer_slot();
    if let Some(handle) = slot.take() {
        handle.abort();
    }

    let task_inner = Arc::clone(inner);
    *slot = Some(tokio::spawn(async move {
        tokio::time::sleep(task_inner.idle_timeout).await;
        tracing::info!("idle timeout elapsed, ending session");
        task_inner.expire();
    }));
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryStorage;

    fn profile() -> UserProfile {
        UserProfile {
            id: 1,
            name: "Test Student".to_string(),
            email: "a@example.com".to_string(),
            roll_no: "CS-001".to_string(),
            department: "CS".to_string(),
            phone: "03001234567".to_string(),
        }
    }

    #[tokio::test]
    async fn login_then_logout_round_trip() {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionManager::new(storage.clone());
        assert!(!session.is_logged_in());
        assert_eq!(session.current_user(), None);

        session.handle_login(profile());
        assert!(session.is_logged_in());
        assert_eq!(session.current_user(), Some(profile()));
        assert!(storage.get(USER_KEY).is_some());
        assert!(storage.get(LOGIN_TIME_KEY).is_some());

        session.logout();
        assert!(!session.is_logged_in());
        assert_eq!(session.current_user(), None);
        assert_eq!(storage.get(USER_KEY), None);
        assert_eq!(storage.get(LOGIN_TIME_KEY), None);
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let session = SessionManager::new(Arc::new(MemoryStorage::new()));
        let mut receiver = session.subscribe();

        session.handle_login(profile());
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow(), Some(profile()));

        session.logout();
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow(), None);
    }

    #[tokio::test]
    async fn session_restores_from_storage() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let session = SessionManager::new(storage.clone());
            session.handle_login(profile());
        }

        // A fresh manager over the same storage picks the session back up.
        let restored = SessionManager::new(storage);
        assert!(restored.is_logged_in());
        assert_eq!(restored.current_user(), Some(profile()));
    }

    #[tokio::test]
    async fn stale_stored_timestamp_expires_on_query() {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionManager::new(storage.clone());
        session.handle_login(profile());

        // Rewind the stored activity time past the idle window.
        let expired = now_millis() - DEFAULT_IDLE_TIMEOUT.as_millis() as i64 - 1000;
        storage.set(LOGIN_TIME_KEY, expired.to_string());

        assert!(!session.is_logged_in());
        assert_eq!(session.current_user(), None);
        assert_eq!(storage.get(USER_KEY), None);
    }

    #[tokio::test]
    async fn missing_timestamp_means_unauthenticated() {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionManager::new(storage.clone());
        session.handle_login(profile());

        storage.remove(LOGIN_TIME_KEY);
        assert!(!session.is_logged_in());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_logs_the_session_out() {
        let storage = Arc::new(MemoryStorage::new());
        let session =
            SessionManager::with_timeout(storage.clone(), Duration::from_secs(30 * 60));
        session.handle_login(profile());

        let mut receiver = session.subscribe();

        tokio::time::sleep(Duration::from_secs(31 * 60)).await;
        receiver.changed().await.unwrap();

        assert_eq!(*receiver.borrow(), None);
        assert_eq!(storage.get(USER_KEY), None);
        assert_eq!(storage.get(LOGIN_TIME_KEY), None);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_reschedules_the_idle_timer() {
        let storage = Arc::new(MemoryStorage::new());
        let session =
            SessionManager::with_timeout(storage.clone(), Duration::from_secs(30 * 60));
        session.handle_login(profile());

        // 20 minutes in, the user is active again.
        tokio::time::sleep(Duration::from_secs(20 * 60)).await;
        session.record_activity();

        // 40 minutes after login but only 20 since the last activity.
        tokio::time::sleep(Duration::from_secs(20 * 60)).await;
        assert!(session.current_user().is_some());

        // 11 more minutes with no activity pushes past the window.
        tokio::time::sleep(Duration::from_secs(11 * 60)).await;
        assert!(session.current_user().is_none());
        assert_eq!(storage.get(USER_KEY), None);
    }

    #[tokio::test]
    async fn profile_updates_are_local_and_lost_on_logout() {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionManager::new(storage.clone());
        session.handle_login(profile());

        session.update_profile(|p| p.department = "Mathematics".to_string());
        assert_eq!(
            session.current_user().map(|p| p.department),
            Some("Mathematics".to_string())
        );

        session.logout();
        session.handle_login(profile());
        assert_eq!(
            session.current_user().map(|p| p.department),
            Some("CS".to_string())
        );
    }
}
