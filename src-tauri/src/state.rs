use parking_lot::{Mutex, RwLock};
use std::time::Duration;

use crate::config::AppConfig;
use crate::panel::PanelSession;
use crate::sidebar::SidebarState;

/// Trailing debounce for persisting the panel's free text.
pub(crate) const TEXT_SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Shared application state managed by Tauri.
///
/// Everything here is mutated from IPC handlers and timer tasks; the two
/// webview contexts themselves share no memory and talk only through
/// messages.
pub(crate) struct AppState {
    pub(crate) config: RwLock<AppConfig>,
    pub(crate) panel: Mutex<PanelSession>,
    pub(crate) sidebar: Mutex<SidebarState>,
    pub(crate) text_saver: Debouncer,
}

impl AppState {
    pub(crate) fn new(config: AppConfig) -> Self {
        Self {
            config: RwLock::new(config),
            panel: Mutex::new(PanelSession::new()),
            sidebar: Mutex::new(SidebarState::new()),
            text_saver: Debouncer::new(TEXT_SAVE_DEBOUNCE),
        }
    }
}

/// Trailing-edge debouncer: each `schedule` call replaces the pending one,
/// so a burst of calls produces exactly one execution, with the payload of
/// the last call. Aborting the previous task (instead of flagging it) means
/// a superseded write can never race the newer one.
pub(crate) struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Debouncer {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Run `f` after the debounce delay unless superseded first.
    /// Must be called from within a tokio runtime.
    pub(crate) fn schedule(&self, f: impl FnOnce() + Send + 'static) {
        let mut pending = self.pending.lock();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn debounce_coalesces_rapid_calls_into_last_value() {
        let writes: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let debouncer = Debouncer::new(Duration::from_millis(50));

        for i in 0..5u32 {
            let writes = writes.clone();
            debouncer.schedule(move || writes.lock().push(i));
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*writes.lock(), vec![4]);
    }

    #[tokio::test]
    async fn newer_schedule_supersedes_pending_one() {
        let writes: Arc<Mutex<Vec<&str>>> = Arc::new(Mutex::new(Vec::new()));
        let debouncer = Debouncer::new(Duration::from_millis(60));

        {
            let writes = writes.clone();
            debouncer.schedule(move || writes.lock().push("first"));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        {
            let writes = writes.clone();
            debouncer.schedule(move || writes.lock().push("second"));
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*writes.lock(), vec!["second"]);
    }

    #[tokio::test]
    async fn spaced_calls_each_fire() {
        let writes: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let debouncer = Debouncer::new(Duration::from_millis(20));

        {
            let writes = writes.clone();
            debouncer.schedule(move || writes.lock().push(1));
        }
        tokio::time::sleep(Duration::from_millis(80)).await;
        {
            let writes = writes.clone();
            debouncer.schedule(move || writes.lock().push(2));
        }
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(*writes.lock(), vec![1, 2]);
    }
}
