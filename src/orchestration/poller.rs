use crate::domain::{Address, DebtId};
use crate::orchestration::service::LedgerService;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::service::LedgerView;
use crate::datasource::DataSourceError;

pub type ViewReceiver = watch::Receiver<Option<Arc<LedgerView>>>;

/// Periodic refresh of one user's ledger view.
pub struct LedgerPoller;

impl LedgerPoller {
    /// Spawn the polling task. The first tick fires immediately.
    ///
    /// Ticks run one after another: a slow read pushes the next tick back
    /// rather than overlapping it. A failed refresh keeps the last view.
    pub fn spawn(service: LedgerService, user: Address, interval: Duration) -> PollerHandle {
        let (tx, rx) = watch::channel(None);
        let wake = Arc::new(Notify::new());
        let task_wake = wake.clone();
        let task_user = user.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = task_wake.notified() => {
                        debug!("On-demand refresh for {}", task_user);
                        ticker.reset();
                    }
                }
                match service.refresh(&task_user).await {
                    Ok(view) => {
                        tx.send_replace(Some(Arc::new(view)));
                    }
                    Err(e) => warn!("Poll for {} failed, keeping previous view: {}", task_user, e),
                }
            }
        });

        info!("Started poller for {} every {:?}", user, interval);
        PollerHandle {
            user,
            rx,
            wake,
            task,
        }
    }
}

/// Owns a polling task; dropping it stops the task.
#[derive(Debug)]
pub struct PollerHandle {
    user: Address,
    rx: ViewReceiver,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn user(&self) -> &Address {
        &self.user
    }

    /// The most recently published view, if any refresh has succeeded.
    pub fn latest(&self) -> Option<Arc<LedgerView>> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> ViewReceiver {
        self.rx.clone()
    }

    /// Refresh without waiting for the next tick.
    pub fn refresh_now(&self) {
        self.wake.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!("Stopped poller for {}", self.user);
    }
}

/// Per-user pollers sharing one service.
#[derive(Debug, Clone)]
pub struct PollerRegistry {
    service: LedgerService,
    interval: Duration,
    pollers: Arc<Mutex<HashMap<Address, PollerHandle>>>,
}

impl PollerRegistry {
    pub fn new(service: LedgerService, interval: Duration) -> Self {
        Self {
            service,
            interval,
            pollers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn service(&self) -> &LedgerService {
        &self.service
    }

    /// Start polling `user` unless a poller already exists.
    pub async fn watch(&self, user: &Address) -> ViewReceiver {
        let mut pollers = self.pollers.lock().await;
        pollers
            .entry(user.clone())
            .or_insert_with(|| {
                LedgerPoller::spawn(self.service.clone(), user.clone(), self.interval)
            })
            .subscribe()
    }

    /// The polled view for a watched user, otherwise a one-off refresh.
    ///
    /// Never starts a poller: only [`PollerRegistry::watch`] does.
    pub async fn view(&self, user: &Address) -> Result<Arc<LedgerView>, DataSourceError> {
        let latest = self.pollers.lock().await.get(user).and_then(PollerHandle::latest);
        match latest {
            Some(view) => Ok(view),
            None => Ok(Arc::new(self.service.refresh(user).await?)),
        }
    }

    /// Wake the user's poller after a confirmed write.
    pub async fn refresh_now(&self, user: &Address) {
        if let Some(handle) = self.pollers.lock().await.get(user) {
            handle.refresh_now();
        }
    }

    /// Wake the pollers of both parties after `user` settles debt `id`.
    ///
    /// The counterparty comes from the caller's polled view when it lists
    /// the debt, otherwise from a read of the record.
    pub async fn refresh_parties(&self, user: &Address, id: DebtId) {
        self.refresh_now(user).await;

        let cached = self
            .pollers
            .lock()
            .await
            .get(user)
            .and_then(PollerHandle::latest)
            .and_then(|view| {
                view.debts
                    .iter()
                    .find(|d| d.id() == id)
                    .map(|d| d.counterparty.clone())
            });
        let counterparty = match cached {
            Some(other) => other,
            None => match self.service.counterparty(user, id).await {
                Ok(other) => other,
                Err(e) => {
                    warn!("Could not resolve counterparty of debt {}: {}", id, e);
                    return;
                }
            },
        };
        self.refresh_now(&counterparty).await;
    }

    /// Stop polling `user`. Returns false when nothing was polling.
    pub async fn unwatch(&self, user: &Address) -> bool {
        let removed = self.pollers.lock().await.remove(user);
        removed.is_some()
    }

    pub async fn watched(&self) -> Vec<Address> {
        let mut users: Vec<Address> = self.pollers.lock().await.keys().cloned().collect();
        users.sort();
        users
    }
}
