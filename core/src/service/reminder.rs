//! Reminder monitor.
//!
//! The monitor wakes on a fixed cadence, scans a snapshot of the collection
//! for tasks whose reminder time has passed, and surfaces them through a
//! single-slot banner that clears itself after a visibility window.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::model::task::{Priority, Task};
use crate::repository::TaskRepository;
use crate::service::task_store::TaskStore;
use crate::settings::ReminderSettings;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub task_id: Uuid,
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

impl From<&Task> for Notification {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id,
            title: task.title.clone(),
            message: task.message.clone(),
            priority: task.priority,
        }
    }
}

/// One notification per task whose reminder time is at or before `now`, in
/// collection order.
pub fn due_notifications(tasks: &[Task], now: NaiveDateTime) -> Vec<Notification> {
    tasks
        .iter()
        .filter(|t| t.is_due(now))
        .map(Notification::from)
        .collect()
}

/// Holds at most one visible notification. A newer one replaces the current.
#[derive(Debug)]
pub struct ReminderBanner {
    visible_for: Duration,
    current: Option<(Notification, Instant)>,
}

impl ReminderBanner {
    pub fn new(visible_for: Duration) -> Self {
        Self {
            visible_for,
            current: None,
        }
    }

    pub fn show(&mut self, notification: Notification, at: Instant) {
        self.current = Some((notification, at + self.visible_for));
    }

    pub fn current(&self, now: Instant) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|(_, expires)| now < *expires)
            .map(|(n, _)| n)
    }

    /// When the current notification stops being visible.
    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|(_, expires)| *expires)
    }

    /// Drops the notification once its window has passed. Returns whether
    /// anything was cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(expires) if now >= expires => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}

/// Something the monitor can take a snapshot of. `None` means the
/// collection is unavailable right now and the scan should be skipped.
pub trait TaskSource: Send + Sync + 'static {
    fn snapshot(&self) -> Option<Vec<Task>>;
}

impl<R> TaskSource for Mutex<TaskStore<R>>
where
    R: TaskRepository + Send + 'static,
{
    fn snapshot(&self) -> Option<Vec<Task>> {
        self.try_lock().map(|store| store.list().to_vec())
    }
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub struct ReminderMonitor<S: TaskSource> {
    source: Arc<S>,
    settings: ReminderSettings,
    clock: Clock,
    events: broadcast::Sender<Notification>,
}

impl<S: TaskSource> ReminderMonitor<S> {
    pub fn new(source: Arc<S>, settings: ReminderSettings) -> Self {
        Self {
            source,
            settings,
            clock: Arc::new(|| Local::now().naive_local()),
            events: broadcast::channel(EVENT_CAPACITY).0,
        }
    }

    /// Subscribes before the monitor starts, so the first scan is not missed
    /// on a multi-threaded runtime.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    /// Replaces the wall clock used to decide whether a task is due.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Starts scanning on the current tokio runtime. The first scan happens
    /// immediately.
    pub fn spawn(self) -> ReminderHandle {
        let cancel = CancellationToken::new();
        let (banner_tx, banner_rx) = watch::channel(None);
        let events_tx = self.events.clone();

        let join = tokio::spawn(self.run(banner_tx, events_tx.clone(), cancel.clone()));

        ReminderHandle {
            cancel,
            banner: banner_rx,
            events: events_tx,
            join: Some(join),
        }
    }

    async fn run(
        self,
        banner_tx: watch::Sender<Option<Notification>>,
        events_tx: broadcast::Sender<Notification>,
        cancel: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(self.settings.scan_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut banner = ReminderBanner::new(self.settings.banner_duration());
        let mut announced: HashSet<Uuid> = HashSet::new();

        tracing::debug!(
            interval_secs = self.settings.scan_interval().as_secs(),
            "reminder monitor started"
        );

        loop {
            let deadline = banner.deadline();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    for notification in self.scan(&mut announced) {
                        tracing::info!(task_id = %notification.task_id, title = %notification.title, "reminder due");
                        // Nobody listening is fine.
                        let _ = events_tx.send(notification.clone());
                        banner.show(notification, Instant::now());
                    }
                    publish(&banner_tx, &banner);
                }
                _ = sleep_until(deadline) => {
                    if banner.expire(Instant::now()) {
                        publish(&banner_tx, &banner);
                    }
                }
            }
        }

        banner_tx.send_replace(None);
        tracing::debug!("reminder monitor stopped");
    }

    fn scan(&self, announced: &mut HashSet<Uuid>) -> Vec<Notification> {
        let Some(tasks) = self.source.snapshot() else {
            tracing::debug!("task collection busy, skipping reminder scan");
            return Vec::new();
        };

        let mut due = due_notifications(&tasks, (self.clock)());
        if !self.settings.repeat_overdue {
            announced.retain(|id| tasks.iter().any(|t| t.id == *id));
            due.retain(|n| announced.insert(n.task_id));
        }
        due
    }
}

fn publish(tx: &watch::Sender<Option<Notification>>, banner: &ReminderBanner) {
    let current = banner.current(Instant::now()).cloned();
    tx.send_if_modified(|slot| {
        if *slot == current {
            false
        } else {
            *slot = current;
            true
        }
    });
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Owns a running monitor. Dropping the handle cancels it.
pub struct ReminderHandle {
    cancel: CancellationToken,
    banner: watch::Receiver<Option<Notification>>,
    events: broadcast::Sender<Notification>,
    join: Option<JoinHandle<()>>,
}

impl ReminderHandle {
    /// The currently visible notification, if any.
    pub fn banner(&self) -> Option<Notification> {
        self.banner.borrow().clone()
    }

    pub fn watch_banner(&self) -> watch::Receiver<Option<Notification>> {
        self.banner.clone()
    }

    /// Every notification as it is emitted, including ones the banner
    /// overwrote.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    /// Stops scanning. Safe to call any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels and waits for the monitor task to finish.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::warn!(error = %e, "reminder monitor task ended abnormally");
            }
        }
    }
}

impl Drop for ReminderHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskDraft;
    use crate::repository::MemoryTaskRepository;
    use crate::service::task_store::SharedTaskStore;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn shared_store(drafts: &[TaskDraft]) -> SharedTaskStore<MemoryTaskRepository> {
        let mut store = TaskStore::open(MemoryTaskRepository::new());
        for draft in drafts {
            store.add(draft).unwrap();
        }
        store.into_shared()
    }

    /// A wall clock that starts at `base` and follows tokio's (paused) clock.
    fn following_clock(base: NaiveDateTime) -> impl Fn() -> NaiveDateTime + Send + Sync {
        let start = Instant::now();
        move || base + chrono::Duration::from_std(start.elapsed()).unwrap()
    }

    fn settings(repeat_overdue: bool) -> ReminderSettings {
        ReminderSettings {
            repeat_overdue,
            ..ReminderSettings::default()
        }
    }

    fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            out.push(n);
        }
        out
    }

    #[test]
    fn test_due_notifications_includes_boundary() {
        let store = shared_store(&[
            TaskDraft::new("past", "m", "2024-01-01T09:00", "High"),
            TaskDraft::new("exact", "m", "2024-01-01T10:00", "Low"),
            TaskDraft::new("future", "m", "2024-01-01T10:01", "Medium"),
        ]);
        let tasks = store.lock().list().to_vec();

        let due = due_notifications(&tasks, at("2024-01-01 10:00:00"));
        let titles: Vec<_> = due.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["past", "exact"]);
        assert_eq!(due[0].priority, Priority::High);
        assert_eq!(due[0].message, "m");
    }

    #[test]
    fn test_banner_overwrites_and_expires() {
        let t0 = Instant::now();
        let mut banner = ReminderBanner::new(Duration::from_secs(5));
        let first = Notification {
            task_id: Uuid::new_v4(),
            title: "first".into(),
            message: "m".into(),
            priority: Priority::Low,
        };
        let second = Notification {
            title: "second".into(),
            ..first.clone()
        };

        banner.show(first, t0);
        banner.show(second.clone(), t0 + Duration::from_secs(2));
        assert_eq!(banner.current(t0 + Duration::from_secs(3)), Some(&second));
        assert!(!banner.expire(t0 + Duration::from_secs(6)));
        assert!(banner.expire(t0 + Duration::from_secs(7)));
        assert!(banner.current(t0 + Duration::from_secs(7)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overdue_task_shows_banner_then_clears() {
        let store = shared_store(&[TaskDraft::new("pay rent", "today", "2024-01-01T09:00", "High")]);
        let handle = ReminderMonitor::new(store, settings(true))
            .with_clock(following_clock(at("2024-01-01 10:00:00")))
            .spawn();
        let mut banner = handle.watch_banner();
        let started = Instant::now();

        banner.changed().await.unwrap();
        let shown = banner.borrow_and_update().clone().unwrap();
        assert_eq!(shown.title, "pay rent");
        assert_eq!(shown.message, "today");

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(handle.banner().is_some());

        banner.changed().await.unwrap();
        assert!(banner.borrow_and_update().is_none());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_overdue_task_is_reflagged_every_scan() {
        let store = shared_store(&[TaskDraft::new("stretch", "m", "2024-01-01T09:00", "Low")]);
        let handle = ReminderMonitor::new(store, settings(true))
            .with_clock(following_clock(at("2024-01-01 10:00:00")))
            .spawn();
        let mut events = handle.subscribe();

        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(drain(&mut events).len(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_announce_once_when_repeat_disabled() {
        let store = shared_store(&[TaskDraft::new("stretch", "m", "2024-01-01T09:00", "Low")]);
        let handle = ReminderMonitor::new(store, settings(false))
            .with_clock(following_clock(at("2024-01-01 10:00:00")))
            .spawn();
        let mut events = handle.subscribe();

        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(drain(&mut events).len(), 1);

        handle.shutdown().await;
    }

    #[test]
    fn test_announced_ids_follow_the_collection() {
        let store = shared_store(&[
            TaskDraft::new("a", "m", "2024-01-01T09:00", "Low"),
            TaskDraft::new("b", "m", "2024-01-01T09:30", "Low"),
        ]);
        let monitor = ReminderMonitor::new(Arc::clone(&store), settings(false))
            .with_clock(|| at("2024-01-01 10:00:00"));
        let mut announced = HashSet::new();

        assert_eq!(monitor.scan(&mut announced).len(), 2);
        assert!(monitor.scan(&mut announced).is_empty());

        let removed = store.lock().list()[0].id;
        store.lock().remove(&removed).unwrap();
        assert!(monitor.scan(&mut announced).is_empty());
        assert_eq!(announced.len(), 1);
        assert!(!announced.contains(&removed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_future_task_waits_for_its_time() {
        let store = shared_store(&[TaskDraft::new("call", "m", "2024-01-01T10:01:30", "Medium")]);
        let handle = ReminderMonitor::new(Arc::clone(&store), settings(true))
            .with_clock(following_clock(at("2024-01-01 10:00:00")))
            .spawn();
        let mut events = handle.subscribe();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(drain(&mut events).is_empty());

        tokio::time::sleep(Duration::from_secs(60)).await;
        let seen = drain(&mut events);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].task_id, store.lock().list()[0].id);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_sees_tasks_added_later() {
        let store = shared_store(&[]);
        let handle = ReminderMonitor::new(Arc::clone(&store), settings(true))
            .with_clock(following_clock(at("2024-01-01 10:00:00")))
            .spawn();
        let mut events = handle.subscribe();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(drain(&mut events).is_empty());

        store
            .lock()
            .add(&TaskDraft::new("late", "m", "2024-01-01T09:00", "High"))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(drain(&mut events).len(), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_store_skips_scan() {
        let store = shared_store(&[TaskDraft::new("stretch", "m", "2024-01-01T09:00", "Low")]);
        let handle = ReminderMonitor::new(Arc::clone(&store), settings(true))
            .with_clock(following_clock(at("2024-01-01 10:00:00")))
            .spawn();
        let mut events = handle.subscribe();

        {
            let _guard = store.lock();
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        assert!(drain(&mut events).is_empty());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(drain(&mut events).len(), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let store = shared_store(&[TaskDraft::new("stretch", "m", "2024-01-01T09:00", "Low")]);
        let handle = ReminderMonitor::new(store, settings(true))
            .with_clock(following_clock(at("2024-01-01 10:00:00")))
            .spawn();
        let mut events = handle.subscribe();
        let banner = handle.watch_banner();

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        handle.shutdown().await;

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(drain(&mut events).is_empty());
        assert!(banner.borrow().is_none());
    }
}
