use std::sync::Arc;
use std::time::Duration;

use log::{info, trace};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::clock::Clock;
use super::list::IpBlacklist;

/// Wake interval used when none is configured.
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(1);

/// Background task evicting expired entries from an [`IpBlacklist`].
///
/// The task holds the blacklist write lock only for the duration of a single
/// eviction pass. It stops when [`Reaper::shutdown`] is called or when the
/// `Reaper` is dropped.
pub struct Reaper {
    exit_tx: watch::Sender<()>,
    handle: JoinHandle<()>,
}

impl Reaper {
    /// Spawns the reaper on the current tokio runtime.
    pub fn spawn<C>(list: Arc<IpBlacklist<C>>, interval: Duration) -> Self
    where
        C: Clock + 'static,
    {
        let (exit_tx, exit_rx) = watch::channel(());
        // tokio intervals panic on a zero period
        let interval = interval.max(Duration::from_millis(1));
        let handle = tokio::spawn(Self::run(list, interval, exit_rx));
        Self { exit_tx, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signals the task to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.exit_tx.send(());
        let _ = self.handle.await;
    }

    async fn run<C>(list: Arc<IpBlacklist<C>>, interval: Duration, mut exit_rx: watch::Receiver<()>)
    where
        C: Clock + 'static,
    {
        info!("Reaper started, waking every {:?}", interval);

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = exit_rx.changed() => {
                    info!("Reaper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let evicted = list.evict_expired();
                    trace!("Reaper pass evicted {} entries, {} left", evicted, list.len());
                }
            }
        }
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::blacklist::testing::{clock_at, MockWallClock, Time};

    fn setup(start: i64) -> (Arc<IpBlacklist<MockWallClock>>, Time) {
        let time = Time::new(start);
        (Arc::new(IpBlacklist::with_clock(clock_at(&time))), time)
    }

    #[tokio::test(start_paused = true)]
    async fn evict_entries_after_they_expire() {
        let (list, time) = setup(0);
        list.add("1.2.3.4", 2).unwrap();
        list.add("5.6.7.8", 0).unwrap();

        let reaper = Reaper::spawn(list.clone(), Duration::from_secs(1));

        time.set(1);
        time::sleep(Duration::from_millis(1500)).await;
        assert!(list.contains("1.2.3.4"));

        time.set(3);
        time::sleep(Duration::from_secs(1)).await;
        assert!(!list.contains("1.2.3.4"));
        assert!(list.contains("5.6.7.8"));

        reaper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn keep_permanent_entries_forever() {
        let (list, time) = setup(0);
        list.add("5.6.7.8", 0).unwrap();

        let reaper = Reaper::spawn(list.clone(), Duration::from_secs(1));

        time.set(1_000_000);
        time::sleep(Duration::from_secs(5)).await;
        assert!(list.contains("5.6.7.8"));

        reaper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_evicting_after_shutdown() {
        let (list, time) = setup(0);
        let reaper = Reaper::spawn(list.clone(), Duration::from_secs(1));
        reaper.shutdown().await;

        list.add("1.2.3.4", 1).unwrap();
        time.set(10);
        time::sleep(Duration::from_secs(5)).await;

        assert!(list.contains("1.2.3.4"));
        assert_eq!(list.evict_expired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_when_dropped() {
        let (list, _) = setup(0);
        let reaper = Reaper::spawn(list.clone(), Duration::from_secs(1));
        let handle_finished = {
            let Reaper { exit_tx, handle } = reaper;
            drop(exit_tx);
            handle
        };

        assert!(handle_finished.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn accept_a_zero_interval() {
        let (list, time) = setup(0);
        list.add("1.2.3.4", 1).unwrap();

        let reaper = Reaper::spawn(list.clone(), Duration::ZERO);
        time.set(5);
        time::sleep(Duration::from_millis(10)).await;

        assert!(!list.contains("1.2.3.4"));
        assert!(!reaper.is_finished());
        reaper.shutdown().await;
    }
}
