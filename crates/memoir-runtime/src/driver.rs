//! Runs a [`FlyoverSequencer`] on a single tokio task.
//!
//! The task owns the sequencer outright and waits on two things at once:
//! the command channel fed by [`FlyoverHandle`], and the session's pending
//! deadline.  Commands are polled first, so a `start` that arrives at the
//! same instant as the old session's deadline always wins and the old tick
//! never runs.  No transition awaits anything, so every command and tick
//! runs to completion before the next one begins.
//!
//! After every transition the task publishes a fresh [`PlaybackSnapshot`] on
//! a `watch` channel.

use memoir_map::OverlayHandle;
use memoir_types::{FlyoverError, Year};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::sequencer::{FlyoverSequencer, PlaybackSnapshot};

/// A request for the flyover task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start(Year),
    Pause,
    Resume(Year),
    ActivateOverlay(OverlayHandle),
    DismissFullscreen,
    Shutdown,
}

/// Anything that can begin a flyover for a year.
pub trait FlyoverControl {
    /// # Errors
    ///
    /// Returns [`FlyoverError::Channel`] if the flyover is no longer running.
    fn start(&self, year: Year) -> Result<(), FlyoverError>;
}

/// Cloneable, non-blocking control handle for a spawned flyover.
#[derive(Debug, Clone)]
pub struct FlyoverHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<PlaybackSnapshot>,
}

impl FlyoverHandle {
    /// Queue `command` for the flyover task.
    ///
    /// # Errors
    ///
    /// Returns [`FlyoverError::Channel`] once the task has stopped.
    pub fn send(&self, command: Command) -> Result<(), FlyoverError> {
        self.commands
            .send(command)
            .map_err(|e| FlyoverError::Channel(format!("flyover stopped; dropped {:?}", e.0)))
    }

    pub fn pause(&self) -> Result<(), FlyoverError> {
        self.send(Command::Pause)
    }

    pub fn resume(&self, year: Year) -> Result<(), FlyoverError> {
        self.send(Command::Resume(year))
    }

    pub fn activate_overlay(&self, handle: OverlayHandle) -> Result<(), FlyoverError> {
        self.send(Command::ActivateOverlay(handle))
    }

    pub fn dismiss_fullscreen(&self) -> Result<(), FlyoverError> {
        self.send(Command::DismissFullscreen)
    }

    /// Ask the task to tear down the map and exit.
    pub fn shutdown(&self) -> Result<(), FlyoverError> {
        self.send(Command::Shutdown)
    }

    /// Latest published snapshot.
    pub fn status(&self) -> PlaybackSnapshot {
        self.status.borrow().clone()
    }

    /// A receiver that is notified after every transition.
    pub fn subscribe_status(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.status.clone()
    }
}

impl FlyoverControl for FlyoverHandle {
    fn start(&self, year: Year) -> Result<(), FlyoverError> {
        self.send(Command::Start(year))
    }
}

/// Move `sequencer` onto a new tokio task.
///
/// Must be called from within a tokio runtime.  The task exits after
/// [`Command::Shutdown`] or once every [`FlyoverHandle`] has been dropped.
pub fn spawn_flyover(sequencer: FlyoverSequencer) -> (FlyoverHandle, JoinHandle<()>) {
    let (commands, rx) = mpsc::unbounded_channel();
    let (status_tx, status) = watch::channel(sequencer.snapshot());
    let task = tokio::spawn(run(sequencer, rx, status_tx));
    (FlyoverHandle { commands, status }, task)
}

async fn run(
    mut sequencer: FlyoverSequencer,
    mut commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<PlaybackSnapshot>,
) {
    info!("flyover task started");
    loop {
        let deadline = sequencer.next_deadline();
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => apply(&mut sequencer, command, Instant::now()),
            },
            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                sequencer.tick(Instant::now());
            }
        }
        status.send_replace(sequencer.snapshot());
    }
    sequencer.shutdown();
    status.send_replace(sequencer.snapshot());
    info!("flyover task stopped");
}

fn apply(sequencer: &mut FlyoverSequencer, command: Command, now: Instant) {
    debug!(?command, "flyover command");
    match command {
        Command::Start(year) => sequencer.start(year, now),
        Command::Pause => {
            sequencer.pause();
        }
        Command::Resume(year) => {
            sequencer.resume(year, now);
        }
        Command::ActivateOverlay(handle) => {
            sequencer.activate_overlay(handle, now);
        }
        Command::DismissFullscreen => {
            sequencer.dismiss_fullscreen(now);
        }
        Command::Shutdown => sequencer.shutdown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use memoir_catalog::Catalog;
    use memoir_map::SimMap;
    use memoir_types::{LngLat, MemoryRecord, PlaybackState};

    use crate::sequencer::FlyoverConfig;

    const DWELL: Duration = Duration::from_secs(8);
    const START_DELAY: Duration = Duration::from_secs(2);

    fn scenario_catalog() -> Arc<Catalog> {
        let rec = |year, caption: &str, lng| {
            MemoryRecord::new(LngLat::new(lng, 10.0), format!("{caption}.jpg"), caption, year)
        };
        Arc::new(
            Catalog::new(vec![
                rec(2022, "c1", 1.0),
                rec(2023, "c2", 2.0),
                rec(2022, "c3", 3.0),
            ])
            .unwrap(),
        )
    }

    fn spawn() -> (FlyoverHandle, JoinHandle<()>, SimMap) {
        let sim = SimMap::new();
        let sequencer = FlyoverSequencer::new(
            scenario_catalog(),
            Box::new(sim.clone()),
            Box::new(sim.clone()),
            FlyoverConfig::default(),
        );
        let (handle, task) = spawn_flyover(sequencer);
        (handle, task, sim)
    }

    /// Let the flyover task drain its queue without crossing a deadline.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn captions(sim: &SimMap) -> Vec<String> {
        sim.log()
            .created
            .iter()
            .map(|o| {
                let start = o.html.find("<p>").map_or(0, |i| i + 3);
                let end = o.html.find("</p>").unwrap_or(o.html.len());
                o.html[start..end].to_string()
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_dwell() {
        let (handle, _task, sim) = spawn();
        handle.start(2022).unwrap();
        settle().await;
        assert!(sim.log().flights.is_empty());

        tokio::time::sleep(START_DELAY).await;
        assert_eq!(sim.log().flights.len(), 1);
        tokio::time::sleep(DWELL).await;
        assert_eq!(sim.log().flights.len(), 2);
        tokio::time::sleep(DWELL).await;
        assert_eq!(captions(&sim), vec!["c1", "c3", "c1"]);
        assert_eq!(sim.log().max_live_overlays, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_before_first_tick_never_shows_old_year() {
        let (handle, _task, sim) = spawn();
        handle.start(2022).unwrap();
        handle.start(2023).unwrap();
        settle().await;
        assert!(sim.log().created.is_empty());

        tokio::time::sleep(START_DELAY + DWELL * 3).await;
        let shown = captions(&sim);
        assert_eq!(shown, vec!["c2"; 4]);
        assert!(sim.log().flights.iter().all(|f| f.center == LngLat::new(2.0, 10.0)));
        assert_eq!(handle.status().year, Some(2023));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_year_stops_the_old_session() {
        let (handle, _task, sim) = spawn();
        handle.start(2022).unwrap();
        settle().await;
        tokio::time::sleep(START_DELAY).await;
        assert_eq!(sim.log().flights.len(), 1);
        handle.start(1999).unwrap();
        settle().await;

        tokio::time::sleep(DWELL * 4).await;
        let log = sim.log();
        assert_eq!(log.flights.len(), 1);
        assert_eq!(log.live_overlay_count(), 0);
        assert_eq!(handle.status().state, PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_until_resume() {
        let (handle, _task, sim) = spawn();
        handle.start(2022).unwrap();
        tokio::time::sleep(START_DELAY + Duration::from_millis(10)).await;
        handle.pause().unwrap();
        settle().await;
        assert_eq!(handle.status().state, PlaybackState::Paused);

        tokio::time::sleep(DWELL * 5).await;
        assert_eq!(sim.log().flights.len(), 1);

        handle.resume(2022).unwrap();
        settle().await;
        assert_eq!(handle.status().state, PlaybackState::Playing);
        assert_eq!(captions(&sim), vec!["c1"]);

        tokio::time::sleep(DWELL).await;
        assert_eq!(captions(&sim), vec!["c1", "c3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn activation_round_trip_through_handle() {
        let (handle, _task, sim) = spawn();
        handle.start(2023).unwrap();
        tokio::time::sleep(START_DELAY + Duration::from_millis(10)).await;

        let overlay = handle.status().overlay.expect("popup visible");
        handle.activate_overlay(overlay).unwrap();
        settle().await;
        let status = handle.status();
        assert_eq!(status.state, PlaybackState::Paused);
        assert_eq!(status.fullscreen.map(|r| r.photo), Some("c2.jpg".to_string()));

        handle.dismiss_fullscreen().unwrap();
        settle().await;
        assert!(sim.log().fullscreen.is_none());
        let status = handle.status();
        assert_eq!(status.state, PlaybackState::Playing);
        assert_eq!(status.current.map(|r| r.caption), Some("c2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn status_watch_notifies_on_transition() {
        let (handle, _task, _sim) = spawn();
        let mut status = handle.subscribe_status();
        handle.start(2022).unwrap();
        status.changed().await.unwrap();
        assert_eq!(status.borrow().state, PlaybackState::Playing);
        assert_eq!(status.borrow().len, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_clears_map_and_closes_channel() {
        let (handle, task, sim) = spawn();
        handle.start(2022).unwrap();
        tokio::time::sleep(START_DELAY + Duration::from_millis(10)).await;
        assert_eq!(sim.log().live_overlay_count(), 1);

        handle.shutdown().unwrap();
        task.await.unwrap();
        assert_eq!(sim.log().live_overlay_count(), 0);
        assert_eq!(handle.status().state, PlaybackState::Idle);
        assert!(matches!(handle.start(2023), Err(FlyoverError::Channel(_))));
    }

    #[tokio::test]
    async fn dropping_every_handle_stops_the_task() {
        let (handle, task, _sim) = spawn();
        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("task exits")
            .unwrap();
    }
}
