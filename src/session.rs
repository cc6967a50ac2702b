use anyhow::{Result, anyhow};
use std::time::Duration;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval},
};

use crate::{
    clock::PlaybackClock,
    config,
    protocol::{ClientCommand, ServerEvent},
};

/// Cloneable access to the clock owner.
#[derive(Debug, Clone)]
pub struct ClockHandle {
    commands: mpsc::Sender<ClientCommand>,
    events: broadcast::Sender<ServerEvent>,
}

impl ClockHandle {
    pub async fn send(&self, command: ClientCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("clock owner has stopped"))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }
}

/// Starts the owner task. It runs until every [`ClockHandle`] is dropped
/// and then hands the clock back.
pub fn spawn_clock(
    clock: PlaybackClock,
    settings: &config::Clock,
) -> (ClockHandle, JoinHandle<PlaybackClock>) {
    let (commands_tx, commands_rx) = mpsc::channel(settings.command_queue.max(1));
    let (events_tx, _) = broadcast::channel(settings.broadcast_capacity.max(1));
    let period = Duration::from_millis(settings.tick_period_ms.max(1));

    let handle = ClockHandle {
        commands: commands_tx,
        events: events_tx.clone(),
    };
    let task = tokio::spawn(run_clock(clock, commands_rx, events_tx, period));
    (handle, task)
}

async fn run_clock(
    mut clock: PlaybackClock,
    mut commands: mpsc::Receiver<ClientCommand>,
    events: broadcast::Sender<ServerEvent>,
    period: Duration,
) -> PlaybackClock {
    let origin = Instant::now();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        period_ms = period.as_millis() as u64,
        time_ms = clock.current_time_ms(),
        "clock started"
    );

    loop {
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(command) => {
                    tracing::info!(?command, "clock command");
                    clock.apply(command);
                }
                None => break,
            },
            _ = ticker.tick() => {
                let now_ms = origin.elapsed().as_millis() as i64;
                let time_ms = clock.tick(now_ms);
                // No receivers is fine; late joiners get the next tick.
                let _ = events.send(ServerEvent::SetTime(time_ms));
            }
        }
    }

    tracing::info!(time_ms = clock.current_time_ms(), "clock stopped");
    clock
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    const T0: i64 = 1_000_000;

    fn settings() -> config::Clock {
        config::Clock {
            initial_offset_ms: T0,
            tick_period_ms: 100,
            command_queue: 8,
            broadcast_capacity: 64,
        }
    }

    async fn next_time(rx: &mut broadcast::Receiver<ServerEvent>) -> i64 {
        match rx.recv().await {
            Ok(ServerEvent::SetTime(ms)) => ms,
            Err(RecvError::Lagged(n)) => panic!("lagged by {n}"),
            Err(RecvError::Closed) => panic!("closed"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn paused_clock_rebroadcasts_unchanged_time() {
        let (handle, _task) = spawn_clock(PlaybackClock::new(T0), &settings());
        let mut rx = handle.subscribe();
        for _ in 0..5 {
            assert_eq!(next_time(&mut rx).await, T0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn play_advances_one_period_per_tick() {
        let (handle, _task) = spawn_clock(PlaybackClock::new(T0), &settings());
        let mut rx = handle.subscribe();
        handle.send(ClientCommand::Play).await.unwrap();
        assert_eq!(next_time(&mut rx).await, T0);
        assert_eq!(next_time(&mut rx).await, T0 + 100);
        assert_eq!(next_time(&mut rx).await, T0 + 200);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_then_play_skips_the_paused_gap() {
        let (handle, _task) = spawn_clock(PlaybackClock::new(T0), &settings());
        let mut rx = handle.subscribe();
        handle.send(ClientCommand::Play).await.unwrap();
        assert_eq!(next_time(&mut rx).await, T0);
        assert_eq!(next_time(&mut rx).await, T0 + 100);

        handle.send(ClientCommand::Pause).await.unwrap();
        for _ in 0..10 {
            assert_eq!(next_time(&mut rx).await, T0 + 100);
        }

        handle.send(ClientCommand::Toggle).await.unwrap();
        assert_eq!(next_time(&mut rx).await, T0 + 100);
        assert_eq!(next_time(&mut rx).await, T0 + 200);
    }

    #[tokio::test(start_paused = true)]
    async fn seek_and_speed_apply_before_the_next_tick() {
        let (handle, _task) = spawn_clock(PlaybackClock::new(T0), &settings());
        let mut rx = handle.subscribe();
        handle.send(ClientCommand::Seek(-500)).await.unwrap();
        handle.send(ClientCommand::SetSpeedScale(2.0)).await.unwrap();
        handle.send(ClientCommand::Play).await.unwrap();
        assert_eq!(next_time(&mut rx).await, -500);
        assert_eq!(next_time(&mut rx).await, -300);
        assert_eq!(next_time(&mut rx).await, -100);
    }

    #[tokio::test(start_paused = true)]
    async fn owner_stops_when_handles_are_dropped() {
        let (handle, task) = spawn_clock(PlaybackClock::new(T0), &settings());
        handle.send(ClientCommand::Seek(42)).await.unwrap();
        drop(handle);
        let clock = task.await.unwrap();
        assert_eq!(clock.current_time_ms(), 42);
        assert!(!clock.is_playing());
    }
}
