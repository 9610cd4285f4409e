//! Per-player countdown clocks.
//!
//! The timer asks the injected scheduler for one delayed tick at a time.
//! Scheduled ticks cannot be cancelled, so every tick carries the
//! generation it was scheduled under and does nothing if the live
//! generation has moved on. Switching to another player or pausing bumps
//! the generation.

use crate::error::SessionError;
use crate::events::{EventDispatcher, EventKind, TimerTick};
use crate::scheduler::{Task, TaskKind, TaskScheduler};
use crate::session::PlayerId;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, trace};

/// Coarse view of the timer's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// No player has been started yet.
    Idle,
    /// Counting down for the player.
    Running(PlayerId),
    /// Paused while the player was active.
    Paused(PlayerId),
}

struct Alarm {
    threshold: i64,
    action: Task,
}

struct ClockState {
    current: Option<PlayerId>,
    times: Vec<u32>,
    generation: u64,
    /// Generation of the one tick allowed to be outstanding.
    armed: Option<u64>,
    paused: bool,
    alarm: Option<Alarm>,
}

struct TimerShared {
    frequency: u32,
    state: Mutex<ClockState>,
    scheduler: Arc<dyn TaskScheduler>,
    events: Arc<EventDispatcher>,
}

/// Countdown clock shared between a session and its scheduled ticks.
///
/// Cloning yields another handle to the same clock.
#[derive(Clone)]
pub struct TurnTimer {
    shared: Arc<TimerShared>,
}

impl TurnTimer {
    /// Creates a stopped timer with every player's time at zero.
    ///
    /// `frequency` is the number of scheduler units between ticks.
    #[instrument(skip(scheduler, events))]
    pub fn new(
        player_count: usize,
        frequency: u32,
        scheduler: Arc<dyn TaskScheduler>,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            shared: Arc::new(TimerShared {
                frequency,
                state: Mutex::new(ClockState {
                    current: None,
                    times: vec![0; player_count],
                    generation: 0,
                    armed: None,
                    paused: false,
                    alarm: None,
                }),
                scheduler,
                events,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets every player's remaining time to `value`.
    #[instrument(skip(self))]
    pub fn reset_all(&self, value: u32) -> &Self {
        self.lock().times.iter_mut().for_each(|time| *time = value);
        self
    }

    /// Sets one player's remaining time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownPlayer` if the player has no clock.
    pub fn set_player_time(&self, player: PlayerId, value: u32) -> Result<(), SessionError> {
        let mut state = self.lock();
        let slot = state
            .times
            .get_mut(player)
            .ok_or(SessionError::UnknownPlayer(player))?;
        *slot = value;
        Ok(())
    }

    /// Scheduler units between ticks.
    pub fn frequency(&self) -> u32 {
        self.shared.frequency
    }

    /// Number of clocks.
    pub fn player_count(&self) -> usize {
        self.lock().times.len()
    }

    /// Player the clock is running (or paused) for.
    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.lock().current
    }

    /// Remaining time for a player.
    pub fn player_time(&self, player: PlayerId) -> Option<u32> {
        self.lock().times.get(player).copied()
    }

    /// Live generation counter.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Current phase of the state machine.
    pub fn phase(&self) -> TimerPhase {
        let state = self.lock();
        match (state.current, state.paused) {
            (None, _) => TimerPhase::Idle,
            (Some(player), false) => TimerPhase::Running(player),
            (Some(player), true) => TimerPhase::Paused(player),
        }
    }

    /// Starts counting down for the first player.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownPlayer` if the player has no clock.
    pub fn start(&self, first_player: PlayerId) -> Result<(), SessionError> {
        self.switch_to(first_player)
    }

    /// Hands the clock to `player`.
    ///
    /// Switching to a different player invalidates every tick scheduled so
    /// far and drops any pending [`invoke_at`](Self::invoke_at) action.
    /// Switching to the active player while its tick is outstanding is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownPlayer` if the player has no clock.
    #[instrument(skip(self))]
    pub fn switch_to(&self, player: PlayerId) -> Result<(), SessionError> {
        let mut state = self.lock();
        if player >= state.times.len() {
            return Err(SessionError::UnknownPlayer(player));
        }
        if state.current != Some(player) {
            state.generation += 1;
            state.alarm = None;
            debug!(generation = state.generation, "Clock switched player");
        }
        state.current = Some(player);
        state.paused = false;

        let generation = state.generation;
        if state.armed == Some(generation) {
            trace!("Tick already outstanding");
            return Ok(());
        }
        state.armed = Some(generation);
        drop(state);

        self.schedule_tick(generation);
        Ok(())
    }

    /// Runs `action` once the active player's remaining time has dropped by
    /// `delay` units from now.
    ///
    /// The action is discarded if the clock switches player first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActivePlayer` before the timer is started.
    pub fn invoke_at<F>(&self, delay: u32, action: F) -> Result<(), SessionError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.lock();
        let current = state.current.ok_or(SessionError::NoActivePlayer)?;
        let threshold = i64::from(state.times[current]) - i64::from(delay);
        state.alarm = Some(Alarm {
            threshold,
            action: Box::new(action),
        });
        Ok(())
    }

    /// Invalidates every outstanding tick without scheduling a new one.
    #[instrument(skip(self))]
    pub fn pause(&self) {
        let mut state = self.lock();
        state.generation += 1;
        if state.current.is_some() {
            state.paused = true;
        }
        debug!(generation = state.generation, "Clock paused");
    }

    /// Resumes ticking for the active player at the current generation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActivePlayer` before the timer is started.
    pub fn restart(&self) -> Result<(), SessionError> {
        let current = self.current_player_id().ok_or(SessionError::NoActivePlayer)?;
        self.switch_to(current)
    }

    fn schedule_tick(&self, generation: u64) {
        let timer = self.clone();
        self.shared.scheduler.run_task_after(
            self.shared.frequency,
            TaskKind::GameEvent,
            Box::new(move || timer.on_tick(generation)),
        );
    }

    fn on_tick(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            trace!(generation, live = state.generation, "Discarding stale tick");
            return;
        }
        state.armed = None;
        if self.shared.events.is_dead() {
            debug!("Session finished, clock stops");
            return;
        }
        let Some(player) = state.current else {
            return;
        };

        let remaining = state.times[player].saturating_sub(1);
        state.times[player] = remaining;

        let alarm = if state
            .alarm
            .as_ref()
            .is_some_and(|alarm| alarm.threshold >= i64::from(remaining))
        {
            state.alarm.take()
        } else {
            None
        };

        let expired = remaining == 0;
        if expired {
            state.alarm = None;
        } else {
            state.armed = Some(generation);
        }
        drop(state);

        self.shared.events.publish(EventKind::TimerTick(TimerTick {
            player,
            new_value: remaining,
            generation,
        }));

        if let Some(alarm) = alarm {
            (alarm.action)();
        }

        if expired {
            info!(player, "Player ran out of time");
            self.shared
                .events
                .publish(EventKind::Elimination { player, generation });
        } else {
            self.schedule_tick(generation);
        }
    }
}

impl std::fmt::Debug for TurnTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TurnTimer")
            .field("frequency", &self.shared.frequency)
            .field("current", &state.current)
            .field("times", &state.times)
            .field("generation", &state.generation)
            .field("paused", &state.paused)
            .finish()
    }
}

/// Renders seconds as `m:ss`, or `h:mm:ss` once an hour is reached.
pub fn format_hms(total_secs: u32) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours == 0 {
        format!("{}:{:02}", minutes, seconds)
    } else {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, FnListener};
    use crate::scheduler::ManualScheduler;

    type Fixture = (TurnTimer, Arc<ManualScheduler>, Arc<Mutex<Vec<EventKind>>>);

    fn fixture(players: usize, frequency: u32) -> Fixture {
        let scheduler = Arc::new(ManualScheduler::new());
        let events = Arc::new(EventDispatcher::new("timer".to_string()));
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        events.subscribe(Arc::new(FnListener(move |event: &Event| {
            sink.lock().unwrap().push(event.kind.clone());
        })));
        let timer = TurnTimer::new(players, frequency, scheduler.clone(), events);
        (timer, scheduler, log)
    }

    #[test]
    fn test_phase_transitions() {
        let (timer, _scheduler, _log) = fixture(2, 1);
        assert_eq!(timer.phase(), TimerPhase::Idle);
        timer.reset_all(5).start(0).unwrap();
        assert_eq!(timer.phase(), TimerPhase::Running(0));
        timer.pause();
        assert_eq!(timer.phase(), TimerPhase::Paused(0));
        timer.restart().unwrap();
        assert_eq!(timer.phase(), TimerPhase::Running(0));
    }

    #[test]
    fn test_unknown_player_rejected() {
        let (timer, scheduler, _log) = fixture(2, 1);
        assert_eq!(timer.switch_to(2), Err(SessionError::UnknownPlayer(2)));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_restart_before_start_fails() {
        let (timer, _scheduler, _log) = fixture(1, 1);
        assert_eq!(timer.restart(), Err(SessionError::NoActivePlayer));
        assert_eq!(timer.invoke_at(1, || {}), Err(SessionError::NoActivePlayer));
    }

    #[test]
    fn test_repeated_switch_to_same_player_keeps_one_chain() {
        let (timer, scheduler, _log) = fixture(2, 1);
        timer.reset_all(10);
        timer.switch_to(0).unwrap();
        timer.switch_to(0).unwrap();
        timer.switch_to(0).unwrap();
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(3);
        assert_eq!(timer.player_time(0), Some(7));
    }

    #[test]
    fn test_invoke_at_fires_once_at_threshold() {
        let (timer, scheduler, _log) = fixture(1, 1);
        timer.reset_all(10).start(0).unwrap();

        let fired = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&fired);
        timer
            .invoke_at(3, move || *counter.lock().unwrap() += 1)
            .unwrap();

        scheduler.advance(2);
        assert_eq!(*fired.lock().unwrap(), 0);
        scheduler.advance(1);
        assert_eq!(*fired.lock().unwrap(), 1);
        scheduler.advance(4);
        assert_eq!(*fired.lock().unwrap(), 1);
    }

    #[test]
    fn test_invoke_at_dropped_on_switch() {
        let (timer, scheduler, _log) = fixture(2, 1);
        timer.reset_all(10).start(0).unwrap();

        let fired = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&fired);
        timer.invoke_at(1, move || *flag.lock().unwrap() = true).unwrap();
        timer.switch_to(1).unwrap();

        scheduler.advance(5);
        assert!(!*fired.lock().unwrap());
    }

    #[test]
    fn test_dead_session_stops_clock() {
        let scheduler = Arc::new(ManualScheduler::new());
        let events = Arc::new(EventDispatcher::new("dead".to_string()));
        let timer = TurnTimer::new(1, 1, scheduler.clone(), Arc::clone(&events));
        timer.reset_all(5).start(0).unwrap();

        events.mark_dead();
        scheduler.advance(3);
        assert_eq!(timer.player_time(0), Some(5));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_listener_can_switch_from_elimination() {
        let scheduler = Arc::new(ManualScheduler::new());
        let events = Arc::new(EventDispatcher::new("handoff".to_string()));
        let timer = TurnTimer::new(2, 1, scheduler.clone(), Arc::clone(&events));
        timer.reset_all(1);

        let handle = timer.clone();
        events.subscribe(Arc::new(FnListener(move |event: &Event| {
            if let EventKind::Elimination { player: 0, .. } = event.kind {
                handle.switch_to(1).unwrap();
            }
        })));

        timer.start(0).unwrap();
        scheduler.advance(1);
        assert_eq!(timer.current_player_id(), Some(1));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0), "0:00");
        assert_eq!(format_hms(65), "1:05");
        assert_eq!(format_hms(3600 + 5 * 60 + 7), "1:05:07");
    }
}
