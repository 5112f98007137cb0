use std::{
    io::{self, Write},
    thread,
    time::Duration,
};

use crate::{
    engine::{EngineState, MediaEngine, MediaSession},
    input::{ControlKey, InputSource},
    resolver::{StreamEndpoint, StreamResolver},
    track::Track,
};

/// How often the controller polls for a pending key press while a stream is
/// active.  Also bounds how long a stop request can go unnoticed.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How one `play` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The stream completed naturally, failed to resolve, or hit an engine
    /// error.  Enclosing sequences may continue.
    Finished,
    /// The user pressed stop.  Enclosing sequences must abort.
    Stopped,
}

impl PlayOutcome {
    pub fn stopped_by_user(self) -> bool {
        matches!(self, PlayOutcome::Stopped)
    }
}

/// States of one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Resolving,
    Playing,
    Paused,
    Ended,
    Stopped,
    Error,
}

/// Outcome of a single engine session, before looping policy is applied.
enum SessionEnd {
    /// The stream completed naturally.  Eligible for track looping.
    Ended,
    /// Engine error or engine-side stop.  Never looped.
    Halted,
    /// The user pressed the stop key.
    UserStop,
}

/// Drives one audio session end to end.  The stream endpoint is resolved
/// once and engine sessions run over it, with pause/resume/stop applied
/// from the input source on a fixed polling interval.
pub struct Player {
    resolver: Box<dyn StreamResolver>,
    engine: Box<dyn MediaEngine>,
    input: Box<dyn InputSource>,
    poll_interval: Duration,
    state: PlaybackState,
}

impl Player {
    pub fn new(
        resolver: Box<dyn StreamResolver>,
        engine: Box<dyn MediaEngine>,
        input: Box<dyn InputSource>,
    ) -> Self {
        Self {
            resolver,
            engine,
            input,
            poll_interval: POLL_INTERVAL,
            state: PlaybackState::Idle,
        }
    }

    /// Overrides the input polling interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Plays `track` until the stream ends or the user stops it.  The
    /// endpoint is resolved exactly once, even when `loop_track` repeats
    /// the stream.  Returns `Stopped` if and only if the user stopped it.
    pub fn play(&mut self, track: &Track, loop_track: bool) -> PlayOutcome {
        println!("Getting audio stream for: {}...", track.title);
        self.set_state(PlaybackState::Resolving);
        let endpoint = match self.resolver.resolve(&track.link) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                log::error!("failed to resolve {:?}: {}", track.link, err);
                println!("Error fetching audio stream: {}", err);
                self.set_state(PlaybackState::Idle);
                return PlayOutcome::Finished;
            }
        };
        loop {
            match self.play_stream(&endpoint) {
                SessionEnd::UserStop => {
                    self.set_state(PlaybackState::Idle);
                    return PlayOutcome::Stopped;
                }
                SessionEnd::Ended if loop_track => {
                    println!("Looping the song...");
                }
                SessionEnd::Ended | SessionEnd::Halted => {
                    self.set_state(PlaybackState::Idle);
                    return PlayOutcome::Finished;
                }
            }
        }
    }

    /// One engine session over the resolved endpoint.
    fn play_stream(&mut self, endpoint: &StreamEndpoint) -> SessionEnd {
        let mut session = match self.engine.new_session(endpoint) {
            Ok(session) => session,
            Err(err) => {
                log::error!("failed to open a media session: {}", err);
                println!("Playback error: {}", err);
                self.set_state(PlaybackState::Error);
                return SessionEnd::Halted;
            }
        };
        if let Err(err) = self.input.begin_session() {
            log::warn!("playback controls unavailable: {}", err);
        }
        let end = self.run_session(session.as_mut());
        self.input.end_session();
        end
    }

    fn run_session(&mut self, session: &mut dyn MediaSession) -> SessionEnd {
        if let Err(err) = session.play() {
            log::error!("failed to start playback: {}", err);
            println!("Playback error: {}", err);
            self.set_state(PlaybackState::Error);
            return SessionEnd::Halted;
        }
        self.set_state(PlaybackState::Playing);
        print!("Playing... press 'p' to pause/resume, 's' to stop.\r\n");
        loop {
            match session.state() {
                EngineState::Ended => {
                    self.set_state(PlaybackState::Ended);
                    print!("\r\n");
                    return SessionEnd::Ended;
                }
                EngineState::Stopped => {
                    // The engine stopped on its own, without a stop key.
                    self.set_state(PlaybackState::Stopped);
                    print!("\r\n");
                    return SessionEnd::Halted;
                }
                EngineState::Error => {
                    log::error!("engine reported an error state");
                    self.set_state(PlaybackState::Error);
                    print!("\r\nPlayback error.\r\n");
                    return SessionEnd::Halted;
                }
                EngineState::Playing | EngineState::Paused => {}
            }
            match self.input.poll_key(self.poll_interval) {
                Ok(Some(ControlKey::TogglePause)) => self.pause_or_resume(session),
                Ok(Some(ControlKey::Stop)) => {
                    session.stop();
                    self.set_state(PlaybackState::Stopped);
                    print!("\r\nPlayback stopped.\r\n");
                    return SessionEnd::UserStop;
                }
                Ok(None) => {}
                Err(err) => {
                    // Polling doubles as the suspension point, keep the
                    // cadence even when the input backend fails.
                    log::warn!("key polling failed: {}", err);
                    thread::sleep(self.poll_interval);
                }
            }
        }
    }

    fn pause_or_resume(&mut self, session: &mut dyn MediaSession) {
        match self.state {
            PlaybackState::Playing => self.pause(session),
            PlaybackState::Paused => self.resume(session),
            _ => {
                log::warn!("invalid state transition");
            }
        }
    }

    fn pause(&mut self, session: &mut dyn MediaSession) {
        log::info!("pausing playback");
        session.pause();
        self.set_state(PlaybackState::Paused);
        show_status(" Paused...  ");
    }

    fn resume(&mut self, session: &mut dyn MediaSession) {
        log::info!("resuming playback");
        session.resume();
        self.set_state(PlaybackState::Playing);
        show_status(" Playing...");
    }

    fn set_state(&mut self, state: PlaybackState) {
        log::debug!("playback state: {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

/// Rewrites the current line, used while the terminal is in raw mode.
fn show_status(status: &str) {
    print!("\r{}", status);
    let _ = io::stdout().flush();
}
