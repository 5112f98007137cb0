use crate::{error::Error, resolver::StreamEndpoint};

#[cfg(feature = "rodio")]
pub mod rodio;

#[cfg(feature = "rodio")]
pub type DefaultMediaEngine = rodio::RodioEngine;

/// Observable state of a media session, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Playing,
    Paused,
    Ended,
    Stopped,
    Error,
}

/// External audio backend.  Turns resolved stream endpoints into playable
/// sessions; all decoding and transport happens behind this seam.
pub trait MediaEngine {
    fn new_session(&mut self, endpoint: &StreamEndpoint) -> Result<Box<dyn MediaSession>, Error>;
}

/// One playable stream.  Created stopped; `play` starts output.
pub trait MediaSession {
    fn play(&mut self) -> Result<(), Error>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn state(&self) -> EngineState;
}
