use std::{
    error,
    io::{self, BufReader},
};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tempfile::NamedTempFile;

use crate::{
    engine::{EngineState, MediaEngine, MediaSession},
    error::Error,
    resolver::StreamEndpoint,
    util,
};

/// Media engine backed by the rodio output stack.  Streams are spooled to a
/// temporary file first, because decoding needs seekable input.
pub struct RodioEngine {
    /// Dropping the stream closes the output device, so it lives as long as
    /// the engine.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    agent: ureq::Agent,
}

impl RodioEngine {
    /// Opens the default audio output device.
    pub fn open(proxy_url: Option<&str>) -> Result<Self, Error> {
        let (stream, handle) = OutputStream::try_default().map_err(engine_error)?;
        Ok(Self {
            _stream: stream,
            handle,
            agent: util::default_ureq_agent_builder(proxy_url).build().into(),
        })
    }

    fn spool(&self, endpoint: &StreamEndpoint) -> Result<NamedTempFile, Error> {
        let response = self
            .agent
            .get(endpoint.url.as_str())
            .call()
            .map_err(engine_error)?;
        let mut spool = NamedTempFile::new()?;
        let mut reader = response.into_body().into_reader();
        let bytes = io::copy(&mut reader, &mut spool)?;
        log::debug!("spooled {} bytes of audio", bytes);
        Ok(spool)
    }
}

impl MediaEngine for RodioEngine {
    fn new_session(&mut self, endpoint: &StreamEndpoint) -> Result<Box<dyn MediaSession>, Error> {
        let spool = self.spool(endpoint)?;
        let source = Decoder::new(BufReader::new(spool.reopen()?)).map_err(engine_error)?;
        let sink = Sink::try_new(&self.handle).map_err(engine_error)?;
        sink.pause();
        sink.append(source);
        Ok(Box::new(RodioSession {
            sink,
            _spool: spool,
            stopped: false,
        }))
    }
}

struct RodioSession {
    sink: Sink,
    /// Keeps the downloaded audio on disk for the lifetime of the session.
    _spool: NamedTempFile,
    stopped: bool,
}

impl MediaSession for RodioSession {
    fn play(&mut self) -> Result<(), Error> {
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.sink.stop();
    }

    fn state(&self) -> EngineState {
        if self.stopped {
            EngineState::Stopped
        } else if self.sink.empty() {
            EngineState::Ended
        } else if self.sink.is_paused() {
            EngineState::Paused
        } else {
            EngineState::Playing
        }
    }
}

fn engine_error(err: impl error::Error + Send + 'static) -> Error {
    Error::EngineError(Box::new(err))
}
