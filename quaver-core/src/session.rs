use crate::{
    error::Error,
    player::{PlayOutcome, Player},
    store::PlaylistStore,
    track::Track,
};

/// Sequences playback over single tracks and playlists, and mediates all
/// playlist mutations.  One orchestrator owns the player and the store for
/// the whole interactive session.
pub struct SessionOrchestrator {
    player: Player,
    store: PlaylistStore,
}

impl SessionOrchestrator {
    pub fn new(player: Player, store: PlaylistStore) -> Self {
        Self { player, store }
    }

    pub fn store(&self) -> &PlaylistStore {
        &self.store
    }

    pub fn play_single(&mut self, track: &Track, loop_track: bool) -> PlayOutcome {
        self.player.play(track, loop_track)
    }

    /// Plays the named playlist in order.  A user stop aborts the sequence
    /// immediately; `loop_playlist` restarts the whole sequence after a
    /// natural run-through.  Track-level looping stays off here, looping a
    /// playlist replays the sequence rather than one song.
    pub fn play_playlist(&mut self, name: &str, loop_playlist: bool) -> Result<PlayOutcome, Error> {
        let tracks = self
            .store
            .get(name)
            .ok_or_else(|| Error::PlaylistNotFound(name.to_string()))?
            .to_vec();
        if tracks.is_empty() {
            println!("Playlist '{}' is empty.", name);
            return Ok(PlayOutcome::Finished);
        }
        loop {
            for (position, track) in tracks.iter().enumerate() {
                println!("\nPlaying from '{}' ({}/{})", name, position + 1, tracks.len());
                if self.player.play(track, false).stopped_by_user() {
                    log::info!("playlist {:?} stopped by user", name);
                    return Ok(PlayOutcome::Stopped);
                }
            }
            if !loop_playlist {
                return Ok(PlayOutcome::Finished);
            }
            println!("\nPlaylist '{}' finished. Looping...", name);
        }
    }

    pub fn add_track(&mut self, name: &str, track: Track) -> Result<usize, Error> {
        let size = self.store.add_track(name, track)?;
        log::info!("added a track to playlist {:?}, {} songs now", name, size);
        Ok(size)
    }

    pub fn remove_track(&mut self, name: &str, index: usize) -> Result<Track, Error> {
        let track = self.store.remove_track(name, index)?;
        log::info!("removed {:?} from playlist {:?}", track.title, name);
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

    use super::*;
    use crate::{
        engine::{EngineState, MediaEngine, MediaSession},
        input::{ControlKey, InputSource},
        resolver::{StreamEndpoint, StreamResolver},
    };

    struct CountingResolver {
        calls: Rc<Cell<usize>>,
    }

    impl StreamResolver for CountingResolver {
        fn resolve(&self, _link: &str) -> Result<StreamEndpoint, Error> {
            self.calls.set(self.calls.get() + 1);
            Ok(StreamEndpoint {
                url: "https://cdn.example/stream".into(),
            })
        }
    }

    /// Every session plays for one poll tick and then ends, unless stopped.
    struct NaturalEngine {
        sessions: Rc<Cell<usize>>,
    }

    impl MediaEngine for NaturalEngine {
        fn new_session(
            &mut self,
            _endpoint: &StreamEndpoint,
        ) -> Result<Box<dyn MediaSession>, Error> {
            self.sessions.set(self.sessions.get() + 1);
            Ok(Box::new(NaturalSession {
                polled: Cell::new(false),
                stopped: Cell::new(false),
            }))
        }
    }

    struct NaturalSession {
        polled: Cell<bool>,
        stopped: Cell<bool>,
    }

    impl MediaSession for NaturalSession {
        fn play(&mut self) -> Result<(), Error> {
            Ok(())
        }

        fn pause(&mut self) {}

        fn resume(&mut self) {}

        fn stop(&mut self) {
            self.stopped.set(true);
        }

        fn state(&self) -> EngineState {
            if self.stopped.get() {
                EngineState::Stopped
            } else if self.polled.get() {
                EngineState::Ended
            } else {
                self.polled.set(true);
                EngineState::Playing
            }
        }
    }

    struct QueuedInput {
        keys: RefCell<VecDeque<Option<ControlKey>>>,
    }

    impl InputSource for QueuedInput {
        fn begin_session(&mut self) -> Result<(), Error> {
            Ok(())
        }

        fn poll_key(&mut self, _timeout: Duration) -> Result<Option<ControlKey>, Error> {
            Ok(self.keys.borrow_mut().pop_front().unwrap_or(None))
        }

        fn end_session(&mut self) {}
    }

    struct Counters {
        resolves: Rc<Cell<usize>>,
        sessions: Rc<Cell<usize>>,
    }

    fn make_orchestrator(
        store: PlaylistStore,
        keys: Vec<Option<ControlKey>>,
    ) -> (SessionOrchestrator, Counters) {
        let resolves = Rc::new(Cell::new(0));
        let sessions = Rc::new(Cell::new(0));
        let player = Player::new(
            Box::new(CountingResolver {
                calls: resolves.clone(),
            }),
            Box::new(NaturalEngine {
                sessions: sessions.clone(),
            }),
            Box::new(QueuedInput {
                keys: RefCell::new(keys.into()),
            }),
        )
        .with_poll_interval(Duration::ZERO);
        (
            SessionOrchestrator::new(player, store),
            Counters { resolves, sessions },
        )
    }

    fn track(title: &str) -> Track {
        Track::new(title, format!("https://example.com/{}", title), "3:35")
    }

    fn store_with_tracks(
        dir: &tempfile::TempDir,
        name: &str,
        titles: &[&str],
    ) -> Result<PlaylistStore, Error> {
        let mut store = PlaylistStore::open(dir.path().join("playlists.json"));
        for title in titles {
            store.add_track(name, track(title))?;
        }
        Ok(store)
    }

    #[test]
    fn stop_aborts_the_playlist_after_the_current_track() -> Result<(), Error> {
        let dir = tempfile::tempdir()?;
        let store = store_with_tracks(&dir, "mix", &["a", "b", "c", "d"])?;
        // First track ends naturally, stop arrives during the second.
        let keys = vec![None, Some(ControlKey::Stop)];
        let (mut orchestrator, counters) = make_orchestrator(store, keys);

        let outcome = orchestrator.play_playlist("mix", true)?;

        assert!(outcome.stopped_by_user());
        assert_eq!(counters.resolves.get(), 2);
        assert_eq!(counters.sessions.get(), 2);
        Ok(())
    }

    #[test]
    fn playlist_plays_each_track_once_without_loop() -> Result<(), Error> {
        let dir = tempfile::tempdir()?;
        let store = store_with_tracks(&dir, "mix", &["a", "b"])?;
        let (mut orchestrator, counters) = make_orchestrator(store, vec![]);

        let outcome = orchestrator.play_playlist("mix", false)?;

        assert_eq!(outcome, PlayOutcome::Finished);
        assert_eq!(counters.resolves.get(), 2);
        Ok(())
    }

    #[test]
    fn looped_playlist_restarts_until_stopped() -> Result<(), Error> {
        let dir = tempfile::tempdir()?;
        let store = store_with_tracks(&dir, "mix", &["a", "b"])?;
        // One full pass, then a stop during the repeated first track.
        let keys = vec![None, None, Some(ControlKey::Stop)];
        let (mut orchestrator, counters) = make_orchestrator(store, keys);

        let outcome = orchestrator.play_playlist("mix", true)?;

        assert!(outcome.stopped_by_user());
        assert_eq!(counters.resolves.get(), 3);
        Ok(())
    }

    #[test]
    fn empty_playlist_finishes_without_resolving() -> Result<(), Error> {
        let dir = tempfile::tempdir()?;
        let mut store = store_with_tracks(&dir, "mix", &["a"])?;
        store.remove_track("mix", 1)?;
        let (mut orchestrator, counters) = make_orchestrator(store, vec![]);

        let outcome = orchestrator.play_playlist("mix", false)?;

        assert_eq!(outcome, PlayOutcome::Finished);
        assert_eq!(counters.resolves.get(), 0);
        Ok(())
    }

    #[test]
    fn unknown_playlist_is_an_error() -> Result<(), Error> {
        let dir = tempfile::tempdir()?;
        let store = PlaylistStore::open(dir.path().join("playlists.json"));
        let (mut orchestrator, _) = make_orchestrator(store, vec![]);

        assert!(matches!(
            orchestrator.play_playlist("nope", false),
            Err(Error::PlaylistNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn mutations_flow_through_the_store() -> Result<(), Error> {
        let dir = tempfile::tempdir()?;
        let store = PlaylistStore::open(dir.path().join("playlists.json"));
        let (mut orchestrator, _) = make_orchestrator(store, vec![]);

        assert_eq!(orchestrator.add_track("mix", track("a"))?, 1);
        assert_eq!(orchestrator.add_track("mix", track("b"))?, 2);
        let removed = orchestrator.remove_track("mix", 1)?;
        assert_eq!(removed.title, "a");
        assert_eq!(orchestrator.store().get("mix").expect("playlist").len(), 1);
        Ok(())
    }
}
