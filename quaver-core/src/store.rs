use std::{
    collections::BTreeMap,
    fs,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{error::Error, track::Track};

/// Mapping from playlist name to its tracks, in playback order.
pub type Playlists = BTreeMap<String, Vec<Track>>;

/// Durable store of named playlists, backed by a single JSON file.  The
/// whole mapping is kept in memory and written back after every mutation.
pub struct PlaylistStore {
    path: PathBuf,
    playlists: Playlists,
}

impl PlaylistStore {
    /// Opens the store at `path`, loading all playlists into memory.  A
    /// missing or unreadable file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let playlists = load_playlists(&path);
        Self { path, playlists }
    }

    /// Re-reads the backing file, picking up external writes.
    pub fn reload(&mut self) {
        self.playlists = load_playlists(&self.path);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn playlists(&self) -> &Playlists {
        &self.playlists
    }

    pub fn names(&self) -> Vec<String> {
        self.playlists.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&[Track]> {
        self.playlists.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    /// Appends `track` to the named playlist, creating the playlist if it
    /// does not exist yet, and persists the store.  Returns the resulting
    /// playlist size.  A failed persist rolls the append back, so memory
    /// and disk never disagree.
    pub fn add_track(&mut self, name: &str, track: Track) -> Result<usize, Error> {
        let created = !self.playlists.contains_key(name);
        let playlist = self.playlists.entry(name.to_string()).or_default();
        playlist.push(track);
        let len = playlist.len();
        if let Err(err) = self.save() {
            if let Some(playlist) = self.playlists.get_mut(name) {
                playlist.pop();
            }
            if created {
                self.playlists.remove(name);
            }
            return Err(err);
        }
        Ok(len)
    }

    /// Removes the track at 1-based `index` from the named playlist and
    /// persists the store.  Out-of-range indices leave the store untouched.
    pub fn remove_track(&mut self, name: &str, index: usize) -> Result<Track, Error> {
        let playlist = self
            .playlists
            .get_mut(name)
            .ok_or_else(|| Error::PlaylistNotFound(name.to_string()))?;
        if index < 1 || index > playlist.len() {
            return Err(Error::TrackIndexOutOfRange {
                index,
                len: playlist.len(),
            });
        }
        let track = playlist.remove(index - 1);
        if let Err(err) = self.save() {
            if let Some(playlist) = self.playlists.get_mut(name) {
                playlist.insert(index - 1, track);
            }
            return Err(err);
        }
        Ok(track)
    }

    /// Writes the full mapping back, replacing prior contents.  Serializes
    /// into a sibling temporary file and renames it over the target, so a
    /// crash mid-write cannot clobber the previous contents.
    pub fn save(&self) -> Result<(), Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(tmp.as_file(), &self.playlists)?;
        tmp.persist(&self.path)
            .map_err(|err| Error::IoError(err.error))?;
        log::debug!("saved {} playlists to {:?}", self.playlists.len(), self.path);
        Ok(())
    }
}

fn load_playlists(path: &Path) -> Playlists {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Playlists::new();
        }
        Err(err) => {
            log::warn!("failed to open playlist file {:?}: {}", path, err);
            return Playlists::new();
        }
    };
    match serde_json::from_reader(file) {
        Ok(playlists) => playlists,
        Err(err) => {
            log::warn!("ignoring unreadable playlist file {:?}: {}", path, err);
            Playlists::new()
        }
    }
}
