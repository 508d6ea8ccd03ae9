//! Saves and restores the poster layout of each wall through a [`LayoutStore`].
//!
//! A layout is the durable projection of a wall's posters: an ordered JSON array of
//! `{width, height, position, texture?}` records stored under one key per wall.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_platform::collections::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::RoomError,
    room::{Poster, Room, WallId},
};

/// A key-value blob store holding serialized layouts.
pub trait LayoutStore: Send + Sync + 'static {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, RoomError>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), RoomError>;
    /// Forget `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), RoomError>;
}

/// Keeps layouts in memory for the lifetime of the app.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LayoutStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, RoomError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RoomError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), RoomError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Keeps each layout in `<dir>/<key>.json`. A missing file is an absent key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store layouts under `dir`, which is created on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory layouts are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LayoutStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, RoomError> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RoomError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), RoomError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// One persisted poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPoster {
    /// Width along the wall.
    pub width: f32,
    /// Height up the wall.
    pub height: f32,
    /// Position in the wall's local frame.
    pub position: Vec3,
    /// Texture asset path. Older layouts do not carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
}

impl From<&Poster> for PersistedPoster {
    fn from(poster: &Poster) -> Self {
        Self {
            width: poster.width(),
            height: poster.height(),
            position: poster.position(),
            texture: poster.texture().map(str::to_owned),
        }
    }
}

/// Saves, loads, and clears per-wall layouts in an injected [`LayoutStore`].
#[derive(Resource)]
pub struct LayoutPersistence {
    store: Box<dyn LayoutStore>,
    key_prefix: String,
}

impl fmt::Debug for LayoutPersistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutPersistence")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl Default for LayoutPersistence {
    fn default() -> Self {
        Self::new(MemoryStore::default())
    }
}

impl LayoutPersistence {
    /// The prefix of every layout key, followed by the wall id.
    pub const DEFAULT_KEY_PREFIX: &'static str = "posters_";

    /// Persist layouts into `store`.
    pub fn new(store: impl LayoutStore) -> Self {
        Self {
            store: Box::new(store),
            key_prefix: Self::DEFAULT_KEY_PREFIX.to_owned(),
        }
    }

    /// Use a different key prefix, e.g. to keep several rooms in one store.
    #[must_use = "with_key_prefix returns a modified LayoutPersistence"]
    pub fn with_key_prefix(self, key_prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            ..self
        }
    }

    /// The store key holding `wall`'s layout.
    pub fn key(&self, wall: WallId) -> String {
        format!("{}{}", self.key_prefix, wall)
    }

    /// Write the current posters of `wall` to the store, replacing its previous layout.
    pub fn save(&self, room: &Room, wall: WallId) -> Result<usize, RoomError> {
        let records: Vec<PersistedPoster> = room
            .try_wall(wall)?
            .posters()
            .iter()
            .map(PersistedPoster::from)
            .collect();
        let json = serde_json::to_string(&records)?;
        self.store.set(&self.key(wall), &json)?;
        debug!("Saved {} posters on the {wall} wall", records.len());
        Ok(records.len())
    }

    /// Append the persisted posters of `wall` to the room and mark the wall loaded. Returns how
    /// many posters were restored; an absent layout restores none.
    ///
    /// Posters already on the wall are kept, so loading twice duplicates them. Clear the wall
    /// first to replace its contents.
    pub fn load(&self, room: &mut Room, wall: WallId) -> Result<usize, RoomError> {
        room.try_wall(wall)?;
        let records: Vec<PersistedPoster> = match self.store.get(&self.key(wall))? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };

        let mut restored = 0;
        for record in records {
            let poster =
                match Poster::create_placement(record.width, record.height, record.position, wall)
                {
                    Ok(poster) => poster,
                    Err(e) => {
                        warn!("Skipping persisted poster on the {wall} wall: {e}");
                        continue;
                    }
                };
            let poster = match record.texture {
                Some(path) => poster.with_texture(path),
                None => poster,
            };
            room.add_poster(wall, poster)?;
            restored += 1;
        }
        room.mark_loaded(wall)?;
        debug!("Restored {restored} posters on the {wall} wall");
        Ok(restored)
    }

    /// Forget the persisted layout of `wall` and detach its posters.
    pub fn clear(&self, room: &mut Room, wall: WallId) -> Result<usize, RoomError> {
        room.try_wall(wall)?;
        self.store.remove(&self.key(wall))?;
        room.clear_posters(wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with_poster() -> Room {
        let mut room = Room::default();
        let poster =
            Poster::create_placement(1.0, 1.5, Vec3::new(0.0, 3.0, 0.25), WallId::Back).unwrap();
        room.add_poster(WallId::Back, poster).unwrap();
        room
    }

    #[test]
    fn save_clear_load_round_trip() {
        let persistence = LayoutPersistence::default();
        let mut room = room_with_poster();
        assert_eq!(persistence.save(&room, WallId::Back).unwrap(), 1);

        room.clear_posters(WallId::Back).unwrap();
        assert_eq!(persistence.load(&mut room, WallId::Back).unwrap(), 1);

        let wall = room.wall(WallId::Back).unwrap();
        assert!(wall.is_loaded());
        let restored: Vec<_> = wall.posters().iter().map(PersistedPoster::from).collect();
        assert_eq!(
            restored,
            vec![PersistedPoster {
                width: 1.0,
                height: 1.5,
                position: Vec3::new(0.0, 3.0, 0.25),
                texture: None,
            }]
        );
    }

    #[test]
    fn clear_forgets_layout() {
        let persistence = LayoutPersistence::default();
        let mut room = room_with_poster();
        persistence.save(&room, WallId::Back).unwrap();
        assert_eq!(persistence.clear(&mut room, WallId::Back).unwrap(), 1);
        assert_eq!(persistence.load(&mut room, WallId::Back).unwrap(), 0);
        assert!(room.wall(WallId::Back).unwrap().posters().is_empty());
    }

    #[test]
    fn repeated_load_appends() {
        let persistence = LayoutPersistence::default();
        let mut room = room_with_poster();
        persistence.save(&room, WallId::Back).unwrap();
        persistence.load(&mut room, WallId::Back).unwrap();
        assert_eq!(room.wall(WallId::Back).unwrap().posters().len(), 2);
    }

    #[test]
    fn records_use_wall_keys_and_plain_json() {
        let persistence = LayoutPersistence::default();
        let room = room_with_poster();
        persistence.save(&room, WallId::Back).unwrap();
        let json = persistence.store.get("posters_back").unwrap().unwrap();
        assert_eq!(
            json,
            r#"[{"width":1.0,"height":1.5,"position":[0.0,3.0,0.25]}]"#
        );
        assert_eq!(persistence.store.get("posters_right").unwrap(), None);
    }

    #[test]
    fn key_prefix_separates_rooms_in_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let gallery =
            LayoutPersistence::new(FileStore::new(dir.path())).with_key_prefix("gallery_");
        let studio = LayoutPersistence::new(FileStore::new(dir.path())).with_key_prefix("studio_");
        assert_eq!(gallery.key(WallId::Back), "gallery_back");

        gallery.save(&room_with_poster(), WallId::Back).unwrap();
        assert!(dir.path().join("gallery_back.json").exists());

        let mut room = Room::default();
        assert_eq!(studio.load(&mut room, WallId::Back).unwrap(), 0);
        assert_eq!(gallery.load(&mut room, WallId::Back).unwrap(), 1);
    }

    #[test]
    fn bad_records_are_skipped() {
        let store = MemoryStore::default();
        store
            .set(
                "posters_right",
                r#"[{"width":0.0,"height":1.0,"position":[0,1,0]},
                    {"width":2.0,"height":1.0,"position":[0,1,0],"texture":"posters/a.png"}]"#,
            )
            .unwrap();
        let persistence = LayoutPersistence::new(store);
        let mut room = Room::default();
        assert_eq!(persistence.load(&mut room, WallId::Right).unwrap(), 1);
        let wall = room.wall(WallId::Right).unwrap();
        assert_eq!(wall.posters()[0].texture(), Some("posters/a.png"));
    }

    #[test]
    fn malformed_layout_is_an_error() {
        let store = MemoryStore::default();
        store.set("posters_back", "not json").unwrap();
        let persistence = LayoutPersistence::new(store);
        let mut room = Room::default();
        assert!(matches!(
            persistence.load(&mut room, WallId::Back),
            Err(RoomError::Layout(_))
        ));
        assert!(!room.wall(WallId::Back).unwrap().is_loaded());
    }

    #[test]
    fn unknown_wall_is_rejected() {
        let persistence = LayoutPersistence::default();
        let mut room = Room::default();
        assert!(matches!(
            persistence.load(&mut room, WallId::Left),
            Err(RoomError::WallNotFound(_))
        ));
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("layouts"));
        assert_eq!(store.get("posters_back").unwrap(), None);
        store.remove("posters_back").unwrap();

        store.set("posters_back", "[]").unwrap();
        assert_eq!(store.get("posters_back").unwrap().as_deref(), Some("[]"));
        assert!(store.dir().join("posters_back.json").exists());

        store.remove("posters_back").unwrap();
        assert_eq!(store.get("posters_back").unwrap(), None);
    }
}
