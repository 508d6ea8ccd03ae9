//! Provides [`RoomError`], the error type shared by the room, poster, and persistence APIs.

use thiserror::Error;

use crate::room::{PosterId, WallId};

/// Everything that can go wrong while manipulating the room.
///
/// None of these are fatal. The Bevy systems in this crate log them and carry on.
#[derive(Debug, Error)]
pub enum RoomError {
    /// A poster was created with a non-positive (or non-finite) width or height.
    #[error("invalid poster dimensions {width} x {height}, both must be greater than zero")]
    InvalidDimension {
        /// The rejected width.
        width: f32,
        /// The rejected height.
        height: f32,
    },
    /// A poster was placed at a position with a NaN or infinite coordinate.
    #[error("invalid poster position {0}, every coordinate must be finite")]
    InvalidPosition(bevy_math::Vec3),
    /// The wall is not registered in this room.
    #[error("wall `{0}` is not part of this room")]
    WallNotFound(String),
    /// The poster is not attached to the wall it was looked up on.
    #[error("poster {poster:?} is not attached to the {wall} wall")]
    NotFound {
        /// The wall that was searched.
        wall: WallId,
        /// The poster that was missing.
        poster: PosterId,
    },
    /// The asset collaborator failed to load something the scene asked for.
    #[error("failed to load asset `{path}`: {reason}")]
    AssetLoadFailure {
        /// Asset path as requested.
        path: String,
        /// Loader-provided description of the failure.
        reason: String,
    },
    /// The layout store could not be read or written.
    #[error("layout storage failure: {0}")]
    Storage(#[from] std::io::Error),
    /// A persisted layout could not be encoded or decoded.
    #[error("malformed poster layout: {0}")]
    Layout(#[from] serde_json::Error),
}
