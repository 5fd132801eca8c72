//! Beatsync Project Model
//!
//! Defines the core data contracts shared with the renderer and with
//! project persistence:
//! - **Beat maps:** Tempo plus beat/drop frame indices for a music track
//! - **Scenes & timelines:** Typed, frame-addressed scene schedules
//! - **Cursor data:** Recorded pointer samples and derived zoom points
//! - **Scripts:** Repairing parser for generator-produced scene lists
//!
//! Frame indices are at a fixed output rate (canonically 30 fps). Pointer
//! coordinates are normalized to `[0.0, 1.0]`.

pub mod beat_map;
pub mod cursor;
pub mod scene;
pub mod script;
pub mod timeline;

pub use beat_map::*;
pub use cursor::*;
pub use scene::*;
pub use script::*;
pub use timeline::*;
