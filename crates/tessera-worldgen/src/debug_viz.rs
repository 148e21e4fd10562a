//! Tile debug visualization.
//!
//! Provides [`DebugImage`] and renderers that turn every tile kind into RGBA
//! pixels for inspection.

mod image;
mod renderers;

pub use self::image::DebugImage;
pub use renderers::{
    dungeon_color, render_cave, render_city, render_dungeon, render_foliage, render_rgba,
};
