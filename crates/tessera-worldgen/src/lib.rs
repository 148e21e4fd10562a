//! Deterministic, tileable world generation: heightmaps, colormaps, cities,
//! dungeons, caves, foliage and a pity-ramped RNG.
//!
//! Raster generators take a tile request and return a row-major raster. A
//! value depends only on its world coordinate and the seed, so neighbouring
//! tiles agree on their shared edge.

mod cave;
mod city;
mod colormap;
mod dungeon;
mod foliage;
mod heightmap;
mod pity;
mod tile;

pub mod debug_viz;
pub mod noise;
pub mod sampling;

pub use cave::{CaveConfig, CaveGenerator};
pub use city::{CityConfig, CityGenerator};
pub use colormap::{ColormapGenerator, band_color};
pub use dungeon::{DungeonConfig, DungeonGenerator};
pub use foliage::{FoliagePoint, ForestConfig, place_foliage};
pub use heightmap::{HeightmapGenerator, TerrainTunables};
pub use pity::{PityRng, PityRngError};
pub use tile::{
    CaveCell, CaveTile, CellTile, CityTile, ColorTile, DungeonCell, DungeonTile, HeightTile,
    Raster, Rgba, WorldTile, fnv1a_64,
};
