//! A degenerate cell spacing is corrected once per generator call.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::DVec2;
use tessera_worldgen::*;
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Metadata, Subscriber};

/// Counts `WARN` events and ignores everything else.
#[derive(Clone, Default)]
struct WarnCounter(Arc<AtomicUsize>);

impl WarnCounter {
    fn count(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

impl Subscriber for WarnCounter {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _: &Id, _: &Record<'_>) {}

    fn record_follows_from(&self, _: &Id, _: &Id) {}

    fn event(&self, event: &Event<'_>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn enter(&self, _: &Id) {}

    fn exit(&self, _: &Id) {}
}

fn warnings_during(f: impl FnOnce()) -> usize {
    let counter = WarnCounter::default();
    tracing::subscriber::with_default(counter.clone(), f);
    counter.count()
}

#[test]
fn test_heightmap_warns_once_per_tile() {
    for upp in [0.0, -2.0, f64::NAN, f64::INFINITY] {
        let tile = WorldTile::new(1, 64, 64, DVec2::ZERO, upp);
        let warnings = warnings_during(|| {
            HeightmapGenerator::default().generate(tile);
        });
        assert_eq!(warnings, 1, "units per cell {upp}");
    }
}

#[test]
fn test_city_warns_once_per_tile() {
    let tile = WorldTile::new(1, 64, 64, DVec2::ZERO, 0.0);
    let warnings = warnings_during(|| {
        CityGenerator::default().generate(tile);
    });
    assert_eq!(warnings, 1);
}

#[test]
fn test_valid_spacing_is_silent() {
    let tile = WorldTile::new(1, 32, 32, DVec2::new(-10.0, 4.0), 0.5);
    let warnings = warnings_during(|| {
        HeightmapGenerator::default().generate(tile);
        CityGenerator::default().generate(tile);
    });
    assert_eq!(warnings, 0);
}

#[test]
fn test_corrected_tile_matches_unit_spacing() {
    let degenerate = WorldTile::new(3, 16, 16, DVec2::new(7.0, -2.0), -1.0);
    let unit = WorldTile {
        units_per_cell: 1.0,
        ..degenerate
    };
    let generator = HeightmapGenerator::default();
    assert_eq!(generator.generate(degenerate), generator.generate(unit));
}
