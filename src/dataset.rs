/// Canonical model builder.
///
/// Loads every configured source through the cache and bundles the
/// results. Each part is an `Arc` straight out of the cache, so building a
/// dataset twice inside the TTL window re-reads nothing, and a reload
/// never disturbs a dataset someone is still holding.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::analysis::filter::{ObservationFilter, filter_observations};
use crate::cache::{CacheKey, SourceCache};
use crate::config::EngineConfig;
use crate::ingest::cameras::{camera_layer, load_cameras};
use crate::ingest::citizen::load_citizen_science;
use crate::ingest::grid::load_grid;
use crate::ingest::occurrence::load_occurrences;
use crate::logging::{self, SourceKind};
use crate::model::{CameraSite, GeoOccurrenceRecord, GridLayer, PointLayer, SpeciesObservationRecord};
use crate::spatial::join::{AssignedPoint, assign_to_grid};

const CITIZEN_KEY: &str = "citizen_science";
const OCCURRENCE_KEY: &str = "occurrences";
const CAMERA_KEY: &str = "cameras";

#[derive(Debug, Clone)]
pub struct Dataset {
    pub observations: Arc<Vec<SpeciesObservationRecord>>,
    pub occurrences: Arc<PointLayer<GeoOccurrenceRecord>>,
    pub grid: Arc<GridLayer>,
    pub cameras: Arc<Vec<CameraSite>>,
}

impl Dataset {
    /// Loads (or fetches from `cache`) every source named by `config`.
    pub fn load(config: &EngineConfig, cache: &SourceCache) -> Dataset {
        Dataset::load_at(config, cache, Utc::now())
    }

    /// `load` with an explicit clock for the cache's staleness check.
    pub fn load_at(config: &EngineConfig, cache: &SourceCache, now: DateTime<Utc>) -> Dataset {
        let ttl = config.cache_ttl();

        let location = config.citizen_science_location();
        let observations = cache.get_or_load_at(&CacheKey::for_source(CITIZEN_KEY, &location), ttl, now, || {
            load_citizen_science(&location)
        });

        let location = config.occurrences_location();
        let occurrences = cache.get_or_load_at(&CacheKey::for_source(OCCURRENCE_KEY, &location), ttl, now, || {
            load_occurrences(&location)
        });

        // The id field is part of the grid's identity: a different field
        // yields different cells from the same file.
        let location = config.grid_location();
        let field = config.grid.cell_id_field.as_str();
        let grid_key = CacheKey::for_source(&format!("grid[{}]", field), &location);
        let grid = cache.get_or_load_at(&grid_key, ttl, now, || load_grid(&location, field));

        let location = config.cameras_location();
        let cameras = cache.get_or_load_at(&CacheKey::for_source(CAMERA_KEY, &location), ttl, now, || {
            load_cameras(&location)
        });

        let dataset = Dataset {
            observations,
            occurrences,
            grid,
            cameras,
        };
        logging::debug(
            SourceKind::System,
            None,
            &format!(
                "dataset ready: {} observations, {} occurrences, {} grid cells, {} cameras",
                dataset.observations.len(),
                dataset.occurrences.len(),
                dataset.grid.len(),
                dataset.cameras.len()
            ),
        );
        dataset
    }

    /// A filtered view of the citizen-science table.
    pub fn view(&self, filter: &ObservationFilter) -> Vec<SpeciesObservationRecord> {
        filter_observations(&self.observations, filter)
    }

    /// Occurrences assigned to grid cells.
    pub fn occurrences_on_grid(&self) -> Vec<AssignedPoint<GeoOccurrenceRecord>> {
        assign_to_grid(&self.occurrences, &self.grid)
    }

    /// Camera sites assigned to grid cells.
    pub fn cameras_on_grid(&self) -> Vec<AssignedPoint<CameraSite>> {
        assign_to_grid(&camera_layer(&self.cameras), &self.grid)
    }
}
