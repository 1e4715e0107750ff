//! Scenario files describing the area to explore and how to simulate it.

use grid_explorer_core::{AreaHash, ExplorerConfig, GridPoint, CELL_SIZE};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::terrain::Raster;

const WALKABLE_GLYPH: char = '.';
const BLOCKED_GLYPH: char = '#';
const START_GLYPH: char = 'S';

/// Largest accepted map, in tiles.
pub(crate) const MAX_TILES: usize = 1 << 18;

/// Parsed contents of a scenario TOML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Explorer tunables; missing fields fall back to their defaults.
    #[serde(default)]
    pub(crate) explorer: ExplorerConfig,
    /// Parameters of the simulated agent.
    #[serde(default)]
    pub(crate) simulation: SimulationSettings,
    /// Hand-drawn tile map.
    map: Option<String>,
    /// Seeded random map, used when no hand-drawn map is provided.
    generator: Option<GeneratorSettings>,
}

impl Scenario {
    /// Parses a scenario from TOML text.
    pub(crate) fn from_toml(text: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(text)?)
    }

    /// Produces the tile map the scenario describes.
    ///
    /// `seed` replaces the generator's seed; it has no effect on drawn maps.
    pub(crate) fn tile_map(&self, seed: Option<u64>) -> Result<TileMap, ScenarioError> {
        match (&self.map, &self.generator) {
            (Some(_), Some(_)) => Err(ScenarioError::ConflictingMaps),
            (None, None) => Err(ScenarioError::MissingMap),
            (Some(text), None) => TileMap::parse(text),
            (None, Some(generator)) => TileMap::generate(generator, seed),
        }
    }
}

/// Parameters of the simulated agent.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationSettings {
    /// Upper bound on the number of ticks simulated.
    pub(crate) max_ticks: u32,
    /// World units the agent travels per tick.
    pub(crate) step_length: u32,
    /// Identifier reported for the area.
    pub(crate) area_id: String,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            max_ticks: 5_000,
            step_length: 6,
            area_id: "scenario".to_owned(),
        }
    }
}

/// Seeded random map parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct GeneratorSettings {
    columns: u32,
    rows: u32,
    #[serde(default)]
    seed: u64,
    #[serde(default = "default_obstacle_density")]
    obstacle_density: f64,
}

fn default_obstacle_density() -> f64 {
    0.25
}

/// Errors raised while loading a scenario.
#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    /// The TOML document could not be decoded.
    #[error("invalid scenario file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Neither a map nor a generator was provided.
    #[error("scenario defines neither a `map` nor a `[generator]`")]
    MissingMap,
    /// Both a map and a generator were provided.
    #[error("scenario defines both a `map` and a `[generator]`")]
    ConflictingMaps,
    /// The map contains no rows.
    #[error("map is empty")]
    EmptyMap,
    /// A map row differs in length from the first row.
    #[error("map row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A map tile uses an unsupported glyph.
    #[error("unknown map glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based column index.
        column: usize,
        /// Zero-based row index.
        row: usize,
    },
    /// The map has no start tile.
    #[error("map has no start tile `S`")]
    MissingStart,
    /// The map has more than one start tile.
    #[error("map has more than one start tile `S`")]
    MultipleStarts,
    /// The map holds more tiles than a raster can be built for.
    #[error("map has {tiles} tiles, at most {limit} are supported", limit = MAX_TILES)]
    MapTooLarge {
        /// Number of tiles in the map.
        tiles: usize,
    },
    /// Generator parameters are out of range.
    #[error("invalid generator settings: {0}")]
    InvalidGenerator(&'static str),
}

/// Rectangular tile map with a start tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TileMap {
    columns: usize,
    rows: usize,
    walkable: Vec<bool>,
    start: usize,
}

impl TileMap {
    /// Parses a glyph map, one line per tile row. Blank lines are skipped.
    pub(crate) fn parse(text: &str) -> Result<Self, ScenarioError> {
        let mut columns = 0;
        let mut walkable = Vec::new();
        let mut start = None;

        let lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
        for (row, line) in lines.enumerate() {
            let found = line.chars().count();
            if row == 0 {
                columns = found;
            } else if found != columns {
                return Err(ScenarioError::RaggedRow {
                    row,
                    expected: columns,
                    found,
                });
            }

            if walkable.len() + found > MAX_TILES {
                return Err(ScenarioError::MapTooLarge {
                    tiles: walkable.len() + found,
                });
            }

            for (column, glyph) in line.chars().enumerate() {
                match glyph {
                    WALKABLE_GLYPH => walkable.push(true),
                    BLOCKED_GLYPH => walkable.push(false),
                    START_GLYPH => {
                        if start.replace(walkable.len()).is_some() {
                            return Err(ScenarioError::MultipleStarts);
                        }
                        walkable.push(true);
                    }
                    _ => {
                        return Err(ScenarioError::UnknownGlyph { glyph, column, row });
                    }
                }
            }
        }

        if walkable.is_empty() {
            return Err(ScenarioError::EmptyMap);
        }
        let start = start.ok_or(ScenarioError::MissingStart)?;

        Ok(Self {
            columns,
            rows: walkable.len() / columns,
            walkable,
            start,
        })
    }

    /// Generates a random map; the center tile is always open and hosts the start.
    fn generate(settings: &GeneratorSettings, seed: Option<u64>) -> Result<Self, ScenarioError> {
        if settings.columns == 0 || settings.rows == 0 {
            return Err(ScenarioError::InvalidGenerator(
                "columns and rows must be positive",
            ));
        }
        if !(0.0..1.0).contains(&settings.obstacle_density) {
            return Err(ScenarioError::InvalidGenerator(
                "obstacle_density must lie in [0, 1)",
            ));
        }

        let columns = usize::try_from(settings.columns)
            .map_err(|_| ScenarioError::InvalidGenerator("columns out of range"))?;
        let rows = usize::try_from(settings.rows)
            .map_err(|_| ScenarioError::InvalidGenerator("rows out of range"))?;

        let tiles = columns
            .checked_mul(rows)
            .filter(|&tiles| tiles <= MAX_TILES)
            .ok_or(ScenarioError::InvalidGenerator(
                "columns × rows exceeds the tile limit",
            ))?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed.unwrap_or(settings.seed));
        let mut walkable: Vec<bool> = (0..tiles)
            .map(|_| !rng.gen_bool(settings.obstacle_density))
            .collect();
        let start = (rows / 2) * columns + columns / 2;
        walkable[start] = true;

        Ok(Self {
            columns,
            rows,
            walkable,
            start,
        })
    }

    /// Number of tile columns.
    pub(crate) const fn columns(&self) -> usize {
        self.columns
    }

    /// Number of tile rows.
    pub(crate) const fn rows(&self) -> usize {
        self.rows
    }

    /// Renders the map back into glyphs.
    pub(crate) fn glyphs(&self) -> String {
        let mut text = String::with_capacity((self.columns + 1) * self.rows);
        for (tile, &open) in self.walkable.iter().enumerate() {
            text.push(match (tile == self.start, open) {
                (true, _) => START_GLYPH,
                (false, true) => WALKABLE_GLYPH,
                (false, false) => BLOCKED_GLYPH,
            });
            if (tile + 1) % self.columns == 0 {
                text.push('\n');
            }
        }
        text
    }

    /// Content hash of the map: the leading four bytes of its SHA-256 digest.
    pub(crate) fn area_hash(&self) -> AreaHash {
        let digest = Sha256::digest(self.glyphs().as_bytes());
        AreaHash::new(u32::from_le_bytes([
            digest[0], digest[1], digest[2], digest[3],
        ]))
    }

    /// World point at the center of the start tile.
    pub(crate) fn start_point(&self) -> GridPoint {
        let column = i32::try_from(self.start % self.columns).unwrap_or(0);
        let row = i32::try_from(self.start / self.columns).unwrap_or(0);
        GridPoint::new(
            column * CELL_SIZE + CELL_SIZE / 2,
            row * CELL_SIZE + CELL_SIZE / 2,
        )
    }

    /// Point raster with one tile per cell.
    pub(crate) fn raster(&self) -> Result<Raster, ScenarioError> {
        let tile_size = usize::try_from(CELL_SIZE).unwrap_or(0);
        Raster::from_tiles(self.columns, &self.walkable, tile_size).ok_or(
            ScenarioError::MapTooLarge {
                tiles: self.walkable.len(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::is_walkable;

    const COURTYARD: &str = "
        #####
        #S..#
        #.#.#
        #####
    ";

    #[test]
    fn parses_glyph_maps() {
        let map = TileMap::parse(COURTYARD).expect("valid map");
        assert_eq!((map.columns(), map.rows()), (5, 4));
        assert_eq!(map.start_point(), GridPoint::new(34, 34));
        assert_eq!(map.glyphs(), "#####\n#S..#\n#.#.#\n#####\n");

        let raster = map.raster().expect("map fits a raster");
        assert!(is_walkable(raster.view(), GridPoint::new(34, 34)));
        assert!(!is_walkable(raster.view(), GridPoint::new(57, 57)));
    }

    #[test]
    fn rejects_malformed_maps() {
        assert!(matches!(TileMap::parse("\n  \n"), Err(ScenarioError::EmptyMap)));
        assert!(matches!(
            TileMap::parse("S..\n.."),
            Err(ScenarioError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        ));
        assert!(matches!(
            TileMap::parse("S.x"),
            Err(ScenarioError::UnknownGlyph {
                glyph: 'x',
                column: 2,
                row: 0
            })
        ));
        assert!(matches!(TileMap::parse("..."), Err(ScenarioError::MissingStart)));
        assert!(matches!(
            TileMap::parse("S.S"),
            Err(ScenarioError::MultipleStarts)
        ));
    }

    #[test]
    fn hash_tracks_map_contents() {
        let first = TileMap::parse("S..").expect("valid map");
        let same = TileMap::parse("  S..  ").expect("valid map");
        let other = TileMap::parse("S.#").expect("valid map");
        assert_eq!(first.area_hash(), same.area_hash());
        assert_ne!(first.area_hash(), other.area_hash());
    }

    #[test]
    fn scenario_requires_exactly_one_map_source() {
        let missing = Scenario::from_toml("[simulation]\nmax_ticks = 3\n").expect("valid toml");
        assert!(matches!(missing.tile_map(None), Err(ScenarioError::MissingMap)));

        let both = Scenario::from_toml(
            "map = \"S\"\n[generator]\ncolumns = 3\nrows = 3\n",
        )
        .expect("valid toml");
        assert!(matches!(both.tile_map(None), Err(ScenarioError::ConflictingMaps)));
    }

    #[test]
    fn scenario_reads_explorer_and_simulation_tables() {
        let scenario = Scenario::from_toml(
            r#"
            map = "S.#"

            [explorer]
            known_radius = 0
            seen_radius = 2

            [simulation]
            step_length = 4
            "#,
        )
        .expect("valid toml");

        assert_eq!(scenario.explorer, ExplorerConfig::new(true, 1, 2));
        assert_eq!(scenario.simulation.step_length, 4);
        assert_eq!(scenario.simulation.max_ticks, 5_000);
        assert_eq!(scenario.tile_map(None).map(|map| map.columns()).ok(), Some(3));
    }

    #[test]
    fn generator_is_deterministic_per_seed() {
        let settings = GeneratorSettings {
            columns: 12,
            rows: 9,
            seed: 7,
            obstacle_density: 0.3,
        };
        let first = TileMap::generate(&settings, None).expect("valid settings");
        let again = TileMap::generate(&settings, Some(7)).expect("valid settings");
        let reseeded = TileMap::generate(&settings, Some(8)).expect("valid settings");

        assert_eq!(first, again);
        assert_ne!(first.glyphs(), reseeded.glyphs());
        assert_eq!((first.columns(), first.rows()), (12, 9));
        assert_eq!(first.start_point(), GridPoint::new(6 * 23 + 11, 4 * 23 + 11));
    }

    #[test]
    fn oversized_maps_are_rejected() {
        let settings = GeneratorSettings {
            columns: u32::MAX,
            rows: u32::MAX,
            seed: 0,
            obstacle_density: 0.0,
        };
        assert!(matches!(
            TileMap::generate(&settings, None),
            Err(ScenarioError::InvalidGenerator(_))
        ));

        let settings = GeneratorSettings {
            columns: 1024,
            rows: 257,
            ..settings
        };
        assert!(matches!(
            TileMap::generate(&settings, None),
            Err(ScenarioError::InvalidGenerator(_))
        ));

        let wide_row = format!("S{}", ".".repeat(MAX_TILES));
        assert!(matches!(
            TileMap::parse(&wide_row),
            Err(ScenarioError::MapTooLarge { tiles }) if tiles == MAX_TILES + 1
        ));
    }

    #[test]
    fn misspelled_explorer_keys_are_rejected() {
        let result = Scenario::from_toml("map = \"S.\"\n[explorer]\nknwon_radius = 2\n");
        assert!(matches!(result, Err(ScenarioError::Parse(_))));
    }

    #[test]
    fn generator_rejects_out_of_range_density() {
        let settings = GeneratorSettings {
            columns: 4,
            rows: 4,
            seed: 0,
            obstacle_density: 1.0,
        };
        assert!(matches!(
            TileMap::generate(&settings, None),
            Err(ScenarioError::InvalidGenerator(_))
        ));
    }
}
