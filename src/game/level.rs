//! Level Assembly
//!
//! Turns a tilemap asset plus a level configuration into the immutable
//! geometry and spawn model the simulation runs against: a solid-tile grid,
//! an optional hazard grid, pass-through decoration layers, and typed spawn
//! descriptors. Assembly is pure: the same tilemap and tileset always yield
//! an identical model.
//!
//! Fatal, malformed-data conditions (`MissingTileset`, `MissingRequiredLayer`)
//! abort the load with no partial model. Everything else degrades to a
//! documented default.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::fixed::{Fixed, from_int, to_fixed, to_int};
use crate::core::vec2::FixedVec2;

/// Render depth for the background decoration layer.
pub const BACKGROUND_DEPTH: i32 = 3;

/// Render depth for the playfield (solid tiles, entities).
pub const PLAYFIELD_DEPTH: i32 = 4;

/// Render depth for the foreground decoration layer.
pub const FOREGROUND_DEPTH: i32 = 50;

/// Name of the optional background decoration tile layer.
pub const LAYER_BACKGROUND: &str = "background-deco";

/// Name of the mandatory solid tile layer.
pub const LAYER_PLATFORMS: &str = "platforms";

/// Name of the optional hazard tile layer.
pub const LAYER_HAZARDS: &str = "hazards";

/// Name of the optional foreground decoration tile layer.
pub const LAYER_FOREGROUND: &str = "foreground-deco";

/// Name of the spawn object layer.
pub const LAYER_SPAWNS: &str = "spawns";

// =============================================================================
// ERRORS
// =============================================================================

/// Fatal level-assembly failures. Gameplay conditions are never errors;
/// these mean the level data itself is malformed.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The configured tileset name is absent from the tilemap.
    #[error("tileset \"{tileset}\" not found in tilemap \"{tilemap}\"")]
    MissingTileset {
        /// Tilemap identifier from the level configuration
        tilemap: String,
        /// The tileset name that failed to resolve
        tileset: String,
    },

    /// A layer the game cannot run without is absent.
    #[error("required layer \"{layer}\" not found in tilemap \"{tilemap}\"")]
    MissingRequiredLayer {
        /// Tilemap identifier from the level configuration
        tilemap: String,
        /// The missing layer name
        layer: String,
    },

    /// The tilemap asset could not be parsed as Tiled JSON.
    #[error("tilemap \"{tilemap}\" is not valid Tiled JSON: {source}")]
    InvalidTilemap {
        /// Tilemap identifier from the level configuration
        tilemap: String,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// LEVEL CONFIGURATION
// =============================================================================

/// Parallax background asset keys, far to near.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundKeys {
    /// Slowest-scrolling layer
    pub far: String,
    /// Middle layer
    pub mid: String,
    /// Fastest-scrolling layer
    pub near: String,
}

/// Static per-level configuration, consumed read-only by assembly and the
/// orchestrator. Asset keys are opaque to the simulation and pass through
/// to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Position in the level sequence
    pub index: u32,
    /// Display name
    pub name: String,
    /// Tilemap asset identifier
    pub tilemap_key: String,
    /// Tileset name to resolve inside the tilemap
    pub tileset_key: String,
    /// Tileset image asset identifier
    pub tileset_image_key: String,
    /// Parallax background keys
    pub background_keys: BackgroundKeys,
    /// Music track key
    pub music_key: String,
    /// Boss encounter for this level, if any
    pub boss_type: Option<String>,
    /// Player start X in pixels
    pub start_x: i32,
    /// Player start Y in pixels
    pub start_y: i32,
}

impl LevelConfig {
    /// Player start coordinate as a fixed-point vector.
    pub fn start(&self) -> FixedVec2 {
        FixedVec2::from_ints(self.start_x, self.start_y)
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            index: 0,
            name: String::new(),
            tilemap_key: String::new(),
            tileset_key: String::new(),
            tileset_image_key: String::new(),
            background_keys: BackgroundKeys::default(),
            music_key: String::new(),
            boss_type: None,
            start_x: 100,
            start_y: 680,
        }
    }
}

// =============================================================================
// TILEMAP MODEL (asset-source side)
// =============================================================================

/// A typed property value from the map editor.
///
/// Floats are legal here because this is asset data consumed once at
/// assembly time; everything that reaches the tick loop is converted to
/// fixed-point first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    Text(String),
}

impl PropertyValue {
    /// Value as a bool, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value converted to fixed-point pixels.
    pub fn as_fixed(&self) -> Option<Fixed> {
        match self {
            Self::Int(i) => Some(from_int(*i as i32)),
            Self::Float(f) => Some(to_fixed(*f)),
            _ => None,
        }
    }
}

/// Open key-value property bag attached to tiles and map objects.
pub type PropertyBag = BTreeMap<String, PropertyValue>;

/// A tileset referenced by the map, with per-tile properties keyed by
/// local tile id (global id minus `first_gid`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    /// Tileset name as authored
    pub name: String,
    /// First global tile id this tileset covers
    pub first_gid: u32,
    /// Per-tile property bags, keyed by local tile id
    pub tile_properties: BTreeMap<u32, PropertyBag>,
}

/// A tile layer: a flat row-major array of global tile ids, 0 = empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    /// Layer name as authored
    pub name: String,
    /// Global tile ids, row-major, `width * height` entries
    pub data: Vec<u32>,
}

/// A placed object from an object layer.
///
/// Coordinates pass through as authored: enemy spawns treat the position as
/// the body center, trigger regions treat it as the rectangle's top-left
/// corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    /// Object name
    pub name: String,
    /// Declared object type (may be empty)
    pub kind: String,
    /// X position in pixels
    pub x: f64,
    /// Y position in pixels
    pub y: f64,
    /// Width in pixels (0 for point objects)
    pub width: f64,
    /// Height in pixels (0 for point objects)
    pub height: f64,
    /// Attached properties
    pub properties: PropertyBag,
}

/// An object layer grouping placed objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectLayer {
    /// Layer name as authored
    pub name: String,
    /// Objects in authoring order
    pub objects: Vec<MapObject>,
}

/// The in-memory tilemap model assembly consumes.
///
/// Hosts may build this directly or parse it from a Tiled JSON export via
/// [`Tilemap::from_tiled_json`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tilemap {
    /// Map width in tiles
    pub width: u32,
    /// Map height in tiles
    pub height: u32,
    /// Tile width in pixels
    pub tile_width: u32,
    /// Tile height in pixels
    pub tile_height: u32,
    /// Referenced tilesets
    pub tilesets: Vec<Tileset>,
    /// Tile layers in authoring order
    pub layers: Vec<TileLayer>,
    /// Object layers in authoring order
    pub object_layers: Vec<ObjectLayer>,
}

impl Tilemap {
    /// Parse a Tiled JSON export (the subset this game authors: tile layers
    /// with flat gid arrays, object groups, tilesets with per-tile boolean
    /// properties).
    pub fn from_tiled_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: tiled::TiledMap = serde_json::from_str(json)?;
        Ok(raw.into_tilemap())
    }

    fn find_tile_layer(&self, name: &str) -> Option<&TileLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    fn find_object_layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.object_layers.iter().find(|layer| layer.name == name)
    }
}

/// Tiled JSON wire format. Kept private: the rest of the crate only sees
/// the [`Tilemap`] model.
mod tiled {
    use serde::Deserialize;
    use std::collections::BTreeMap;

    use super::{MapObject, ObjectLayer, PropertyBag, PropertyValue, TileLayer, Tilemap, Tileset};

    #[derive(Deserialize)]
    pub(super) struct TiledMap {
        width: u32,
        height: u32,
        tilewidth: u32,
        tileheight: u32,
        #[serde(default)]
        tilesets: Vec<TiledTileset>,
        #[serde(default)]
        layers: Vec<TiledLayer>,
    }

    #[derive(Deserialize)]
    struct TiledTileset {
        name: String,
        firstgid: u32,
        #[serde(default)]
        tiles: Vec<TiledTile>,
    }

    #[derive(Deserialize)]
    struct TiledTile {
        id: u32,
        #[serde(default)]
        properties: Vec<TiledProperty>,
    }

    #[derive(Deserialize)]
    struct TiledProperty {
        name: String,
        #[serde(default)]
        value: serde_json::Value,
    }

    #[derive(Deserialize)]
    #[serde(tag = "type")]
    enum TiledLayer {
        #[serde(rename = "tilelayer")]
        Tile {
            name: String,
            #[serde(default)]
            data: Vec<u32>,
        },
        #[serde(rename = "objectgroup")]
        Object {
            name: String,
            #[serde(default)]
            objects: Vec<TiledObject>,
        },
        #[serde(other)]
        Unsupported,
    }

    #[derive(Deserialize)]
    struct TiledObject {
        #[serde(default)]
        name: String,
        #[serde(default, rename = "type", alias = "class")]
        kind: String,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        width: f64,
        #[serde(default)]
        height: f64,
        #[serde(default)]
        properties: Vec<TiledProperty>,
    }

    fn convert_properties(raw: Vec<TiledProperty>) -> PropertyBag {
        let mut bag = BTreeMap::new();
        for prop in raw {
            let value = match prop.value {
                serde_json::Value::Bool(b) => PropertyValue::Bool(b),
                serde_json::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        PropertyValue::Int(i)
                    } else {
                        PropertyValue::Float(n.as_f64().unwrap_or(0.0))
                    }
                }
                serde_json::Value::String(s) => PropertyValue::Text(s),
                _ => continue,
            };
            bag.insert(prop.name, value);
        }
        bag
    }

    impl TiledMap {
        pub(super) fn into_tilemap(self) -> Tilemap {
            let tilesets = self
                .tilesets
                .into_iter()
                .map(|ts| {
                    let tile_properties = ts
                        .tiles
                        .into_iter()
                        .map(|tile| (tile.id, convert_properties(tile.properties)))
                        .collect();
                    Tileset {
                        name: ts.name,
                        first_gid: ts.firstgid,
                        tile_properties,
                    }
                })
                .collect();

            let mut layers = Vec::new();
            let mut object_layers = Vec::new();
            for layer in self.layers {
                match layer {
                    TiledLayer::Tile { name, data } => {
                        layers.push(TileLayer { name, data });
                    }
                    TiledLayer::Object { name, objects } => {
                        let objects = objects
                            .into_iter()
                            .map(|obj| MapObject {
                                name: obj.name,
                                kind: obj.kind,
                                x: obj.x,
                                y: obj.y,
                                width: obj.width,
                                height: obj.height,
                                properties: convert_properties(obj.properties),
                            })
                            .collect();
                        object_layers.push(ObjectLayer { name, objects });
                    }
                    TiledLayer::Unsupported => {}
                }
            }

            Tilemap {
                width: self.width,
                height: self.height,
                tile_width: self.tilewidth,
                tile_height: self.tileheight,
                tilesets,
                layers,
                object_layers,
            }
        }
    }
}

// =============================================================================
// ASSEMBLED MODEL (simulation side)
// =============================================================================

/// Solid-tile grid built from the platforms layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    cols: u32,
    rows: u32,
    tile_width: i32,
    tile_height: i32,
    cells: Vec<bool>,
}

impl TileGrid {
    fn new(cols: u32, rows: u32, tile_width: i32, tile_height: i32) -> Self {
        Self {
            cols,
            rows,
            tile_width,
            tile_height,
            cells: vec![false; (cols * rows) as usize],
        }
    }

    fn set_solid(&mut self, col: u32, row: u32) {
        if col < self.cols && row < self.rows {
            self.cells[(row * self.cols + col) as usize] = true;
        }
    }

    /// Number of columns.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Number of rows.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile width in pixels.
    pub fn tile_width(&self) -> i32 {
        self.tile_width
    }

    /// Tile height in pixels.
    pub fn tile_height(&self) -> i32 {
        self.tile_height
    }

    /// Whether the cell at (col, row) is solid. Out-of-range cells are open.
    pub fn is_solid(&self, col: i32, row: i32) -> bool {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return false;
        }
        self.cells[(row as u32 * self.cols + col as u32) as usize]
    }

    /// Column containing the given x coordinate.
    pub fn col_at(&self, x: Fixed) -> i32 {
        to_int(x).div_euclid(self.tile_width)
    }

    /// Row containing the given y coordinate.
    pub fn row_at(&self, y: Fixed) -> i32 {
        to_int(y).div_euclid(self.tile_height)
    }

    /// Left edge of a column, in fixed-point pixels.
    pub fn cell_left(&self, col: i32) -> Fixed {
        from_int(col * self.tile_width)
    }

    /// Top edge of a row, in fixed-point pixels.
    pub fn cell_top(&self, row: i32) -> Fixed {
        from_int(row * self.tile_height)
    }
}

/// What touching a hazard cell does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardKind {
    /// Contact damage, throttled by the player's hurt-stun window
    Damage,
    /// Kills outright, ignoring the stun gate
    Lethal,
}

/// Hazard cells built from the optional hazards layer.
///
/// Same dimensions and tile size as the solid grid it was assembled with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardGrid {
    cols: u32,
    rows: u32,
    cells: Vec<Option<HazardKind>>,
}

impl HazardGrid {
    fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            cells: vec![None; (cols * rows) as usize],
        }
    }

    fn set(&mut self, col: u32, row: u32, kind: HazardKind) {
        if col < self.cols && row < self.rows {
            self.cells[(row * self.cols + col) as usize] = Some(kind);
        }
    }

    /// Hazard at (col, row), if any. Out-of-range cells are harmless.
    pub fn hazard_at(&self, col: i32, row: i32) -> Option<HazardKind> {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return None;
        }
        self.cells[(row as u32 * self.cols + col as u32) as usize]
    }

    /// True if any cell carries a hazard.
    pub fn any(&self) -> bool {
        self.cells.iter().any(|c| c.is_some())
    }
}

/// A decoration tile layer carried through for the renderer. The simulation
/// never interprets it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecoLayer {
    /// Layer name as authored
    pub name: String,
    /// Render depth (background below playfield, foreground above)
    pub depth: i32,
    /// Global tile ids, row-major, 0 = empty
    pub tiles: Vec<u32>,
}

/// Typed spawn point kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnKind {
    /// Produces one enemy instance
    Enemy,
    /// Produces one passive checkpoint trigger region
    Checkpoint,
    /// Produces one instant-kill trigger region
    DeathZone,
    /// Parsed and carried; no core runtime behavior
    Powerup,
    /// Parsed and carried; no core runtime behavior
    BossTrigger,
}

impl SpawnKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "enemy" => Some(Self::Enemy),
            "checkpoint" => Some(Self::Checkpoint),
            "death-zone" => Some(Self::DeathZone),
            "powerup" => Some(Self::Powerup),
            "boss-trigger" => Some(Self::BossTrigger),
            _ => None,
        }
    }
}

/// One typed spawn point from the map's object layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnDescriptor {
    /// What this descriptor produces
    pub kind: SpawnKind,
    /// Authored position (body center for enemies, top-left for regions)
    pub position: FixedVec2,
    /// Width and height in pixels
    pub extent: FixedVec2,
    /// Open property bag (enemy sub-type, patrol range, ...)
    pub properties: PropertyBag,
}

/// Immutable per-level output of assembly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssembledLevel {
    /// Solid collision grid from the platforms layer
    pub solids: TileGrid,
    /// Hazard cells, if the map has a hazards layer
    pub hazards: Option<HazardGrid>,
    /// Background decoration, if present
    pub background: Option<DecoLayer>,
    /// Foreground decoration, if present
    pub foreground: Option<DecoLayer>,
    /// Typed spawn descriptors from the "spawns" object layer
    pub spawns: Vec<SpawnDescriptor>,
    /// World width in fixed-point pixels
    pub world_width: Fixed,
    /// World height in fixed-point pixels
    pub world_height: Fixed,
}

// =============================================================================
// ASSEMBLY
// =============================================================================

/// Default extent for point objects with no authored size.
const DEFAULT_SPAWN_EXTENT: f64 = 32.0;

/// Assemble the geometry/spawn model for a level.
///
/// Fails with [`LevelError::MissingTileset`] if the configured tileset is
/// absent and [`LevelError::MissingRequiredLayer`] if the platforms layer
/// is absent. No partial model is ever produced.
pub fn assemble(config: &LevelConfig, map: &Tilemap) -> Result<AssembledLevel, LevelError> {
    let tileset = map
        .tilesets
        .iter()
        .find(|ts| ts.name == config.tileset_key)
        .ok_or_else(|| LevelError::MissingTileset {
            tilemap: config.tilemap_key.clone(),
            tileset: config.tileset_key.clone(),
        })?;

    let platforms =
        map.find_tile_layer(LAYER_PLATFORMS)
            .ok_or_else(|| LevelError::MissingRequiredLayer {
                tilemap: config.tilemap_key.clone(),
                layer: LAYER_PLATFORMS.to_string(),
            })?;

    let mut solids = TileGrid::new(
        map.width,
        map.height,
        map.tile_width as i32,
        map.tile_height as i32,
    );
    for row in 0..map.height {
        for col in 0..map.width {
            let idx = (row * map.width + col) as usize;
            let gid = platforms.data.get(idx).copied().unwrap_or(0);
            if tile_flag(tileset, gid, "collides") {
                solids.set_solid(col, row);
            }
        }
    }

    let hazards = map.find_tile_layer(LAYER_HAZARDS).map(|layer| {
        let mut grid = HazardGrid::new(map.width, map.height);
        for row in 0..map.height {
            for col in 0..map.width {
                let idx = (row * map.width + col) as usize;
                let gid = layer.data.get(idx).copied().unwrap_or(0);
                // instant-death wins over plain damage on the same tile
                if tile_flag(tileset, gid, "instant-death") {
                    grid.set(col, row, HazardKind::Lethal);
                } else if tile_flag(tileset, gid, "damage") {
                    grid.set(col, row, HazardKind::Damage);
                }
            }
        }
        grid
    });

    let background = map.find_tile_layer(LAYER_BACKGROUND).map(|layer| DecoLayer {
        name: layer.name.clone(),
        depth: BACKGROUND_DEPTH,
        tiles: layer.data.clone(),
    });

    let foreground = map.find_tile_layer(LAYER_FOREGROUND).map(|layer| DecoLayer {
        name: layer.name.clone(),
        depth: FOREGROUND_DEPTH,
        tiles: layer.data.clone(),
    });

    let spawns = match map.find_object_layer(LAYER_SPAWNS) {
        Some(layer) => layer.objects.iter().map(parse_spawn).collect(),
        None => {
            debug!(tilemap = %config.tilemap_key, "no spawns layer; level has no placed objects");
            Vec::new()
        }
    };

    Ok(AssembledLevel {
        solids,
        hazards,
        background,
        foreground,
        spawns,
        world_width: from_int((map.width * map.tile_width) as i32),
        world_height: from_int((map.height * map.tile_height) as i32),
    })
}

/// Parse Tiled JSON and assemble in one step.
pub fn assemble_from_json(config: &LevelConfig, json: &str) -> Result<AssembledLevel, LevelError> {
    let map = Tilemap::from_tiled_json(json).map_err(|source| LevelError::InvalidTilemap {
        tilemap: config.tilemap_key.clone(),
        source,
    })?;
    assemble(config, &map)
}

/// Look up a boolean tile property through the tileset, by global id.
fn tile_flag(tileset: &Tileset, gid: u32, flag: &str) -> bool {
    if gid < tileset.first_gid {
        return false;
    }
    let local = gid - tileset.first_gid;
    tileset
        .tile_properties
        .get(&local)
        .and_then(|props| props.get(flag))
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

/// Resolve an object into a spawn descriptor.
///
/// Kind falls back type -> name -> enemy, matching how levels were authored;
/// an unrecognized non-empty type is warned about and falls through.
fn parse_spawn(obj: &MapObject) -> SpawnDescriptor {
    let kind = match SpawnKind::parse(&obj.kind) {
        Some(kind) => kind,
        None => {
            if !obj.kind.is_empty() {
                warn!(
                    object = %obj.name,
                    declared = %obj.kind,
                    "unknown spawn type; falling back to object name"
                );
            }
            SpawnKind::parse(&obj.name).unwrap_or(SpawnKind::Enemy)
        }
    };

    let width = if obj.width > 0.0 { obj.width } else { DEFAULT_SPAWN_EXTENT };
    let height = if obj.height > 0.0 { obj.height } else { DEFAULT_SPAWN_EXTENT };

    SpawnDescriptor {
        kind,
        position: FixedVec2::new(to_fixed(obj.x), to_fixed(obj.y)),
        extent: FixedVec2::new(to_fixed(width), to_fixed(height)),
        properties: obj.properties.clone(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
