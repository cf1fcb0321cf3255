use std::fs;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nanorand::{tls_rng, Rng};

use super::bytes::{float_count, string, take, usize_count};
use super::{string_null_pad, ElmaError, Position, EOD, EOF};

// Fractional offsets the game adds to stored element counts.
const POLYGON_OFFSET: f64 = 0.464_364_3;
const OBJECT_OFFSET: f64 = 0.464_364_3;
const PICTURE_OFFSET: f64 = 0.234_567_2;
// Scale applied to the coordinate sum in the first integrity value.
const INTEGRITY_SCALE: f64 = 3_247.764_325_643;
/// Size of the encrypted best-time section.
pub const TOP10_SIZE: usize = 688;
// One decrypted table: count, times, first names, second names.
const TOP10_TABLE: usize = 344;
const TOP10_ENTRIES: usize = 10;
const TOP10_NAME: usize = 15;

/// Game version a level was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Elasto Mania.
    Elma,
    /// Across. Only detected, never decoded.
    Across,
}

impl Default for Version {
    fn default() -> Version {
        Version::Elma
    }
}

/// Polygon struct.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Polygon {
    /// Grass polygons only shape the ground texture, the bike passes through them.
    pub grass: bool,
    /// Vertices in order.
    pub vertices: Vec<Position<f64>>,
}

impl Polygon {
    /// Create a new, empty polygon.
    pub fn new() -> Self {
        Polygon::default()
    }
}

/// Apple gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Leave gravity as it is.
    Normal,
    /// Gravity up.
    Up,
    /// Gravity down.
    Down,
    /// Gravity left.
    Left,
    /// Gravity right.
    Right,
}

impl Default for Direction {
    fn default() -> Direction {
        Direction::Normal
    }
}

/// Type of object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectType {
    /// Exit, or flower.
    Exit,
    /// Apple.
    Apple {
        /// Gravity change when taken.
        gravity: Direction,
        /// Animation number, 1 through 9.
        animation: i32,
    },
    /// Killer.
    Killer,
    /// Player start position.
    Player,
}

impl Default for ObjectType {
    fn default() -> ObjectType {
        ObjectType::Apple {
            gravity: Direction::Normal,
            animation: 1,
        }
    }
}

impl ObjectType {
    fn id(&self) -> i32 {
        match self {
            ObjectType::Exit => 1,
            ObjectType::Apple { .. } => 2,
            ObjectType::Killer => 3,
            ObjectType::Player => 4,
        }
    }
}

/// Object struct.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Object {
    /// Position of object center.
    pub position: Position<f64>,
    /// Type of object.
    pub object_type: ObjectType,
}

/// Picture clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clip {
    /// Drawn over everything.
    Unclipped,
    /// Only drawn over ground.
    Ground,
    /// Only drawn over sky.
    Sky,
}

impl Default for Clip {
    fn default() -> Clip {
        Clip::Sky
    }
}

/// Picture struct.
///
/// A picture either names a picture from the LGR, or combines a `texture` with a `mask`.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    /// Picture name.
    pub name: String,
    /// Texture name.
    pub texture: String,
    /// Mask name.
    pub mask: String,
    /// Position of the top left corner.
    pub position: Position<f64>,
    /// Z-distance, 1 through 999.
    pub distance: i32,
    /// Clipping.
    pub clip: Clip,
}

impl Default for Picture {
    fn default() -> Picture {
        Picture {
            name: String::from("barrel"),
            texture: String::new(),
            mask: String::new(),
            position: Position::default(),
            distance: 600,
            clip: Clip::Sky,
        }
    }
}

/// Top10 list entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Player one name.
    pub name_1: String,
    /// Player two name, empty for single-player times.
    pub name_2: String,
    /// Time in hundredths.
    pub time: i32,
}

/// Whether to keep the best-time tables when saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Top10Save {
    /// Write the tables as they are.
    Yes,
    /// Write empty tables.
    No,
}

/// Level struct that contains all level information.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    /// Elma or Across level.
    pub version: Version,
    /// Random number that links level file to replay files.
    pub link: u32,
    /// Contains four integrity checks (See calculate_integrity_sums()).
    pub integrity: [f64; 4],
    /// Level name.
    pub name: String,
    /// LGR file name.
    pub lgr: String,
    /// Ground texture name.
    pub ground: String,
    /// Sky texture name.
    pub sky: String,
    /// Vector with all polygons (See Polygon).
    pub polygons: Vec<Polygon>,
    /// Vector with all objects (See Object).
    pub objects: Vec<Object>,
    /// Vector with all pictures (See Picture).
    pub pictures: Vec<Picture>,
    /// Vector of Top10 single-player names and times.
    pub top10_single: Vec<ListEntry>,
    /// Vector of Top10 multi-player names and times.
    pub top10_multi: Vec<ListEntry>,
}

impl Default for Level {
    fn default() -> Level {
        Level::new()
    }
}

impl Level {
    /// Returns new Level struct with a random link and default textures.
    ///
    /// # Examples
    ///
    /// ```
    /// let level = elma::lev::Level::new();
    /// assert_eq!(level.lgr, "default");
    /// ```
    pub fn new() -> Self {
        Level {
            version: Version::Elma,
            link: tls_rng().generate::<u32>(),
            integrity: [0.0; 4],
            name: String::new(),
            lgr: String::from("default"),
            ground: String::from("ground"),
            sky: String::from("sky"),
            polygons: vec![],
            objects: vec![],
            pictures: vec![],
            top10_single: vec![],
            top10_multi: vec![],
        }
    }

    /// Loads a level file and returns a Level struct.
    pub fn load<P: AsRef<Path>>(filename: P) -> Result<Self, ElmaError> {
        let path = filename.as_ref();
        let buffer = fs::read(path)?;
        tracing::debug!("loading level {} ({} bytes)", path.display(), buffer.len());
        Level::from_bytes(&buffer)
    }

    /// Parses a level from its binary representation.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, ElmaError> {
        let mut remaining = buffer;

        let version = match take(&mut remaining, 5)? {
            b"POT14" => Version::Elma,
            b"POT06" => return Err(ElmaError::AcrossUnsupported),
            _ => return Err(ElmaError::InvalidLevelFile),
        };

        // Lower 16 bits of the link, repeated in full below.
        let _ = remaining.read_u16::<LittleEndian>()?;
        let link = remaining.read_u32::<LittleEndian>()?;
        let mut integrity = [0.0; 4];
        for sum in integrity.iter_mut() {
            *sum = remaining.read_f64::<LittleEndian>()?;
        }

        let name = string(&mut remaining, 51)?;
        let lgr = string(&mut remaining, 16)?;
        let ground = string(&mut remaining, 10)?;
        let sky = string(&mut remaining, 10)?;

        let polygons = parse_polygons(&mut remaining)?;
        let objects = parse_objects(&mut remaining)?;
        let pictures = parse_pictures(&mut remaining)?;

        if remaining.read_i32::<LittleEndian>()? != EOD {
            return Err(ElmaError::EODMismatch);
        }

        let top10 = crypt_top10(take(&mut remaining, TOP10_SIZE)?);
        let (single, multi) = top10.split_at(TOP10_TABLE);
        let top10_single = parse_top10(single)?;
        let top10_multi = parse_top10(multi)?;

        if remaining.read_i32::<LittleEndian>()? != EOF {
            return Err(ElmaError::EOFMismatch);
        }

        tracing::debug!(
            "parsed level {:?}: {} polygons, {} objects, {} pictures",
            name,
            polygons.len(),
            objects.len(),
            pictures.len()
        );

        Ok(Level {
            version,
            link,
            integrity,
            name,
            lgr,
            ground,
            sky,
            polygons,
            objects,
            pictures,
            top10_single,
            top10_multi,
        })
    }

    /// Returns the binary representation of this level, with freshly computed integrity sums.
    pub fn to_bytes(&self, top10: Top10Save) -> Result<Vec<u8>, ElmaError> {
        if self.version == Version::Across {
            return Err(ElmaError::AcrossUnsupported);
        }
        let mut bytes = vec![];

        bytes.extend_from_slice(b"POT14");
        bytes.write_u16::<LittleEndian>((self.link & 0xFFFF) as u16)?;
        bytes.write_u32::<LittleEndian>(self.link)?;
        for sum in self.calculate_integrity_sums().iter() {
            bytes.write_f64::<LittleEndian>(*sum)?;
        }

        bytes.extend_from_slice(&string_null_pad(&self.name, 51)?);
        bytes.extend_from_slice(&string_null_pad(&self.lgr, 16)?);
        bytes.extend_from_slice(&string_null_pad(&self.ground, 10)?);
        bytes.extend_from_slice(&string_null_pad(&self.sky, 10)?);

        self.write_polygons(&mut bytes)?;
        self.write_objects(&mut bytes)?;
        self.write_pictures(&mut bytes)?;
        bytes.write_i32::<LittleEndian>(EOD)?;

        let mut tables = Vec::with_capacity(TOP10_SIZE);
        match top10 {
            Top10Save::Yes => {
                tables.extend_from_slice(&write_top10(&self.top10_single)?);
                tables.extend_from_slice(&write_top10(&self.top10_multi)?);
            }
            Top10Save::No => tables.resize(TOP10_SIZE, 0),
        }
        bytes.extend_from_slice(&crypt_top10(&tables));
        bytes.write_i32::<LittleEndian>(EOF)?;

        Ok(bytes)
    }

    /// Save level as a file.
    pub fn save<P: AsRef<Path>>(&self, filename: P, top10: Top10Save) -> Result<(), ElmaError> {
        let path = filename.as_ref();
        let bytes = self.to_bytes(top10)?;
        tracing::debug!("saving level {} ({} bytes)", path.display(), bytes.len());
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Compute the four integrity values the game checks before loading a level.
    ///
    /// The first is a scaled sum of all coordinates and object types. The other three offset it
    /// by random integers drawn from ranges the game accepts, so every call returns new values
    /// that still validate against the same first sum.
    pub fn calculate_integrity_sums(&self) -> [f64; 4] {
        let polygon_sum: f64 = self
            .polygons
            .iter()
            .flat_map(|polygon| polygon.vertices.iter())
            .map(|vertex| vertex.x + vertex.y)
            .sum();
        let object_sum: f64 = self
            .objects
            .iter()
            .map(|object| {
                object.position.x + object.position.y + f64::from(object.object_type.id())
            })
            .sum();
        let picture_sum: f64 = self
            .pictures
            .iter()
            .map(|picture| picture.position.x + picture.position.y)
            .sum();

        let sum = (polygon_sum + object_sum + picture_sum) * INTEGRITY_SCALE;

        let mut rng = tls_rng();
        let mut offset = |start: u32, len: u32| f64::from(start + rng.generate_range(0..len));
        [
            sum,
            offset(11_877, 5_871) - sum,
            offset(11_877, 5_871) - sum,
            offset(12_112, 6_102) - sum,
        ]
    }

    fn write_polygons(&self, bytes: &mut Vec<u8>) -> Result<(), ElmaError> {
        bytes.write_f64::<LittleEndian>(self.polygons.len() as f64 + POLYGON_OFFSET)?;
        for polygon in &self.polygons {
            bytes.write_i32::<LittleEndian>(i32::from(polygon.grass))?;
            bytes.write_i32::<LittleEndian>(polygon.vertices.len() as i32)?;
            for vertex in &polygon.vertices {
                bytes.write_f64::<LittleEndian>(vertex.x)?;
                bytes.write_f64::<LittleEndian>(vertex.y)?;
            }
        }
        Ok(())
    }

    fn write_objects(&self, bytes: &mut Vec<u8>) -> Result<(), ElmaError> {
        bytes.write_f64::<LittleEndian>(self.objects.len() as f64 + OBJECT_OFFSET)?;
        for object in &self.objects {
            let (gravity, animation) = match object.object_type {
                ObjectType::Apple { gravity, animation } => (gravity, animation.wrapping_sub(1)),
                _ => (Direction::Normal, 0),
            };
            let gravity = match gravity {
                Direction::Normal => 0,
                Direction::Up => 1,
                Direction::Down => 2,
                Direction::Left => 3,
                Direction::Right => 4,
            };

            bytes.write_f64::<LittleEndian>(object.position.x)?;
            bytes.write_f64::<LittleEndian>(object.position.y)?;
            bytes.write_i32::<LittleEndian>(object.object_type.id())?;
            bytes.write_i32::<LittleEndian>(gravity)?;
            bytes.write_i32::<LittleEndian>(animation)?;
        }
        Ok(())
    }

    fn write_pictures(&self, bytes: &mut Vec<u8>) -> Result<(), ElmaError> {
        bytes.write_f64::<LittleEndian>(self.pictures.len() as f64 + PICTURE_OFFSET)?;
        for picture in &self.pictures {
            bytes.extend_from_slice(&string_null_pad(&picture.name, 10)?);
            bytes.extend_from_slice(&string_null_pad(&picture.texture, 10)?);
            bytes.extend_from_slice(&string_null_pad(&picture.mask, 10)?);
            bytes.write_f64::<LittleEndian>(picture.position.x)?;
            bytes.write_f64::<LittleEndian>(picture.position.y)?;
            bytes.write_i32::<LittleEndian>(picture.distance)?;
            bytes.write_i32::<LittleEndian>(match picture.clip {
                Clip::Unclipped => 0,
                Clip::Ground => 1,
                Clip::Sky => 2,
            })?;
        }
        Ok(())
    }
}

fn parse_polygons(remaining: &mut &[u8]) -> Result<Vec<Polygon>, ElmaError> {
    let polygon_count = float_count(remaining, POLYGON_OFFSET)?;
    let mut polygons = Vec::with_capacity(polygon_count.min(remaining.len() / 8));
    for _ in 0..polygon_count {
        let grass = remaining.read_i32::<LittleEndian>()? > 0;
        let vertex_count = usize_count(remaining.read_i32::<LittleEndian>()?)?;
        let mut vertices = Vec::with_capacity(vertex_count.min(remaining.len() / 16));
        for _ in 0..vertex_count {
            let x = remaining.read_f64::<LittleEndian>()?;
            let y = remaining.read_f64::<LittleEndian>()?;
            vertices.push(Position { x, y });
        }
        polygons.push(Polygon { grass, vertices });
    }
    Ok(polygons)
}

fn parse_objects(remaining: &mut &[u8]) -> Result<Vec<Object>, ElmaError> {
    let object_count = float_count(remaining, OBJECT_OFFSET)?;
    let mut objects = Vec::with_capacity(object_count.min(remaining.len() / 28));
    for _ in 0..object_count {
        let x = remaining.read_f64::<LittleEndian>()?;
        let y = remaining.read_f64::<LittleEndian>()?;
        let object_type = remaining.read_i32::<LittleEndian>()?;
        let gravity = remaining.read_i32::<LittleEndian>()?;
        let animation = remaining.read_i32::<LittleEndian>()?.wrapping_add(1);

        let object_type = match object_type {
            1 => ObjectType::Exit,
            2 => ObjectType::Apple {
                gravity: match gravity {
                    0 => Direction::Normal,
                    1 => Direction::Up,
                    2 => Direction::Down,
                    3 => Direction::Left,
                    4 => Direction::Right,
                    other => return Err(ElmaError::InvalidGravity(other)),
                },
                animation,
            },
            3 => ObjectType::Killer,
            4 => ObjectType::Player,
            other => return Err(ElmaError::InvalidObject(other)),
        };

        objects.push(Object {
            position: Position { x, y },
            object_type,
        });
    }
    Ok(objects)
}

fn parse_pictures(remaining: &mut &[u8]) -> Result<Vec<Picture>, ElmaError> {
    let picture_count = float_count(remaining, PICTURE_OFFSET)?;
    let mut pictures = Vec::with_capacity(picture_count.min(remaining.len() / 54));
    for _ in 0..picture_count {
        let name = string(remaining, 10)?;
        let texture = string(remaining, 10)?;
        let mask = string(remaining, 10)?;
        let x = remaining.read_f64::<LittleEndian>()?;
        let y = remaining.read_f64::<LittleEndian>()?;
        let distance = remaining.read_i32::<LittleEndian>()?;
        let clip = match remaining.read_i32::<LittleEndian>()? {
            0 => Clip::Unclipped,
            1 => Clip::Ground,
            2 => Clip::Sky,
            other => return Err(ElmaError::InvalidClipping(other)),
        };

        pictures.push(Picture {
            name,
            texture,
            mask,
            position: Position { x, y },
            distance,
            clip,
        });
    }
    Ok(pictures)
}

/// Decode one decrypted best-time table.
fn parse_top10(table: &[u8]) -> Result<Vec<ListEntry>, ElmaError> {
    let mut cursor = table;
    // The game never stores more than ten, anything above is corrupt filler.
    let count = usize_count(cursor.read_i32::<LittleEndian>()?)?.min(TOP10_ENTRIES);

    let mut times = take(&mut cursor, TOP10_ENTRIES * 4)?;
    let mut names_1 = take(&mut cursor, TOP10_ENTRIES * TOP10_NAME)?;
    let mut names_2 = take(&mut cursor, TOP10_ENTRIES * TOP10_NAME)?;

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(ListEntry {
            time: times.read_i32::<LittleEndian>()?,
            name_1: string(&mut names_1, TOP10_NAME)?,
            name_2: string(&mut names_2, TOP10_NAME)?,
        });
    }
    Ok(entries)
}

/// Encode one best-time table, fastest ten first.
fn write_top10(entries: &[ListEntry]) -> Result<Vec<u8>, ElmaError> {
    let mut sorted: Vec<&ListEntry> = entries.iter().collect();
    sorted.sort_by_key(|entry| entry.time);
    sorted.truncate(TOP10_ENTRIES);

    let mut times = vec![0u8; TOP10_ENTRIES * 4];
    let mut names_1 = vec![0u8; TOP10_ENTRIES * TOP10_NAME];
    let mut names_2 = vec![0u8; TOP10_ENTRIES * TOP10_NAME];
    for (n, entry) in sorted.iter().enumerate() {
        times[n * 4..][..4].copy_from_slice(&entry.time.to_le_bytes());
        let name = n * TOP10_NAME..(n + 1) * TOP10_NAME;
        names_1[name.clone()].copy_from_slice(&string_null_pad(&entry.name_1, TOP10_NAME)?);
        names_2[name].copy_from_slice(&string_null_pad(&entry.name_2, TOP10_NAME)?);
    }

    let mut table = Vec::with_capacity(TOP10_TABLE);
    table.write_i32::<LittleEndian>(sorted.len() as i32)?;
    table.extend_from_slice(&times);
    table.extend_from_slice(&names_1);
    table.extend_from_slice(&names_2);
    Ok(table)
}

/// Decrypt and encrypt top10 list data. Same operation for both.
///
/// Only the first 688 bytes are processed, the length of the stored tables.
///
/// # Examples
///
/// ```
/// let data = vec![0x55u8; 688];
/// let encrypted = elma::lev::crypt_top10(&data);
/// assert_ne!(encrypted, data);
/// assert_eq!(elma::lev::crypt_top10(&encrypted), data);
/// ```
pub fn crypt_top10(top10: &[u8]) -> Vec<u8> {
    let mut top10 = top10[..top10.len().min(TOP10_SIZE)].to_vec();
    let mut ebp8: i16 = 0x15;
    let mut ebp10: i16 = 0x2637;

    for byte in top10.iter_mut() {
        *byte ^= (ebp8 & 0xFF) as u8;
        ebp10 = ebp10.wrapping_add((ebp8 % 0xD3D).wrapping_mul(0xD3D));
        ebp8 = ebp10.wrapping_mul(0x1F).wrapping_add(0xD3D);
    }

    top10
}
