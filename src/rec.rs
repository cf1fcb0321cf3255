use std::fs;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nanorand::{tls_rng, Rng};

use super::bytes::{count, string, take};
use super::{string_null_pad, ElmaError, Position, EOR};

// Size of one frame across all columns.
const FRAME_SIZE: usize = 27;
// Size of one event record.
const EVENT_SIZE: usize = 16;
// Header fields following the frame count.
const HEADER_REST: usize = 32;
// Value the game always writes after the frame count.
const HEADER_MAGIC: i32 = 0x83;
// Milliseconds per frame, the game records at 30 fps.
const FRAME_TIME_MS: f64 = 33.333;
// Event time units to milliseconds.
const EVENT_TIME_MS: f64 = 2_289.377_289_38;
// Trailing float the game writes for non-touch events.
const EVENT_EXTRA: u32 = 0x3F7D_70A4;
const GROUND_EXTRA: u32 = 0x3E9E_F901;

/// One frame of replay.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame {
    /// Bike position.
    pub bike: Position<f32>,
    /// Left wheel position.
    pub left_wheel: Position<i16>,
    /// Right wheel position.
    pub right_wheel: Position<i16>,
    /// Head position.
    pub head: Position<i16>,
    /// Bike rotation. Range 0..10000.
    pub rotation: i16,
    /// Left wheel rotation. Range 0..255.
    pub left_wheel_rotation: u8,
    /// Right wheel rotation. Range 0..255.
    pub right_wheel_rotation: u8,
    /// Throttle.
    pub throttle: bool,
    /// Right direction. True = right, False = left.
    pub right: bool,
    /// Spring sound effect volume.
    pub volume: i16,
}

impl Frame {
    /// Returns a new Frame struct with default values.
    ///
    /// # Examples
    ///
    /// ```
    /// let frame = elma::rec::Frame::new();
    /// assert!(!frame.throttle);
    /// ```
    pub fn new() -> Self {
        Frame::default()
    }
}

/// Replay events.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Event {
    /// Time of event.
    pub time: f64,
    /// Event type.
    pub event_type: EventType,
}

/// Type of event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventType {
    /// Apple or flower touch.
    Touch {
        /// Index of touched object.
        index: i16,
    },
    /// Bike turn.
    Turn,
    /// Bike volt right.
    VoltRight,
    /// Bike volt left.
    VoltLeft,
    /// Ground touch, for sound effects. Two types.
    Ground {
        /// If alternative is true, uses the second type.
        alternative: bool,
    },
}

impl Default for EventType {
    fn default() -> EventType {
        EventType::Touch { index: 0 }
    }
}

impl Event {
    /// Returns a new Event struct with default values.
    ///
    /// # Examples
    ///
    /// ```
    /// let event = elma::rec::Event::new();
    /// assert_eq!(event.time, 0.0);
    /// ```
    pub fn new() -> Self {
        Event::default()
    }
}

/// Replay struct
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    /// Whether replay is multi-player or not.
    pub multi: bool,
    /// Whether replay is flag-tag or not.
    pub flag_tag: bool,
    /// Random number to link with level file.
    pub link: u32,
    /// Full level filename.
    pub level: String,
    /// Player one frames.
    pub frames: Vec<Frame>,
    /// Player one events.
    pub events: Vec<Event>,
    /// Player two frames.
    pub frames_2: Vec<Frame>,
    /// Player two events.
    pub events_2: Vec<Event>,
}

impl Default for Replay {
    fn default() -> Replay {
        Replay::new()
    }
}

/// One player's section of a replay file.
struct Ride {
    multi: bool,
    flag_tag: bool,
    link: u32,
    level: String,
    frames: Vec<Frame>,
    events: Vec<Event>,
}

impl Replay {
    /// Return a new Replay struct with a random link.
    ///
    /// # Examples
    ///
    /// ```
    /// let rec = elma::rec::Replay::new();
    /// assert!(rec.frames.is_empty());
    /// ```
    pub fn new() -> Self {
        Replay {
            multi: false,
            flag_tag: false,
            link: tls_rng().generate::<u32>(),
            level: String::new(),
            frames: vec![],
            events: vec![],
            frames_2: vec![],
            events_2: vec![],
        }
    }

    /// Loads a replay file and returns a Replay struct.
    pub fn load<P: AsRef<Path>>(filename: P) -> Result<Self, ElmaError> {
        let path = filename.as_ref();
        let buffer = fs::read(path)?;
        tracing::debug!("loading replay {} ({} bytes)", path.display(), buffer.len());
        Replay::from_bytes(&buffer)
    }

    /// Parses a replay from its binary representation.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, ElmaError> {
        let mut remaining = buffer;

        let first = parse_ride(&mut remaining)?;
        let mut replay = Replay {
            multi: first.multi,
            flag_tag: first.flag_tag,
            link: first.link,
            level: first.level,
            frames: first.frames,
            events: first.events,
            frames_2: vec![],
            events_2: vec![],
        };

        // Player two repeats the header, we only keep its frames and events.
        if replay.multi {
            let second = parse_ride(&mut remaining)?;
            replay.frames_2 = second.frames;
            replay.events_2 = second.events;
        }

        if !remaining.is_empty() {
            tracing::trace!("ignoring {} trailing replay bytes", remaining.len());
        }
        tracing::debug!(
            "parsed replay: {} frames, {} events, multi: {}",
            replay.frames.len(),
            replay.events.len(),
            replay.multi
        );
        Ok(replay)
    }

    /// Returns the binary representation of this replay.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ElmaError> {
        let mut bytes = self.write_ride(&self.frames, &self.events)?;
        if self.multi {
            bytes.extend_from_slice(&self.write_ride(&self.frames_2, &self.events_2)?);
        }
        Ok(bytes)
    }

    /// Save replay as a file.
    pub fn save<P: AsRef<Path>>(&self, filename: P) -> Result<(), ElmaError> {
        let path = filename.as_ref();
        let bytes = self.to_bytes()?;
        tracing::debug!("saving replay {} ({} bytes)", path.display(), bytes.len());
        fs::write(path, bytes)?;
        Ok(())
    }

    fn write_ride(&self, frames: &[Frame], events: &[Event]) -> Result<Vec<u8>, ElmaError> {
        let mut bytes = Vec::with_capacity(
            4 + HEADER_REST + frames.len() * FRAME_SIZE + 4 + events.len() * EVENT_SIZE + 4,
        );

        bytes.write_i32::<LittleEndian>(frames.len() as i32)?;
        bytes.write_i32::<LittleEndian>(HEADER_MAGIC)?;
        bytes.write_i32::<LittleEndian>(i32::from(self.multi))?;
        bytes.write_i32::<LittleEndian>(i32::from(self.flag_tag))?;
        bytes.write_u32::<LittleEndian>(self.link)?;
        bytes.extend_from_slice(&string_null_pad(&self.level, 12)?);
        // Unused.
        bytes.write_i32::<LittleEndian>(0)?;

        write_frames(&mut bytes, frames)?;
        write_events(&mut bytes, events)?;

        bytes.write_i32::<LittleEndian>(EOR)?;
        Ok(bytes)
    }

    /// Get time of replay. Returns tuple with milliseconds and whether replay was finished,
    /// caveat being that there is no way to tell if a replay was finished or not just from the
    /// replay file with a 100% certainty. Merely provided for convenience.
    pub fn get_time_ms(&self) -> (usize, bool) {
        let frame_count = self.frames.len().max(self.frames_2.len());
        let frame_time = frame_count as f64 * FRAME_TIME_MS;

        let touch_time = |events: &[Event]| match events.last() {
            Some(Event { time, event_type: EventType::Touch { .. } }) => *time,
            _ => 0.0,
        };
        let last_touch = touch_time(&self.events).max(touch_time(&self.events_2));

        // Without a final touch the ride was not finished, approximate from frames.
        if last_touch == 0.0 {
            return (frame_time.round() as usize, false);
        }

        let event_time = last_touch * EVENT_TIME_MS;
        // Frames running on for more than a frame after the touch, probably not finished.
        if frame_time > event_time + FRAME_TIME_MS {
            return (frame_time.round() as usize, false);
        }

        (event_time.round() as usize, true)
    }

    /// Get time of replay. Returns tuple with hundredths and whether replay was finished, with the
    /// same caveat as [`Replay::get_time_ms`].
    pub fn get_time_hs(&self) -> (usize, bool) {
        let (time, finished) = self.get_time_ms();
        (time / 10, finished)
    }
}

fn parse_ride(remaining: &mut &[u8]) -> Result<Ride, ElmaError> {
    let frame_count = count(remaining)?;
    // Always 0x83.
    let _ = remaining.read_i32::<LittleEndian>()?;
    let multi = remaining.read_i32::<LittleEndian>()? > 0;
    let flag_tag = remaining.read_i32::<LittleEndian>()? > 0;
    let link = remaining.read_u32::<LittleEndian>()?;
    let level = string(remaining, 12)?;
    // Unused.
    let _ = remaining.read_i32::<LittleEndian>()?;

    let frames = parse_frames(remaining, frame_count)?;
    let event_count = count(remaining)?;
    let events = parse_events(remaining, event_count)?;

    if remaining.read_i32::<LittleEndian>()? != EOR {
        return Err(ElmaError::EORMismatch);
    }

    Ok(Ride {
        multi,
        flag_tag,
        link,
        level,
        frames,
        events,
    })
}

/// Frame data is stored column by column, one column per field.
fn parse_frames(remaining: &mut &[u8], frame_count: usize) -> Result<Vec<Frame>, ElmaError> {
    let mut data = take(remaining, frame_count * FRAME_SIZE)?;
    let n = frame_count;

    let mut bike_x = take(&mut data, n * 4)?;
    let mut bike_y = take(&mut data, n * 4)?;
    let mut left_x = take(&mut data, n * 2)?;
    let mut left_y = take(&mut data, n * 2)?;
    let mut right_x = take(&mut data, n * 2)?;
    let mut right_y = take(&mut data, n * 2)?;
    let mut head_x = take(&mut data, n * 2)?;
    let mut head_y = take(&mut data, n * 2)?;
    let mut rotation = take(&mut data, n * 2)?;
    let mut left_rotation = take(&mut data, n)?;
    let mut right_rotation = take(&mut data, n)?;
    let mut flags = take(&mut data, n)?;
    let mut volume = take(&mut data, n * 2)?;

    let mut frames = Vec::with_capacity(n);
    for _ in 0..n {
        let bike = Position {
            x: bike_x.read_f32::<LittleEndian>()?,
            y: bike_y.read_f32::<LittleEndian>()?,
        };
        let left_wheel = Position {
            x: left_x.read_i16::<LittleEndian>()?,
            y: left_y.read_i16::<LittleEndian>()?,
        };
        let right_wheel = Position {
            x: right_x.read_i16::<LittleEndian>()?,
            y: right_y.read_i16::<LittleEndian>()?,
        };
        let head = Position {
            x: head_x.read_i16::<LittleEndian>()?,
            y: head_y.read_i16::<LittleEndian>()?,
        };
        let rotation = rotation.read_i16::<LittleEndian>()?;
        let left_wheel_rotation = left_rotation.read_u8()?;
        let right_wheel_rotation = right_rotation.read_u8()?;
        let flag = flags.read_u8()?;
        let volume = volume.read_i16::<LittleEndian>()?;

        frames.push(Frame {
            bike,
            left_wheel,
            right_wheel,
            head,
            rotation,
            left_wheel_rotation,
            right_wheel_rotation,
            throttle: flag & 1 != 0,
            right: flag & 2 != 0,
            volume,
        });
    }

    Ok(frames)
}

fn parse_events(remaining: &mut &[u8], event_count: usize) -> Result<Vec<Event>, ElmaError> {
    let mut data = take(remaining, event_count * EVENT_SIZE)?;
    let mut events = Vec::with_capacity(event_count);

    for _ in 0..event_count {
        let time = data.read_f64::<LittleEndian>()?;
        let info = data.read_i16::<LittleEndian>()?;
        let kind = data.read_u8()?;
        // Unknown.
        let _ = data.read_u8()?;
        let _ = data.read_f32::<LittleEndian>()?;

        let event_type = match kind {
            0 => EventType::Touch { index: info },
            1 => EventType::Ground { alternative: false },
            4 => EventType::Ground { alternative: true },
            5 => EventType::Turn,
            6 => EventType::VoltRight,
            7 => EventType::VoltLeft,
            _ => return Err(ElmaError::InvalidEvent(kind)),
        };

        events.push(Event { time, event_type });
    }

    Ok(events)
}

fn write_frames(bytes: &mut Vec<u8>, frames: &[Frame]) -> Result<(), ElmaError> {
    let mut rng = tls_rng();

    for frame in frames {
        bytes.write_f32::<LittleEndian>(frame.bike.x)?;
    }
    for frame in frames {
        bytes.write_f32::<LittleEndian>(frame.bike.y)?;
    }

    let columns: [fn(&Frame) -> i16; 7] = [
        |f: &Frame| f.left_wheel.x,
        |f: &Frame| f.left_wheel.y,
        |f: &Frame| f.right_wheel.x,
        |f: &Frame| f.right_wheel.y,
        |f: &Frame| f.head.x,
        |f: &Frame| f.head.y,
        |f: &Frame| f.rotation,
    ];
    for column in columns.iter() {
        for frame in frames {
            bytes.write_i16::<LittleEndian>(column(frame))?;
        }
    }

    for frame in frames {
        bytes.write_u8(frame.left_wheel_rotation)?;
    }
    for frame in frames {
        bytes.write_u8(frame.right_wheel_rotation)?;
    }

    // The upper bits carry no meaning, the game leaves garbage in them.
    for frame in frames {
        let mut flag = rng.generate::<u8>() & 0xFC;
        if frame.throttle {
            flag |= 1;
        }
        if frame.right {
            flag |= 2;
        }
        bytes.write_u8(flag)?;
    }

    for frame in frames {
        bytes.write_i16::<LittleEndian>(frame.volume)?;
    }

    Ok(())
}

fn write_events(bytes: &mut Vec<u8>, events: &[Event]) -> Result<(), ElmaError> {
    bytes.write_i32::<LittleEndian>(events.len() as i32)?;

    for event in events {
        let (info, kind, extra) = match event.event_type {
            EventType::Touch { index } => (index, 0, 0),
            EventType::Ground { alternative: false } => (-1, 1, GROUND_EXTRA),
            EventType::Ground { alternative: true } => (-1, 4, EVENT_EXTRA),
            EventType::Turn => (-1, 5, EVENT_EXTRA),
            EventType::VoltRight => (-1, 6, EVENT_EXTRA),
            EventType::VoltLeft => (-1, 7, EVENT_EXTRA),
        };
        bytes.write_f64::<LittleEndian>(event.time)?;
        bytes.write_i16::<LittleEndian>(info)?;
        bytes.write_u8(kind)?;
        bytes.write_u8(0)?;
        bytes.write_u32::<LittleEndian>(extra)?;
    }

    Ok(())
}
