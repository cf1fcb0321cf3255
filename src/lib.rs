#![doc(html_root_url = "https://hexjelly.github.io/elma-rust/")]
#![deny(missing_docs)]

//! Library for reading and writing Elasto Mania files.
//!
//! Levels live in [`lev`], replays in [`rec`]. Both formats are little endian with fixed-width,
//! NUL padded ASCII strings; the helpers at the crate root deal with those strings and with the
//! time format used in best-time tables.
mod bytes;

/// Read and write Elasto Mania level files.
pub mod lev;
/// Read and write Elasto Mania replay files.
pub mod rec;

use std::{io, string};

/// General errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ElmaError {
    /// Across files are not supported.
    #[error("Across levels are not supported")]
    AcrossUnsupported,
    /// Not a level file.
    #[error("not a level file")]
    InvalidLevelFile,
    /// Invalid gravity value.
    #[error("invalid apple gravity value {0}")]
    InvalidGravity(i32),
    /// Invalid object value.
    #[error("invalid object type {0}")]
    InvalidObject(i32),
    /// Invalid clipping value.
    #[error("invalid picture clipping value {0}")]
    InvalidClipping(i32),
    /// End-of-data marker mismatch.
    #[error("end-of-data marker mismatch")]
    EODMismatch,
    /// End-of-file marker mismatch.
    #[error("end-of-file marker mismatch")]
    EOFMismatch,
    /// Invalid event value.
    #[error("invalid replay event type {0}")]
    InvalidEvent(u8),
    /// End-of-replay marker mismatch.
    #[error("end-of-replay marker mismatch")]
    EORMismatch,
    /// Invalid time format.
    #[error("time can not be formatted as MM:SS,HH")]
    InvalidTimeFormat,
    /// Too short padding.
    #[error("string is longer than its padding ({0})")]
    PaddingTooShort(isize),
    /// String contains non-ASCII characters.
    #[error("string contains non-ASCII characters")]
    NonASCII,
    /// A stored element count is negative.
    #[error("invalid element count {0}")]
    InvalidCount(i32),
    /// Input/output errors from std::io use.
    #[error("i/o error: {0:?}")]
    Io(io::ErrorKind),
    /// String errors from std::String.
    #[error("invalid UTF-8 after {0} bytes")]
    StringFromUtf8(usize),
}

impl From<io::Error> for ElmaError {
    fn from(err: io::Error) -> ElmaError {
        ElmaError::Io(err.kind())
    }
}

impl From<string::FromUtf8Error> for ElmaError {
    fn from(err: string::FromUtf8Error) -> ElmaError {
        ElmaError::StringFromUtf8(err.utf8_error().valid_up_to())
    }
}

/// Shared position struct used in both sub-modules.
///
/// # Examples
/// ```
/// let vertex = elma::Position { x: 23.1928_f64, y: -199.200019_f64 };
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Position<T> {
    /// X-position.
    pub x: T,
    /// Y-position.
    pub y: T,
}

/// Trims trailing bytes after and including null byte.
///
/// # Examples
/// All strings in Elma files are C-strings padded with null bytes. Anything after the first null
/// byte is garbage left over by the game and is dropped.
///
/// ```
/// let cstring: [u8; 10] = [0x45, 0x6C, 0x6D, 0x61, 0x00, 0x00, 0x00, 0x7E, 0x7E, 0x7E];
/// let trimmed = elma::trim_string(&cstring).unwrap();
/// assert_eq!(trimmed, "Elma");
/// ```
pub fn trim_string(data: &[u8]) -> Result<String, ElmaError> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let trimmed = String::from_utf8(data[..end].to_vec())?;
    Ok(trimmed)
}

/// Converts the string-as-i32 times in top10 list to strings.
///
/// # Examples
/// Best times are stored as an i32 whose decimal digits read as `MMSSHH`. This formats them as
/// "00:00,00".
///
/// ```
/// let formatted = elma::time_format(2039).unwrap();
/// assert_eq!("00:20,39", formatted);
/// ```
pub fn time_format(time: i32) -> Result<String, ElmaError> {
    if time < 0 {
        return Err(ElmaError::InvalidTimeFormat);
    }
    // Longer than six digits.
    if time > 999_999 {
        return Ok(String::from("59:59,99"));
    }

    let hundredths = time % 100;
    let seconds = time / 100 % 100;
    let minutes = time / 10_000;
    if seconds >= 60 || minutes >= 60 {
        return Err(ElmaError::InvalidTimeFormat);
    }

    Ok(format!("{:02}:{:02},{:02}", minutes, seconds, hundredths))
}

/// Pads a string with null bytes.
///
/// # Examples
/// Strings written to an Elma file occupy a fixed-width field. This creates a zero-filled vector
/// of `pad` bytes, then fills in the string.
///
/// ```
/// let padded = elma::string_null_pad("Elma", 10).unwrap();
/// assert_eq!(&padded, &[0x45, 0x6C, 0x6D, 0x61, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
/// ```
pub fn string_null_pad(name: &str, pad: usize) -> Result<Vec<u8>, ElmaError> {
    let name = name.as_bytes();

    if !name.is_ascii() {
        return Err(ElmaError::NonASCII);
    }
    if name.len() > pad {
        return Err(ElmaError::PaddingTooShort(pad as isize - name.len() as isize));
    }

    let mut bytes = vec![0u8; pad];
    bytes[..name.len()].copy_from_slice(name);
    Ok(bytes)
}

/// Diameter of player head.
pub const HEAD_DIAMETER: f64 = 0.476;
/// Radius of player head.
pub const HEAD_RADIUS: f64 = 0.238;
/// Diameter of objects (and wheels).
pub const OBJECT_DIAMETER: f64 = 0.8;
/// Radius of objects (and wheels).
pub const OBJECT_RADIUS: f64 = 0.4;

// Magic arbitrary number signifying end-of-data in level file.
const EOD: i32 = 0x0067_103A;
// Magic arbitrary number signifying end-of-file in level file.
const EOF: i32 = 0x0084_5D52;
// Magic arbitrary number to signify end of replay file.
const EOR: i32 = 0x0049_2F75;
