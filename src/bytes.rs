//! Cursor helpers shared by the level and replay codecs.
use std::io;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::{trim_string, ElmaError};

/// Split off the next `len` bytes, failing instead of panicking on short input.
pub(crate) fn take<'a>(data: &mut &'a [u8], len: usize) -> Result<&'a [u8], ElmaError> {
    if data.len() < len {
        return Err(ElmaError::Io(io::ErrorKind::UnexpectedEof));
    }
    let (head, tail) = data.split_at(len);
    *data = tail;
    Ok(head)
}

/// Read a fixed-width, NUL padded string field.
pub(crate) fn string(data: &mut &[u8], len: usize) -> Result<String, ElmaError> {
    trim_string(take(data, len)?)
}

/// Read an i32 element count.
pub(crate) fn count(data: &mut &[u8]) -> Result<usize, ElmaError> {
    let count = data.read_i32::<LittleEndian>()?;
    usize_count(count)
}

/// Validate an element count that was decoded some other way.
pub(crate) fn usize_count(count: i32) -> Result<usize, ElmaError> {
    if count < 0 {
        return Err(ElmaError::InvalidCount(count));
    }
    Ok(count as usize)
}

/// Read a count stored as `f64` with a magic fractional offset.
pub(crate) fn float_count(data: &mut &[u8], offset: f64) -> Result<usize, ElmaError> {
    let raw = data.read_f64::<LittleEndian>()?;
    let count = (raw - offset).round();
    if !(0.0..=f64::from(i32::MAX)).contains(&count) {
        return Err(ElmaError::InvalidCount(count as i32));
    }
    Ok(count as usize)
}
