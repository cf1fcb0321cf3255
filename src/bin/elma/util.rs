use std::error::Error;
use std::fmt;
use std::io;

/// An error together with the place in this binary that gave up on it.
#[derive(Debug)]
pub struct LocatedError {
    location: &'static std::panic::Location<'static>,
    inner: io::Error,
}

impl fmt::Display for LocatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.inner, self.location)
    }
}

/// Rewrap an error as IO error because we're lazy and this is a decent enough error type.
pub fn as_io_error<T>(err: T) -> io::Error
where
    T: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::Other, err)
}

/// Wrap the errors in such a way that we can figure out where they came from.
#[track_caller]
pub fn anchor_error<E: Error + Send + Sync + 'static>() -> impl FnMut(E) -> LocatedError {
    let location = std::panic::Location::caller();
    move |inner| {
        let inner: Box<dyn std::any::Any> = Box::new(inner);
        match inner.downcast::<io::Error>() {
            Ok(inner) => LocatedError {
                location,
                inner: *inner,
            },
            Err(inner) => {
                // Only `E` can be in the box.
                let inner = match inner.downcast::<E>() {
                    Ok(inner) => *inner,
                    Err(_) => unreachable!(),
                };
                LocatedError {
                    location,
                    inner: as_io_error(inner),
                }
            }
        }
    }
}
