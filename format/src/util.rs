//! Bounds checks shared by codec implementations.

use crate::{error::ErrorKind, Error};
use bytes::{Buf, BufMut};

/// Checks that at least `len` bytes remain to be read.
#[inline]
pub fn at_least(buf: &dyn Buf, len: usize) -> Result<(), Error> {
    let remaining = buf.remaining();
    if remaining < len {
        return Err(ErrorKind::EndOfBuffer {
            needed: len,
            remaining,
        }
        .into());
    }
    Ok(())
}

/// Checks that `len` more bytes can be written.
#[inline]
pub fn has_capacity(buf: &dyn BufMut, len: usize) -> Result<(), Error> {
    let remaining = buf.remaining_mut();
    if remaining < len {
        return Err(ErrorKind::EndOfBuffer {
            needed: len,
            remaining,
        }
        .into());
    }
    Ok(())
}

/// Writes `bytes` after checking capacity, returning the number written.
#[inline]
pub fn put(buf: &mut dyn BufMut, bytes: &[u8]) -> Result<usize, Error> {
    has_capacity(buf, bytes.len())?;
    buf.put_slice(bytes);
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_least() {
        let buf = &[1u8, 2, 3][..];
        assert!(at_least(&buf, 3).is_ok());
        assert!(matches!(
            at_least(&buf, 4).unwrap_err().kind(),
            ErrorKind::EndOfBuffer {
                needed: 4,
                remaining: 3
            }
        ));
    }

    #[test]
    fn test_put_into_fixed_slice() {
        let mut backing = [0u8; 2];
        let mut sink = &mut backing[..];
        assert_eq!(put(&mut sink, &[7]).unwrap(), 1);
        assert!(put(&mut sink, &[8, 9]).is_err());
        assert_eq!(put(&mut sink, &[8]).unwrap(), 1);
        assert_eq!(backing, [7, 8]);
    }
}
