use core::fmt;

#[cfg(any(test, feature = "std"))]
use std::io;

/// The set of all possible errors
#[derive(Debug)]
pub enum Error {
    /// Superblock magic did not match; carries the value that was found
    BadMagic(u32),
    /// Block carried an unexpected id field (block index, found id)
    BadBlockId(u32, u16),
    /// Block carried an unexpected or unknown type byte (block index, found type)
    BadBlockType(u32, u8),
    /// Access past the end of the device or of a chain
    OutOfBounds(u64),
    /// The free chain is empty
    OutOfSpace,
    /// Name does not fit in a metadata block
    NameTooLong(usize),
    /// Unusable argument: zero parent block, undersized sector, cursor past end
    InvalidArgument,
    /// Refusing to remove a directory that still has children
    NotEmpty(u32),
    #[cfg(any(test, feature = "std"))]
    Io(io::Error),
}

#[cfg(any(test, feature = "std"))]
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl PartialEq for Error {
    fn eq(&self, rhs: &Error) -> bool {
        match (self, rhs) {
            (&Error::BadMagic(a), &Error::BadMagic(b)) => a == b,
            (&Error::BadBlockId(a1, a2), &Error::BadBlockId(b1, b2)) => a1 == b1 && a2 == b2,
            (&Error::BadBlockType(a1, a2), &Error::BadBlockType(b1, b2)) => a1 == b1 && a2 == b2,
            (&Error::OutOfBounds(a), &Error::OutOfBounds(b)) => a == b,
            (&Error::OutOfSpace, &Error::OutOfSpace) => true,
            (&Error::NameTooLong(a), &Error::NameTooLong(b)) => a == b,
            (&Error::InvalidArgument, &Error::InvalidArgument) => true,
            (&Error::NotEmpty(a), &Error::NotEmpty(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::BadMagic(found) => write!(f, "bad superblock magic {:#010x}", found),
            Error::BadBlockId(block, id) => {
                write!(f, "block {} has unexpected id {:#06x}", block, id)
            }
            Error::BadBlockType(block, ty) => {
                write!(f, "block {} has unexpected type {:#04x}", block, ty)
            }
            Error::OutOfBounds(at) => write!(f, "access out of bounds at {}", at),
            Error::OutOfSpace => write!(f, "no free blocks left"),
            Error::NameTooLong(len) => write!(f, "name of {} bytes does not fit a block", len),
            Error::InvalidArgument => write!(f, "invalid argument"),
            Error::NotEmpty(block) => write!(f, "directory at block {} is not empty", block),
            #[cfg(any(test, feature = "std"))]
            Error::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for Error {}
