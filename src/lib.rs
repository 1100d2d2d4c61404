//! ClothesFS is a small block-addressable on-disk filesystem. A volume is an
//! array of equal-size blocks: block 0 carries the superblock, block 1 the
//! root directory, and everything else is either metadata (directory and
//! file headers plus their continuation blocks), payload (file content), or
//! a member of the free chain threaded through the superblock.
//!
//! The crate covers both sides of the format: the write-capable authoring
//! engine ([`ClothesFs`]) and the traversal machinery a read-only mount
//! needs ([`Synced`] and its directory iterators). The core is `no_std`
//! (plus `alloc`); the `std` feature adds a file-backed device and an
//! OS-seeded `format`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
extern crate alloc;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;

pub mod device;
pub mod error;
pub mod fs;
pub mod sys;

pub use device::BlockDevice;
pub use error::Error;
pub use fs::sync::{DirEntry, DirIter, ReadDir, Synced};
pub use fs::ClothesFs;

#[cfg(test)]
mod tests {
    use crate::sys::{meta, superblock};

    #[test]
    fn layout() {
        assert_eq!(superblock::SUPERBLOCK_LEN, 108);
        assert_eq!(superblock::MAGIC.to_le_bytes(), [0x00, 0x42, 0x00, 0x41]);
        assert_eq!(meta::table_start(meta::MetaKind::Dir, 0), 16);
        assert_eq!(meta::table_start(meta::MetaKind::File, 5), 24);
        assert_eq!(meta::table_start(meta::MetaKind::DirCont, 0), 4);
        assert_eq!(meta::table_start(meta::MetaKind::FileCont, 0), 4);
    }
}
