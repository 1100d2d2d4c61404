//! The format engine: per-mount context, block I/O fan-out, the free-block
//! chain, and the metadata/payload state machines behind `add_file` and
//! `add_dir`.

use alloc::vec::Vec;

use rand_core::RngCore;

use crate::device::{split, BlockDevice};
use crate::error::Error;
use crate::sys::{self, meta, superblock};
use crate::sys::meta::{MetaHeader, MetaKind};
use crate::sys::payload::{Algo, PayloadHeader, PayloadKind};
use crate::sys::superblock::Superblock;

pub mod sync;

/// Block size written by `format` unless overridden.
pub const DEFAULT_BLOCK_SIZE: u32 = 512;

/// Index of the root directory's first metadata block.
pub const ROOT_BLOCK: u32 = 1;

/// Lowest block that can belong to the free chain.
const FIRST_FREE: u32 = 2;

/// A ClothesFS volume over a block device. Holds the per-mount context:
/// block size, volume size, and the derived geometry. All multi-step
/// operations assume external serialization (see [`sync::Synced`]).
pub struct ClothesFs<D: BlockDevice> {
    device: D,
    block_size: u32,
    blocks: u32,
    block_in_sectors: u32,
    size: u64,
}

impl<D: BlockDevice> ClothesFs<D> {
    /// Wrap `device` without probing it; `detect` or `format` establish the
    /// volume geometry.
    pub fn new(device: D) -> ClothesFs<D> {
        ClothesFs::with_block_size(device, DEFAULT_BLOCK_SIZE)
    }

    /// Like [`ClothesFs::new`] with a non-default block size for `format`.
    /// The geometry is validated once `format` or `detect` runs.
    pub fn with_block_size(device: D, block_size: u32) -> ClothesFs<D> {
        let size = device.size();
        let sector = device.sector_size();
        let block_in_sectors = if sector > 0 && block_size >= sector {
            block_size / sector
        } else {
            0
        };
        let blocks = if block_size > 0 {
            (size / block_size as u64) as u32
        } else {
            0
        };
        ClothesFs {
            device,
            block_size,
            blocks,
            block_in_sectors,
            size,
        }
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn total_blocks(&self) -> u32 {
        self.blocks
    }

    /// Volume size in bytes.
    pub fn volume_size(&self) -> u64 {
        self.size
    }

    fn geometry_for(&self, block_size: u32, size: u64) -> Result<(u32, u32), Error> {
        let sector = self.device.sector_size();
        if sector == 0
            || (sector as usize) < superblock::SUPERBLOCK_LEN
            || block_size < sector
            || block_size % sector != 0
            || block_size > u16::MAX as u32
        {
            return Err(Error::InvalidArgument);
        }
        Ok(((size / block_size as u64) as u32, block_size / sector))
    }

    /// Read the block at `index` into `buf` (one buffer per caller; buffers
    /// are never shared between cursors). Fans out into one device access
    /// per sector.
    pub(crate) fn get_block(&self, index: u32, buf: &mut [u8]) -> Result<(), Error> {
        let sector = self.device.sector_size() as usize;
        debug_assert!(buf.len() >= self.block_size as usize);
        for j in 0..self.block_in_sectors {
            let pos = index as u64 * self.block_size as u64 + j as u64 * sector as u64;
            let (lo, hi) = split(pos);
            let at = j as usize * sector;
            self.device
                .read(&mut buf[at..at + sector], 1, lo, hi)
                .map_err(Into::into)?;
        }
        Ok(())
    }

    /// Write `buf` to the block at `index`, one device access per sector.
    /// Partial writes are not rolled back.
    pub(crate) fn put_block(&mut self, index: u32, buf: &[u8]) -> Result<(), Error> {
        let sector = self.device.sector_size() as usize;
        debug_assert!(buf.len() >= self.block_size as usize);
        for j in 0..self.block_in_sectors {
            let pos = index as u64 * self.block_size as u64 + j as u64 * sector as u64;
            let (lo, hi) = split(pos);
            let at = j as usize * sector;
            self.device
                .write(&buf[at..at + sector], 1, lo, hi)
                .map_err(Into::into)?;
        }
        Ok(())
    }

    /// Probe sector 0 for a superblock and cache the geometry it declares.
    pub(crate) fn probe(&mut self) -> Result<Superblock, Error> {
        let sector = self.device.sector_size() as usize;
        if sector < superblock::SUPERBLOCK_LEN {
            return Err(Error::InvalidArgument);
        }
        let mut buf = vec![0; sector];
        self.device.read(&mut buf, 1, 0, 0).map_err(Into::into)?;
        let sb = Superblock::decode(&buf)?;
        let (blocks, block_in_sectors) = self.geometry_for(sb.block_size as u32, sb.size)?;
        self.block_size = sb.block_size as u32;
        self.size = sb.size;
        self.blocks = blocks;
        self.block_in_sectors = block_in_sectors;
        Ok(sb)
    }

    /// Detection is a probe: every failure comes back as `false`, never as
    /// an error.
    pub fn detect(&mut self) -> bool {
        match self.probe() {
            Ok(sb) => {
                debug!(
                    "detected volume {:#018x}, {} blocks of {}",
                    sb.volume_id, self.blocks, self.block_size
                );
                true
            }
            Err(err) => {
                debug!("detect failed: {}", err);
                false
            }
        }
    }

    /// Read and decode the superblock.
    pub fn superblock(&self) -> Result<Superblock, Error> {
        let mut buf = vec![0; self.block_size as usize];
        self.get_block(0, &mut buf)?;
        Superblock::decode(&buf)
    }

    /// Write a fresh volume: free chain over blocks `[2, blocks)`, an empty
    /// root directory in block 1, and the superblock last, so an
    /// interrupted format fails detection. `rng` seeds the volume id.
    pub fn format<R: RngCore>(&mut self, label: &str, rng: &mut R) -> Result<(), Error> {
        let size = self.device.size();
        let (blocks, block_in_sectors) = self.geometry_for(self.block_size, size)?;
        if blocks <= ROOT_BLOCK {
            return Err(Error::InvalidArgument);
        }
        self.size = size;
        self.blocks = blocks;
        self.block_in_sectors = block_in_sectors;

        let freechain = self.format_free_blocks()?;
        self.init_meta(ROOT_BLOCK, MetaKind::Dir)?;

        let mut volume_id = rng.next_u64();
        while volume_id == 0 {
            volume_id = rng.next_u64();
        }

        let mut name = [0; superblock::NAME_LEN];
        let label = label.as_bytes();
        let len = label.len().min(superblock::NAME_LEN);
        name[..len].copy_from_slice(&label[..len]);

        let sb = Superblock {
            block_size: self.block_size as u16,
            flags: 0,
            group_index: 0,
            volume_id,
            size,
            name,
            root: ROOT_BLOCK,
            used: 2,
            journal1: 0,
            journal2: 0,
            freechain,
        };
        let sector = self.device.sector_size() as usize;
        let mut buf = vec![0; sector];
        sb.encode(&mut buf);
        self.device.write(&buf, 1, 0, 0).map_err(Into::into)?;
        debug!(
            "formatted volume {:#018x}: {} blocks of {}",
            volume_id, blocks, self.block_size
        );
        Ok(())
    }

    /// Chain blocks `[2, blocks)` together highest-first, so a fresh volume
    /// hands them out in ascending order. Returns the chain head (0 when
    /// the volume has no room for free blocks).
    fn format_free_blocks(&mut self) -> Result<u32, Error> {
        let mut buf = vec![0; self.block_size as usize];
        let mut next = 0;
        for index in (FIRST_FREE..self.blocks).rev() {
            sys::encode_free(&mut buf, next);
            self.put_block(index, &buf)?;
            next = index;
        }
        Ok(next)
    }

    /// Pop the head of the free chain. The returned block still carries its
    /// free-chain bytes; the caller overwrites it with a metadata or
    /// payload header.
    pub(crate) fn take_free_block(&mut self) -> Result<u32, Error> {
        let mut sb_buf = vec![0; self.block_size as usize];
        self.get_block(0, &mut sb_buf)?;
        let mut sb = Superblock::decode(&sb_buf)?;
        let head = sb.freechain;
        if head == 0 {
            return Err(Error::OutOfSpace);
        }

        let mut block = vec![0; self.block_size as usize];
        self.get_block(head, &mut block)?;
        if !sys::is_free(&block) {
            return Err(Error::BadBlockId(head, sys::get_u16(&block, 0)));
        }
        sb.freechain = sys::free_next(&block);
        sb.encode(&mut sb_buf);
        self.put_block(0, &sb_buf)?;
        trace!("took free block {}, head now {}", head, sb.freechain);
        Ok(head)
    }

    /// Re-initialize `index` as a free block and push it onto the chain
    /// head.
    pub(crate) fn add_free_block(&mut self, index: u32) -> Result<(), Error> {
        if index <= ROOT_BLOCK || index >= self.blocks {
            return Err(Error::InvalidArgument);
        }
        let mut sb_buf = vec![0; self.block_size as usize];
        self.get_block(0, &mut sb_buf)?;
        let mut sb = Superblock::decode(&sb_buf)?;

        let mut block = vec![0; self.block_size as usize];
        sys::encode_free(&mut block, sb.freechain);
        self.put_block(index, &block)?;

        sb.freechain = index;
        sb.encode(&mut sb_buf);
        self.put_block(0, &sb_buf)?;
        trace!("freed block {}", index);
        Ok(())
    }

    /// Walk the free chain and count its members. A chain longer than the
    /// volume means a cycle and is reported as corruption.
    pub fn free_block_count(&self) -> Result<u32, Error> {
        let sb = self.superblock()?;
        let mut buf = vec![0; self.block_size as usize];
        let mut head = sb.freechain;
        let mut count = 0;
        while head != 0 {
            if count >= self.blocks {
                return Err(Error::OutOfBounds(head as u64));
            }
            self.get_block(head, &mut buf)?;
            if !sys::is_free(&buf) {
                return Err(Error::BadBlockId(head, sys::get_u16(&buf, 0)));
            }
            count += 1;
            head = sys::free_next(&buf);
        }
        Ok(count)
    }

    /// Write a zeroed metadata block of the given kind.
    pub(crate) fn init_meta(&mut self, index: u32, kind: MetaKind) -> Result<(), Error> {
        let mut buf = vec![0; self.block_size as usize];
        MetaHeader::new(kind).encode(&mut buf);
        self.put_block(index, &buf)
    }

    /// Set the size and name of a FILE/DIR block.
    pub(crate) fn update_meta(&mut self, index: u32, name: &[u8], size: u64) -> Result<(), Error> {
        if name.len() > meta::max_name_len(self.block_size as usize) {
            return Err(Error::NameTooLong(name.len()));
        }
        let mut buf = vec![0; self.block_size as usize];
        self.get_block(index, &mut buf)?;
        let mut header = MetaHeader::decode(index, &buf)?;
        if header.kind.is_cont() {
            return Err(Error::BadBlockType(index, header.kind.raw()));
        }
        header.size = size;
        header.name_len = name.len() as u32;
        header.encode(&mut buf);
        buf[meta::NAME_OFFSET..meta::NAME_OFFSET + name.len()].copy_from_slice(name);
        self.put_block(index, &buf)
    }

    /// Append `child` to the first empty slot of the pointer table rooted
    /// at `index`, growing the table with a continuation block when every
    /// slot is taken. `expected` is checked against the stored kind by base
    /// type.
    pub(crate) fn add_to_meta(
        &mut self,
        index: u32,
        child: u32,
        expected: MetaKind,
    ) -> Result<(), Error> {
        let block_size = self.block_size as usize;
        let mut buf = vec![0; block_size];
        self.get_block(index, &mut buf)?;
        let header = MetaHeader::decode(index, &buf)?;
        if header.kind.base() != expected.base() {
            return Err(Error::BadBlockType(index, header.kind.raw()));
        }

        let mut at = meta::table_start(header.kind, header.name_len);
        while at < block_size - meta::PTR_LEN {
            if sys::get_u32(&buf, at) == 0 {
                sys::put_u32(&mut buf, at, child);
                return self.put_block(index, &buf);
            }
            at += meta::PTR_LEN;
        }

        let next = sys::get_u32(&buf, block_size - meta::PTR_LEN);
        if next != 0 {
            return self.add_to_meta(next, child, expected);
        }

        let next = self.take_free_block()?;
        debug!("block {} table full, continuing in {}", index, next);
        self.dir_continues(index, next)?;
        self.init_meta(next, header.kind.cont())?;
        self.add_to_meta(next, child, expected)
    }

    /// Install `next` as the continuation of block `index`.
    pub(crate) fn dir_continues(&mut self, index: u32, next: u32) -> Result<(), Error> {
        let block_size = self.block_size as usize;
        let mut buf = vec![0; block_size];
        self.get_block(index, &mut buf)?;
        sys::put_u32(&mut buf, block_size - meta::PTR_LEN, next);
        self.put_block(index, &buf)
    }

    /// Write a payload header into `index` and return the first usable
    /// content offset.
    pub(crate) fn init_data(
        &mut self,
        index: u32,
        kind: PayloadKind,
        algo: Algo,
    ) -> Result<usize, Error> {
        let mut buf = vec![0; self.block_size as usize];
        PayloadHeader { kind, algo }.encode(&mut buf);
        self.put_block(index, &buf)?;
        Ok(algo.data_offset())
    }

    /// Split `contents` over a chain of payload blocks whose indices land
    /// in `meta_block`'s pointer table, in read-back order. Every block is
    /// linked before its content is written, so an interrupted write leaks
    /// free blocks instead of dangling pointers. A zero-length file still
    /// owns one empty payload block.
    pub(crate) fn add_data(&mut self, meta_block: u32, contents: &[u8]) -> Result<(), Error> {
        let block_size = self.block_size as usize;
        let mut buf = vec![0; block_size];
        let mut rest = contents;
        loop {
            let block = self.take_free_block()?;
            self.add_to_meta(meta_block, block, MetaKind::File)?;
            let at = self.init_data(block, PayloadKind::Used, Algo::Disabled)?;
            self.get_block(block, &mut buf)?;
            let take = rest.len().min(block_size - at);
            buf[at..at + take].copy_from_slice(&rest[..take]);
            self.put_block(block, &buf)?;
            rest = &rest[take..];
            if rest.is_empty() {
                return Ok(());
            }
        }
    }

    /// Create a file under the directory block `parent`. The new metadata
    /// block is linked into the parent before it is initialized and filled.
    pub fn add_file(&mut self, parent: u32, name: &str, contents: &[u8]) -> Result<(), Error> {
        if parent == 0 {
            return Err(Error::InvalidArgument);
        }
        if name.len() > meta::max_name_len(self.block_size as usize) {
            return Err(Error::NameTooLong(name.len()));
        }
        let block = self.take_free_block()?;
        self.add_to_meta(parent, block, MetaKind::Dir)?;
        self.init_meta(block, MetaKind::File)?;
        self.update_meta(block, name.as_bytes(), contents.len() as u64)?;
        self.add_data(block, contents)
    }

    /// Create an empty directory under the directory block `parent`.
    pub fn add_dir(&mut self, parent: u32, name: &str) -> Result<(), Error> {
        if parent == 0 {
            return Err(Error::InvalidArgument);
        }
        if name.len() > meta::max_name_len(self.block_size as usize) {
            return Err(Error::NameTooLong(name.len()));
        }
        let block = self.take_free_block()?;
        self.add_to_meta(parent, block, MetaKind::Dir)?;
        self.init_meta(block, MetaKind::Dir)?;
        self.update_meta(block, name.as_bytes(), 0)
    }

    /// Push every payload block referenced from the FILE at `block` (and
    /// its continuation blocks) onto the free chain.
    pub(crate) fn free_payload(&mut self, block: u32) -> Result<(), Error> {
        let block_size = self.block_size as usize;
        let mut buf = vec![0; block_size];
        let mut cur = block;
        loop {
            self.get_block(cur, &mut buf)?;
            let header = MetaHeader::decode(cur, &buf)?;
            if !header.kind.is_file() {
                return Err(Error::BadBlockType(cur, header.kind.raw()));
            }
            let mut at = meta::table_start(header.kind, header.name_len);
            while at < block_size - meta::PTR_LEN {
                let ptr = sys::get_u32(&buf, at);
                if ptr != 0 {
                    self.add_free_block(ptr)?;
                }
                at += meta::PTR_LEN;
            }
            let next = sys::get_u32(&buf, block_size - meta::PTR_LEN);
            if next == 0 {
                return Ok(());
            }
            cur = next;
        }
    }

    /// Push `block` and its continuation chain onto the free chain,
    /// continuations first.
    pub(crate) fn free_meta_chain(&mut self, block: u32) -> Result<(), Error> {
        let block_size = self.block_size as usize;
        let mut buf = vec![0; block_size];
        let mut conts = Vec::new();
        let mut cur = block;
        loop {
            self.get_block(cur, &mut buf)?;
            MetaHeader::decode(cur, &buf)?;
            let next = sys::get_u32(&buf, block_size - meta::PTR_LEN);
            if next == 0 {
                break;
            }
            conts.push(next);
            cur = next;
        }
        for cont in conts {
            self.add_free_block(cont)?;
        }
        self.add_free_block(block)
    }

    /// Whether the directory at `block` has no children, continuation
    /// blocks included.
    pub(crate) fn dir_is_empty(&self, block: u32) -> Result<bool, Error> {
        let block_size = self.block_size as usize;
        let mut buf = vec![0; block_size];
        let mut cur = block;
        loop {
            self.get_block(cur, &mut buf)?;
            let header = MetaHeader::decode(cur, &buf)?;
            if !header.kind.is_dir() {
                return Err(Error::BadBlockType(cur, header.kind.raw()));
            }
            let mut at = meta::table_start(header.kind, header.name_len);
            while at < block_size - meta::PTR_LEN {
                if sys::get_u32(&buf, at) != 0 {
                    return Ok(false);
                }
                at += meta::PTR_LEN;
            }
            let next = sys::get_u32(&buf, block_size - meta::PTR_LEN);
            if next == 0 {
                return Ok(true);
            }
            cur = next;
        }
    }

    /// Zero one pointer-table slot of the metadata block at `block`.
    pub(crate) fn clear_slot(&mut self, block: u32, at: usize) -> Result<(), Error> {
        let block_size = self.block_size as usize;
        if at + meta::PTR_LEN > block_size - meta::PTR_LEN {
            return Err(Error::InvalidArgument);
        }
        let mut buf = vec![0; block_size];
        self.get_block(block, &mut buf)?;
        MetaHeader::decode(block, &buf)?;
        sys::put_u32(&mut buf, at, 0);
        self.put_block(block, &buf)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use rand_core::{impls, RngCore};

    use super::*;

    /// Deterministic SplitMix64 stream so formatted volumes are
    /// reproducible byte-for-byte.
    pub(crate) struct SplitMix64(pub u64);

    impl RngCore for SplitMix64 {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = self.0;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^ (z >> 31)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            impls::fill_bytes_via_next(self, dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    pub(crate) fn formatted(kib: usize) -> ClothesFs<Vec<u8>> {
        let mut fs = ClothesFs::new(vec![0_u8; kib * 1024]);
        fs.format("My impressive volume", &mut SplitMix64(42)).unwrap();
        fs
    }

    #[test]
    fn format_builds_free_chain() {
        let mut fs = formatted(40);
        assert!(fs.detect());
        assert_eq!(fs.total_blocks(), 80);
        // block 0 and the root are the only non-free blocks
        assert_eq!(fs.free_block_count().unwrap(), 78);

        let sb = fs.superblock().unwrap();
        assert_eq!(sb.root, ROOT_BLOCK);
        assert_eq!(sb.used, 2);
        assert_eq!(sb.freechain, 2);
        assert_eq!(sb.journal1, 0);
        assert_eq!(sb.journal2, 0);
        assert_ne!(sb.volume_id, 0);
        assert_eq!(sb.label(), b"My impressive volume");
        assert_eq!(sb.size, 40 * 1024);
    }

    #[test]
    fn root_is_an_empty_directory() {
        let fs = formatted(40);
        let mut buf = vec![0; 512];
        fs.get_block(ROOT_BLOCK, &mut buf).unwrap();
        let header = MetaHeader::decode(ROOT_BLOCK, &buf).unwrap();
        assert_eq!(header.kind, MetaKind::Dir);
        assert_eq!(header.size, 0);
        assert_eq!(header.name_len, 0);
        assert!(fs.dir_is_empty(ROOT_BLOCK).unwrap());
    }

    #[test]
    fn long_volume_labels_are_truncated() {
        let mut fs = ClothesFs::new(vec![0_u8; 8 * 1024]);
        let label = "x".repeat(64);
        fs.format(&label, &mut SplitMix64(0)).unwrap();
        assert_eq!(fs.superblock().unwrap().name, [b'x'; 32]);
    }

    #[test]
    fn allocation_is_ascending() {
        let mut fs = formatted(40);
        assert_eq!(fs.take_free_block().unwrap(), 2);
        assert_eq!(fs.take_free_block().unwrap(), 3);
        assert_eq!(fs.take_free_block().unwrap(), 4);
        assert_eq!(fs.free_block_count().unwrap(), 75);
    }

    #[test]
    fn free_chain_is_lifo() {
        let mut fs = formatted(40);
        let a = fs.take_free_block().unwrap();
        let _b = fs.take_free_block().unwrap();
        fs.add_free_block(a).unwrap();
        assert_eq!(fs.take_free_block().unwrap(), a);
    }

    #[test]
    fn exhaustion_reports_out_of_space() {
        // 2 KiB = 4 blocks: superblock, root, two free ones
        let mut fs = ClothesFs::new(vec![0_u8; 2048]);
        fs.format("tiny", &mut SplitMix64(7)).unwrap();
        assert_eq!(fs.take_free_block().unwrap(), 2);
        assert_eq!(fs.take_free_block().unwrap(), 3);
        assert_eq!(fs.take_free_block(), Err(Error::OutOfSpace));
    }

    #[test]
    fn detect_rejects_blank_and_foreign_volumes() {
        let mut fs = ClothesFs::new(vec![0_u8; 40 * 1024]);
        assert!(!fs.detect());

        // the magic spelling used by early volumes
        let mut image = vec![0_u8; 40 * 1024];
        image[superblock::HEADER_BEGIN..superblock::HEADER_BEGIN + 4]
            .copy_from_slice(&[0x00, 0x42, 0x00, 0x42]);
        let mut fs = ClothesFs::new(image);
        assert!(!fs.detect());
    }

    #[test]
    fn format_needs_room_for_the_root() {
        let mut fs = ClothesFs::new(vec![0_u8; 512]);
        assert_eq!(
            fs.format("small", &mut SplitMix64(1)),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn block_size_must_fit_the_sector_grid() {
        let mut fs = ClothesFs::with_block_size(vec![0_u8; 8 * 1024], 768);
        assert_eq!(
            fs.format("odd", &mut SplitMix64(1)),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn oversized_names_are_rejected_up_front() {
        let mut fs = formatted(40);
        let name = "n".repeat(meta::max_name_len(512) + 1);
        let free = fs.free_block_count().unwrap();
        assert_eq!(
            fs.add_file(ROOT_BLOCK, &name, b"x"),
            Err(Error::NameTooLong(489))
        );
        assert_eq!(fs.add_dir(ROOT_BLOCK, &name), Err(Error::NameTooLong(489)));
        // nothing was allocated
        assert_eq!(fs.free_block_count().unwrap(), free);
    }

    #[test]
    fn add_to_meta_checks_the_base_type() {
        let mut fs = formatted(40);
        fs.add_file(ROOT_BLOCK, "f", b"content").unwrap();
        // block 2 is a FILE; linking a child with DIR expectations must fail
        assert_eq!(
            fs.add_to_meta(2, 9, MetaKind::Dir),
            Err(Error::BadBlockType(2, MetaKind::File.raw()))
        );
    }

    #[test]
    fn add_file_rejects_the_superblock_as_parent() {
        let mut fs = formatted(40);
        assert_eq!(
            fs.add_file(0, "f", b"content"),
            Err(Error::InvalidArgument)
        );
    }
}
