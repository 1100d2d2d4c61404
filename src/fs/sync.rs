//! The shared-volume facade and the directory cursor. `Synced` serializes
//! every operation behind one mutex; `DirIter` is a value-like cursor that
//! owns snapshots of the blocks it is positioned in, so it stays coherent
//! while other handles mutate the volume.

use core::fmt::{self, Debug};

use alloc::sync::Arc;
use alloc::vec::Vec;

use rand_core::RngCore;
use spin::{Mutex, MutexGuard};

use crate::device::BlockDevice;
use crate::error::Error;
use crate::sys::{self, meta};
use crate::sys::meta::{Attrib, MetaHeader, MetaKind};
use crate::sys::payload::{PayloadHeader, PayloadKind};
use crate::sys::superblock::Superblock;

use super::ClothesFs;

/// Sentinel for "no payload block loaded".
const NO_PAYLOAD: u32 = u32::MAX;

pub struct Synced<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Synced<T> {
    pub fn with_inner(inner: T) -> Synced<T> {
        Synced {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn inner(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }
}

impl<T> Clone for Synced<T> {
    fn clone(&self) -> Self {
        Synced {
            inner: self.inner.clone(),
        }
    }
}

impl<D: BlockDevice> Synced<ClothesFs<D>> {
    /// Wrap an unprobed device; `format` or `detect` come next.
    pub fn new(device: D) -> Synced<ClothesFs<D>> {
        Synced::with_inner(ClothesFs::new(device))
    }

    /// Mount an existing volume. Unlike `detect`, failures surface as
    /// errors, carrying the magic that was found.
    pub fn open(device: D) -> Result<Synced<ClothesFs<D>>, Error> {
        let mut fs = ClothesFs::new(device);
        fs.probe()?;
        Ok(Synced::with_inner(fs))
    }

    pub fn detect(&self) -> bool {
        self.inner().detect()
    }

    /// Format with a caller-supplied random source for the volume id.
    pub fn format_with<R: RngCore>(&self, label: &str, rng: &mut R) -> Result<(), Error> {
        self.inner().format(label, rng)
    }

    /// Format with the operating system's random source.
    #[cfg(feature = "std")]
    pub fn format(&self, label: &str) -> Result<(), Error> {
        self.inner().format(label, &mut rand_core::OsRng)
    }

    pub fn add_file(&self, parent: u32, name: &str, contents: &[u8]) -> Result<(), Error> {
        self.inner().add_file(parent, name, contents)
    }

    pub fn add_dir(&self, parent: u32, name: &str) -> Result<(), Error> {
        self.inner().add_dir(parent, name)
    }

    /// Open a cursor over the children of the directory block `parent`,
    /// positioned on the first entry; `ok()` reports whether one exists.
    pub fn list(&self, parent: u32) -> Result<DirIter<D>, Error> {
        let mut iter = DirIter::open(self.clone(), parent)?;
        iter.next()?;
        Ok(iter)
    }

    /// Owned-entry iteration over a directory.
    pub fn read_dir(&self, parent: u32) -> Result<ReadDir<D>, Error> {
        Ok(ReadDir {
            iter: self.list(parent)?,
            started: false,
        })
    }

    /// Find a child of `parent` by exact name. Returns a cursor positioned
    /// on the match, usable for `read` and `remove`.
    pub fn lookup(&self, parent: u32, name: &str) -> Result<Option<DirIter<D>>, Error> {
        let mut iter = self.list(parent)?;
        while iter.ok() {
            if iter.name() == name.as_bytes() {
                return Ok(Some(iter));
            }
            iter.next()?;
        }
        Ok(None)
    }

    pub fn block_size(&self) -> u32 {
        self.inner().block_size()
    }

    pub fn total_blocks(&self) -> u32 {
        self.inner().total_blocks()
    }

    pub fn volume_size(&self) -> u64 {
        self.inner().volume_size()
    }

    pub fn superblock(&self) -> Result<Superblock, Error> {
        self.inner().superblock()
    }

    pub fn free_block_count(&self) -> Result<u32, Error> {
        self.inner().free_block_count()
    }
}

impl<D: BlockDevice> Debug for Synced<ClothesFs<D>> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Synced<ClothesFs>")
    }
}

/// One directory entry, detached from the cursor that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: Vec<u8>,
    pub kind: MetaKind,
    pub attrib: Attrib,
    pub size: u64,
    pub block: u32,
}

/// A cursor over a directory's children.
///
/// The cursor owns snapshots of the directory block it is scanning, the
/// current entry's metadata block, and the payload block a `read` is
/// positioned in. Copies are deep: a cloned cursor is independent of the
/// original and of later volume mutation.
pub struct DirIter<D: BlockDevice> {
    fs: Synced<ClothesFs<D>>,
    ok: bool,
    /// Block whose pointer table is being scanned (DIR or DIR_CONT).
    scan_block: u32,
    /// Offset of the next slot to examine inside `scan`.
    slot: usize,
    /// Slot that produced the current entry.
    entry_slot: usize,
    /// Current entry's metadata block index; doubles as its inode number.
    entry_block: u32,
    entry_header: Option<MetaHeader>,
    /// Read position within the current file entry.
    pos: u64,
    /// Ordinal of the payload block loaded in `content`.
    payload_ord: u32,
    payload_block: u32,
    /// Bytes of the loaded payload's data region already handed out.
    consumed: usize,
    scan: Vec<u8>,
    entry: Vec<u8>,
    content: Vec<u8>,
}

impl<D: BlockDevice> DirIter<D> {
    fn open(fs: Synced<ClothesFs<D>>, parent: u32) -> Result<DirIter<D>, Error> {
        if parent == 0 {
            return Err(Error::InvalidArgument);
        }
        let (scan, slot) = {
            let inner = fs.inner();
            let mut buf = vec![0; inner.block_size() as usize];
            inner.get_block(parent, &mut buf)?;
            let header = MetaHeader::decode(parent, &buf)?;
            if !header.kind.is_dir() {
                return Err(Error::BadBlockType(parent, header.kind.raw()));
            }
            let slot = meta::table_start(header.kind, header.name_len);
            (buf, slot)
        };
        Ok(DirIter {
            fs,
            ok: false,
            scan_block: parent,
            slot,
            entry_slot: slot,
            entry_block: 0,
            entry_header: None,
            pos: 0,
            payload_ord: NO_PAYLOAD,
            payload_block: 0,
            consumed: 0,
            scan,
            entry: Vec::new(),
            content: Vec::new(),
        })
    }

    /// Advance to the next entry, skipping slots zeroed by `remove` and
    /// crossing into continuation blocks. `Ok(false)` is the end of the
    /// directory; corruption aborts with an error.
    pub fn next(&mut self) -> Result<bool, Error> {
        self.ok = false;
        self.entry_header = None;
        let fs = self.fs.clone();
        let inner = fs.inner();
        let block_size = inner.block_size() as usize;
        loop {
            if self.slot >= block_size - meta::PTR_LEN {
                let next = sys::get_u32(&self.scan, block_size - meta::PTR_LEN);
                if next == 0 {
                    return Ok(false);
                }
                let mut buf = vec![0; block_size];
                inner.get_block(next, &mut buf)?;
                let header = MetaHeader::decode(next, &buf)?;
                if header.kind != MetaKind::DirCont {
                    warn!("block {} is not a directory continuation", next);
                    return Err(Error::BadBlockType(next, header.kind.raw()));
                }
                self.scan = buf;
                self.scan_block = next;
                self.slot = meta::CONT_TABLE_START;
                continue;
            }

            let at = self.slot;
            self.slot += meta::PTR_LEN;
            let child = sys::get_u32(&self.scan, at);
            if child == 0 {
                continue;
            }

            let mut buf = vec![0; block_size];
            inner.get_block(child, &mut buf)?;
            let header = MetaHeader::decode(child, &buf)?;
            if header.kind.is_cont() {
                warn!("directory slot points at continuation block {}", child);
                return Err(Error::BadBlockType(child, header.kind.raw()));
            }
            self.entry = buf;
            self.entry_block = child;
            self.entry_slot = at;
            self.entry_header = Some(header);
            self.pos = 0;
            self.payload_ord = NO_PAYLOAD;
            self.payload_block = 0;
            self.consumed = 0;
            self.ok = true;
            return Ok(true);
        }
    }

    /// Whether the cursor is on an entry.
    pub fn ok(&self) -> bool {
        self.ok
    }

    /// Name bytes of the current entry; empty past the end.
    pub fn name(&self) -> &[u8] {
        if self.ok {
            meta::name_of(&self.entry)
        } else {
            &[]
        }
    }

    pub fn size(&self) -> u64 {
        self.entry_header.map(|h| h.size).unwrap_or(0)
    }

    pub fn kind(&self) -> Option<MetaKind> {
        self.entry_header.map(|h| h.kind)
    }

    pub fn attrib(&self) -> Attrib {
        self.entry_header
            .map(|h| h.attrib)
            .unwrap_or_else(Attrib::empty)
    }

    /// Metadata block index of the current entry (its inode identity); 0
    /// past the end.
    pub fn block(&self) -> u32 {
        if self.ok {
            self.entry_block
        } else {
            0
        }
    }

    /// The current entry in owned form.
    pub fn entry(&self) -> Option<DirEntry> {
        if !self.ok {
            return None;
        }
        let header = self.entry_header?;
        Some(DirEntry {
            name: meta::name_of(&self.entry).to_vec(),
            kind: header.kind,
            attrib: header.attrib,
            size: header.size,
            block: self.entry_block,
        })
    }

    /// Stream file content from the cursor's current position, crossing
    /// payload-block boundaries. Returns the bytes copied into `buf`, 0 at
    /// end of file. Never reads past the entry's size field.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let header = match self.entry_header {
            Some(header) if self.ok => header,
            _ => return Err(Error::InvalidArgument),
        };
        if header.kind != MetaKind::File {
            return Err(Error::InvalidArgument);
        }
        let fs = self.fs.clone();
        let inner = fs.inner();
        let size = header.size;
        let mut copied = 0;
        while copied < buf.len() && self.pos < size {
            if self.payload_ord == NO_PAYLOAD {
                self.load_payload(&inner, 0)?;
            }
            let payload = PayloadHeader::decode(self.payload_block, &self.content)?;
            let data_off = payload.algo.data_offset();
            let avail = self.content.len() - data_off - self.consumed;
            if avail == 0 {
                let next = self.payload_ord + 1;
                self.load_payload(&inner, next)?;
                continue;
            }
            let want = (buf.len() - copied)
                .min((size - self.pos) as usize)
                .min(avail);
            let at = data_off + self.consumed;
            buf[copied..copied + want].copy_from_slice(&self.content[at..at + want]);
            copied += want;
            self.consumed += want;
            self.pos += want as u64;
        }
        Ok(copied)
    }

    /// Remove the current entry: payload and metadata blocks go back onto
    /// the free chain and the parent slot that referenced the entry is
    /// zeroed. Directories must be empty. The cursor keeps its snapshots;
    /// `next` continues with the following entry.
    pub fn remove(&mut self) -> Result<(), Error> {
        let header = match self.entry_header {
            Some(header) if self.ok => header,
            _ => return Err(Error::InvalidArgument),
        };
        let fs = self.fs.clone();
        let mut inner = fs.inner();
        match header.kind {
            MetaKind::File => inner.free_payload(self.entry_block)?,
            MetaKind::Dir => {
                if !inner.dir_is_empty(self.entry_block)? {
                    return Err(Error::NotEmpty(self.entry_block));
                }
            }
            other => return Err(Error::BadBlockType(self.entry_block, other.raw())),
        }
        inner.free_meta_chain(self.entry_block)?;
        inner.clear_slot(self.scan_block, self.entry_slot)?;
        sys::put_u32(&mut self.scan, self.entry_slot, 0);
        Ok(())
    }

    fn load_payload(&mut self, inner: &ClothesFs<D>, ordinal: u32) -> Result<(), Error> {
        let block = self
            .payload_block_at(inner, ordinal)?
            .ok_or(Error::OutOfBounds(self.pos))?;
        let mut buf = vec![0; inner.block_size() as usize];
        inner.get_block(block, &mut buf)?;
        let header = PayloadHeader::decode(block, &buf)?;
        if header.kind != PayloadKind::Used {
            return Err(Error::BadBlockType(block, header.kind as u8));
        }
        self.content = buf;
        self.payload_block = block;
        self.payload_ord = ordinal;
        self.consumed = 0;
        Ok(())
    }

    /// The `ordinal`-th non-zero slot of the entry's pointer table,
    /// following FILE continuation blocks.
    fn payload_block_at(
        &self,
        inner: &ClothesFs<D>,
        ordinal: u32,
    ) -> Result<Option<u32>, Error> {
        let block_size = inner.block_size() as usize;
        let header = match self.entry_header {
            Some(header) => header,
            None => return Err(Error::InvalidArgument),
        };
        let mut buf = self.entry.clone();
        let mut at = meta::table_start(header.kind, header.name_len);
        let mut seen = 0;
        loop {
            while at < block_size - meta::PTR_LEN {
                let ptr = sys::get_u32(&buf, at);
                at += meta::PTR_LEN;
                if ptr == 0 {
                    continue;
                }
                if seen == ordinal {
                    return Ok(Some(ptr));
                }
                seen += 1;
            }
            let next = sys::get_u32(&buf, block_size - meta::PTR_LEN);
            if next == 0 {
                return Ok(None);
            }
            inner.get_block(next, &mut buf)?;
            let header = MetaHeader::decode(next, &buf)?;
            if header.kind != MetaKind::FileCont {
                return Err(Error::BadBlockType(next, header.kind.raw()));
            }
            at = meta::CONT_TABLE_START;
        }
    }
}

impl<D: BlockDevice> Clone for DirIter<D> {
    fn clone(&self) -> Self {
        DirIter {
            fs: self.fs.clone(),
            ok: self.ok,
            scan_block: self.scan_block,
            slot: self.slot,
            entry_slot: self.entry_slot,
            entry_block: self.entry_block,
            entry_header: self.entry_header,
            pos: self.pos,
            payload_ord: self.payload_ord,
            payload_block: self.payload_block,
            consumed: self.consumed,
            scan: self.scan.clone(),
            entry: self.entry.clone(),
            content: self.content.clone(),
        }
    }
}

impl<D: BlockDevice> Debug for DirIter<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DirIter")
            .field("ok", &self.ok)
            .field("scan_block", &self.scan_block)
            .field("slot", &self.slot)
            .field("entry_block", &self.entry_block)
            .finish()
    }
}

/// Owned-entry adaptor over [`DirIter`].
pub struct ReadDir<D: BlockDevice> {
    iter: DirIter<D>,
    started: bool,
}

impl<D: BlockDevice> Iterator for ReadDir<D> {
    type Item = Result<DirEntry, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.started {
            match self.iter.next() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(err) => return Some(Err(err)),
            }
        } else {
            self.started = true;
            if !self.iter.ok() {
                return None;
            }
        }
        self.iter.entry().map(Ok)
    }
}
