//! Block-level flash access
//!
//! NOR flash can only clear bits, and only a whole erase block can be set
//! back to ones. Every write therefore reads the enclosing block, patches
//! it in RAM, erases the block and programs it back, no matter how few
//! bytes changed.
//!
//! Ranges that cross block boundaries are cut into block-local [`Span`]s
//! and handled one block at a time in ascending order. Each block is
//! rewritten independently; a power loss between two blocks leaves the
//! earlier ones updated and the later ones untouched.

use embassy_futures::yield_now;
use embedded_storage_async::nor_flash::NorFlash;

use ena_hal::{FlashError, Partition, BLOCK_SIZE};

const BLOCK: u32 = BLOCK_SIZE as u32;

/// Start address of the block containing `address`
const fn block_start(address: u32) -> u32 {
    address - address % BLOCK
}

/// Block-local piece of a longer byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    /// Partition address of the first byte
    address: u32,
    /// Offset of the first byte within the whole range
    offset: usize,
    /// Number of bytes, never past the end of the block
    len: usize,
}

/// Cuts `[address, end)` at every block boundary
///
/// Each step advances `address` to the next boundary or to `end`, so the
/// remaining range strictly shrinks.
struct Spans {
    address: u32,
    end: u32,
    offset: usize,
}

impl Spans {
    fn new(address: u32, end: u32) -> Self {
        Self {
            address,
            end,
            offset: 0,
        }
    }
}

impl Iterator for Spans {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        if self.address >= self.end {
            return None;
        }
        let stop = block_start(self.address)
            .saturating_add(BLOCK)
            .min(self.end);
        let span = Span {
            address: self.address,
            offset: self.offset,
            len: (stop - self.address) as usize,
        };
        self.address = stop;
        self.offset += span.len;
        Some(span)
    }
}

/// What to put into a span
#[derive(Clone, Copy)]
enum Fill<'a> {
    Bytes(&'a [u8]),
    Zeros(usize),
}

/// Read-modify-erase-write access to a partition
pub struct BlockStore<F> {
    partition: Partition<F>,
}

impl<F: NorFlash> BlockStore<F> {
    pub fn new(partition: Partition<F>) -> Self {
        Self { partition }
    }

    /// Partition size in bytes
    pub fn size(&self) -> u32 {
        self.partition.size()
    }

    pub fn into_partition(self) -> Partition<F> {
        self.partition
    }

    /// Read `buffer.len()` bytes at `address`
    pub async fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), FlashError> {
        self.partition.read(address, buffer).await?;
        yield_now().await;
        trace!("read {} bytes at {}", buffer.len(), address);
        Ok(())
    }

    /// Write `data` at `address`, rewriting every block the range touches
    pub async fn write(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        let end = self.range_end(address, data.len())?;
        for span in Spans::new(address, end) {
            if span.len < data.len() {
                debug!(
                    "split write at {}: {} of {} bytes in block {}",
                    span.address,
                    span.len,
                    data.len(),
                    span.address / BLOCK
                );
            }
            let bytes = &data[span.offset..span.offset + span.len];
            self.patch_block(span.address, Fill::Bytes(bytes)).await?;
        }
        Ok(())
    }

    /// Overwrite `len` bytes at `address` with zeros
    pub async fn zero(&mut self, address: u32, len: usize) -> Result<(), FlashError> {
        let end = self.range_end(address, len)?;
        for span in Spans::new(address, end) {
            self.patch_block(span.address, Fill::Zeros(span.len)).await?;
        }
        Ok(())
    }

    /// Remove `size` bytes at `address` and close the gap
    ///
    /// Every byte in `[address + size, end)` moves down by `size`. The
    /// `size` bytes just below `end` that the move vacates are zeroed.
    /// Bytes at or beyond `end` are never touched, so `end` must be the
    /// end of the live data rather than the end of the region.
    ///
    /// Blocks are processed in ascending order. Each block is rewritten
    /// only after the bytes it pulls from the following blocks have been
    /// read, and a block never pulls from one that was already rewritten.
    pub async fn shift_delete(&mut self, address: u32, end: u32, size: u32) -> Result<(), FlashError> {
        if size == 0 {
            return Ok(());
        }
        let hole_end = address.checked_add(size).ok_or(FlashError::OutOfBounds)?;
        if hole_end > end || end > self.size() {
            return Err(FlashError::OutOfBounds);
        }
        if block_start(address) != block_start(hole_end - 1) {
            debug!(
                "shift delete hole {}..{} crosses block boundary {}",
                address,
                hole_end,
                block_start(hole_end - 1)
            );
        }

        let mut buffer = [0u8; BLOCK_SIZE];
        let mut block = block_start(address);
        while block < end {
            let block_end = block + BLOCK;
            self.partition.read(block, &mut buffer).await?;
            yield_now().await;

            // Rewritten part of this block
            let lo = address.max(block);
            let hi = end.min(block_end);
            let dst = (lo - block) as usize;

            // Bytes moving into [lo, hi) come from [lo + size, lo + size + pulled)
            let source = lo + size;
            let pulled = hi.saturating_add(size).min(end).saturating_sub(source);
            let local = pulled.min(block_end.saturating_sub(source));

            if local > 0 {
                let from = (source - block) as usize;
                buffer.copy_within(from..from + local as usize, dst);
            }
            if pulled > local {
                let at = dst + local as usize;
                let tail = &mut buffer[at..at + (pulled - local) as usize];
                self.partition.read(source + local, tail).await?;
                yield_now().await;
            }
            buffer[dst + pulled as usize..(hi - block) as usize].fill(0);

            debug!(
                "shift block {}: {} bytes moved, {} zeroed",
                block / BLOCK,
                pulled,
                hi - lo - pulled
            );
            self.rewrite_block(block, &buffer).await?;
            block = block_end;
        }
        Ok(())
    }

    /// Erase the whole partition
    pub async fn erase_all(&mut self) -> Result<(), FlashError> {
        self.partition.erase_all().await
    }

    /// Read a little-endian `u32`
    pub async fn read_u32(&mut self, address: u32) -> Result<u32, FlashError> {
        let mut raw = [0u8; 4];
        self.read(address, &mut raw).await?;
        Ok(u32::from_le_bytes(raw))
    }

    /// Write a little-endian `u32`
    pub async fn write_u32(&mut self, address: u32, value: u32) -> Result<(), FlashError> {
        self.write(address, &value.to_le_bytes()).await
    }

    /// Patch one block-local span
    async fn patch_block(&mut self, address: u32, fill: Fill<'_>) -> Result<(), FlashError> {
        let start = block_start(address);
        let at = (address - start) as usize;

        let mut buffer = [0u8; BLOCK_SIZE];
        self.partition.read(start, &mut buffer).await?;
        yield_now().await;

        match fill {
            Fill::Bytes(bytes) => buffer[at..at + bytes.len()].copy_from_slice(bytes),
            Fill::Zeros(len) => buffer[at..at + len].fill(0),
        }

        self.rewrite_block(start, &buffer).await
    }

    async fn rewrite_block(&mut self, start: u32, buffer: &[u8; BLOCK_SIZE]) -> Result<(), FlashError> {
        self.partition.erase(start, start + BLOCK).await?;
        self.partition.write(start, buffer).await?;
        trace!("rewrote block {}", start / BLOCK);
        Ok(())
    }

    /// End of `[address, address + len)`, checked before any block is touched
    fn range_end(&self, address: u32, len: usize) -> Result<u32, FlashError> {
        u32::try_from(len)
            .ok()
            .and_then(|len| address.checked_add(len))
            .filter(|&end| end <= self.size())
            .ok_or(FlashError::OutOfBounds)
    }
}
