/// Blank image synthesis
///
/// An empty ADF is a formatted OFS volume: the boot block carries the `DOS`
/// signature, block 880 is the root block and block 881 the allocation
/// bitmap with every block free except those two. Only the fields needed for
/// a valid empty volume are written; everything else is zero.
///
/// A blank raw image has no structure, just MFM filler.

use crate::error::Result;
use crate::image::geometry::{Geometry, SECTOR_SIZE, SECTORS_PER_TRACK, TRACKS_PER_DISK};
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Filler byte of an unformatted raw MFM track
pub const RAW_FILLER: u8 = 0xAA;

/// Longest volume name AmigaDOS accepts
pub const MAX_NAME_LEN: usize = 30;

const BLOCK_COUNT: usize = SECTORS_PER_TRACK * TRACKS_PER_DISK;
const ROOT_BLOCK: u32 = 880;
const BITMAP_BLOCK: u32 = 881;
const RESERVED_BLOCKS: u32 = 2;

const BOOT_SIGNATURE: &[u8; 4] = b"DOS\0";

const T_HEADER: u32 = 2;
const ST_ROOT: u32 = 1;
const HASH_TABLE_SIZE: u32 = 72;
const BM_VALID: u32 = 0xFFFF_FFFF;

// Root block field offsets
const RB_TYPE: usize = 0x000;
const RB_HT_SIZE: usize = 0x00C;
const RB_CHECKSUM: usize = 0x014;
const RB_BM_FLAG: usize = 0x138;
const RB_BM_PAGES: usize = 0x13C;
const RB_ROOT_DATE: usize = 0x1A4;
const RB_NAME_LEN: usize = 0x1B0;
const RB_NAME: usize = 0x1B1;
const RB_DISK_DATE: usize = 0x1D8;
const RB_CREATE_DATE: usize = 0x1E4;
const RB_SEC_TYPE: usize = 0x1FC;

// Bitmap block layout
const BM_CHECKSUM: usize = 0x000;
const BM_MAP: usize = 0x004;

/// AmigaDOS timestamp: days since 1978-01-01, minutes past midnight, ticks (1/50 s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateStamp {
    /// Days since 1 January 1978
    pub days: u32,
    /// Minutes past midnight
    pub minutes: u32,
    /// Ticks past the minute
    pub ticks: u32,
}

/// Date stamped on synthesized volumes (2013-02-04 22:08:55)
pub const FORMAT_DATE: DateStamp = DateStamp {
    days: 0x3212,
    minutes: 0x0530,
    ticks: 0x0ABE,
};

/// Fields of an empty root block
#[derive(Debug, Clone)]
pub struct RootBlock {
    /// Volume name, at most 30 bytes are stored
    pub name: String,
    /// Root, disk and creation date
    pub date: DateStamp,
    /// Block holding the allocation bitmap
    pub bitmap_block: u32,
}

impl RootBlock {
    /// Root block for an empty volume
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            date: FORMAT_DATE,
            bitmap_block: BITMAP_BLOCK,
        }
    }

    /// Serialize with a valid checksum
    pub fn to_bytes(&self) -> [u8; SECTOR_SIZE] {
        let mut block = [0u8; SECTOR_SIZE];
        put_u32(&mut block, RB_TYPE, T_HEADER);
        put_u32(&mut block, RB_HT_SIZE, HASH_TABLE_SIZE);
        put_u32(&mut block, RB_BM_FLAG, BM_VALID);
        put_u32(&mut block, RB_BM_PAGES, self.bitmap_block);
        for offset in [RB_ROOT_DATE, RB_DISK_DATE, RB_CREATE_DATE] {
            put_date(&mut block, offset, self.date);
        }

        let name = self.name.as_bytes();
        let len = name.len().min(MAX_NAME_LEN);
        block[RB_NAME_LEN] = len as u8;
        block[RB_NAME..RB_NAME + len].copy_from_slice(&name[..len]);

        put_u32(&mut block, RB_SEC_TYPE, ST_ROOT);
        let checksum = block_checksum(&block, RB_CHECKSUM);
        put_u32(&mut block, RB_CHECKSUM, checksum);
        block
    }
}

/// Allocation bitmap with everything free except the given blocks
fn bitmap_block(used: &[u32]) -> [u8; SECTOR_SIZE] {
    let bits = BLOCK_COUNT - RESERVED_BLOCKS as usize;
    let mut words = vec![u32::MAX; bits.div_ceil(32)];
    for &block in used {
        let bit = (block - RESERVED_BLOCKS) as usize;
        words[bit / 32] &= !(1 << (bit % 32));
    }

    let mut block = [0u8; SECTOR_SIZE];
    for (i, word) in words.iter().enumerate() {
        put_u32(&mut block, BM_MAP + i * 4, *word);
    }
    let checksum = block_checksum(&block, BM_CHECKSUM);
    put_u32(&mut block, BM_CHECKSUM, checksum);
    block
}

fn put_u32(block: &mut [u8], offset: usize, value: u32) {
    block[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

fn put_date(block: &mut [u8], offset: usize, date: DateStamp) {
    put_u32(block, offset, date.days);
    put_u32(block, offset + 4, date.minutes);
    put_u32(block, offset + 8, date.ticks);
}

fn words(block: &[u8]) -> impl Iterator<Item = u32> + '_ {
    block
        .chunks_exact(4)
        .map(|w| u32::from_be_bytes([w[0], w[1], w[2], w[3]]))
}

/// AmigaDOS block checksum
///
/// Negated 32-bit sum of all big-endian longwords of the block, with the
/// checksum field at `checksum_offset` taken as zero.
pub fn block_checksum(block: &[u8], checksum_offset: usize) -> u32 {
    let skip = checksum_offset / 4;
    let sum = words(block)
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .fold(0u32, |acc, (_, w)| acc.wrapping_add(w));
    sum.wrapping_neg()
}

/// Does the block, checksum included, sum to zero?
pub fn block_checksum_valid(block: &[u8]) -> bool {
    words(block).fold(0u32, |acc, w| acc.wrapping_add(w)) == 0
}

/// Volume name for an image file name: everything before the first `.`
pub fn volume_name(file_name: &str) -> &str {
    match file_name.find('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    }
}

/// Build an empty, formatted ADF image
pub fn empty_adf(name: &str) -> Vec<u8> {
    let mut image = vec![0u8; Geometry::Adf.image_len() as usize];
    image[..BOOT_SIGNATURE.len()].copy_from_slice(BOOT_SIGNATURE);

    let root = ROOT_BLOCK as usize * SECTOR_SIZE;
    image[root..root + SECTOR_SIZE].copy_from_slice(&RootBlock::new(name).to_bytes());

    let bitmap = BITMAP_BLOCK as usize * SECTOR_SIZE;
    image[bitmap..bitmap + SECTOR_SIZE]
        .copy_from_slice(&bitmap_block(&[ROOT_BLOCK, BITMAP_BLOCK]));
    image
}

/// Build a blank raw MFM image
pub fn empty_raw() -> Vec<u8> {
    vec![RAW_FILLER; Geometry::Raw.image_len() as usize]
}

/// Write an empty image of the given geometry
///
/// An ADF volume is named after the file, without its extension. An existing
/// file is overwritten.
pub fn create_empty_image<P: AsRef<Path>>(path: P, geometry: Geometry) -> Result<()> {
    let path = path.as_ref();
    let data = match geometry {
        Geometry::Adf => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            empty_adf(volume_name(&file_name))
        }
        Geometry::Raw => empty_raw(),
    };

    debug!("writing {}", path.display());
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&data)?;
    out.flush()?;
    Ok(())
}
