//! Just enough of the bag-of-cells format to read a wallet public key out
//! of a `StateInit`.
//!
//! A `StateInit` root cell starts with the bits
//! `split_depth:(Maybe (## 5)) special:(Maybe TickTock) code:(Maybe ^Cell)
//! data:(Maybe ^Cell)`. The wallet data cell holds a 32-bit word followed by
//! the 256-bit Ed25519 public key.
//!
//! Only ordinary level-0 cells are accepted. Any other shape, and any
//! structural damage, makes the public functions return `None`.

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

const BOC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];

const HAS_INDEX: u8 = 0x80;
const HAS_CRC32C: u8 = 0x40;

/// Bit offset of the public key inside the wallet data cell
const PUBLIC_KEY_OFFSET_BITS: usize = 32;

#[derive(Debug, Error)]
enum CellError {
    #[error("unexpected end of input")]
    Truncated,
    #[error("bad magic")]
    BadMagic,
    #[error("unsupported {0}")]
    Unsupported(&'static str),
    #[error("invalid {0}")]
    Invalid(&'static str),
    #[error("state init has no data cell")]
    MissingData,
}

type CellResult<T> = std::result::Result<T, CellError>;

#[derive(Debug)]
struct Cell<'a> {
    d2: u8,
    data: &'a [u8],
    bit_len: usize,
    refs: Vec<usize>,
}

impl Cell<'_> {
    fn bit(&self, pos: usize) -> CellResult<bool> {
        if pos >= self.bit_len {
            return Err(CellError::Truncated);
        }
        Ok(self.data[pos / 8] & (0x80 >> (pos % 8)) != 0)
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> CellResult<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(CellError::Truncated)?;
        let bytes = self.buf.get(self.pos..end).ok_or(CellError::Truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> CellResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn uint(&mut self, width: usize) -> CellResult<usize> {
        let value = self
            .take(width)?
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | *b as u64);
        usize::try_from(value).map_err(|_| CellError::Invalid("integer width"))
    }

    fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }
}

struct BagOfCells<'a> {
    cells: Vec<Cell<'a>>,
    root: usize,
}

impl<'a> BagOfCells<'a> {
    fn parse(blob: &'a [u8]) -> CellResult<Self> {
        let mut reader = Reader::new(blob);
        if reader.take(4)? != BOC_MAGIC {
            return Err(CellError::BadMagic);
        }

        let flags = reader.u8()?;
        let ref_size = (flags & 0x07) as usize;
        if !(1..=4).contains(&ref_size) {
            return Err(CellError::Invalid("reference size"));
        }
        let offset_size = reader.u8()? as usize;
        if !(1..=8).contains(&offset_size) {
            return Err(CellError::Invalid("offset size"));
        }

        let cell_count = reader.uint(ref_size)?;
        let root_count = reader.uint(ref_size)?;
        let _absent = reader.uint(ref_size)?;
        let cells_size = reader.uint(offset_size)?;

        // every serialized cell is at least two descriptor bytes
        if cell_count == 0 || cell_count > blob.len() / 2 {
            return Err(CellError::Invalid("cell count"));
        }
        if root_count == 0 {
            return Err(CellError::Invalid("root count"));
        }

        let root = reader.uint(ref_size)?;
        reader.take((root_count - 1).checked_mul(ref_size).ok_or(CellError::Truncated)?)?;
        if root >= cell_count {
            return Err(CellError::Invalid("root index"));
        }

        if flags & HAS_INDEX != 0 {
            reader.take(cell_count.checked_mul(offset_size).ok_or(CellError::Truncated)?)?;
        }

        let mut cell_reader = Reader::new(reader.take(cells_size)?);
        if flags & HAS_CRC32C != 0 {
            reader.take(4)?;
        }
        if !reader.is_empty() {
            return Err(CellError::Invalid("trailing bytes"));
        }

        let mut cells = Vec::with_capacity(cell_count);
        for index in 0..cell_count {
            cells.push(parse_cell(&mut cell_reader, index, cell_count, ref_size)?);
        }
        if !cell_reader.is_empty() {
            return Err(CellError::Invalid("cell data size"));
        }

        Ok(Self { cells, root })
    }

    fn root(&self) -> &Cell<'a> {
        &self.cells[self.root]
    }

    fn data_cell(&self) -> CellResult<&Cell<'a>> {
        let root = self.root();
        let mut pos = 0;

        // split_depth
        pos += if root.bit(pos)? { 1 + 5 } else { 1 };
        // special (tick, tock)
        pos += if root.bit(pos)? { 1 + 2 } else { 1 };

        let has_code = root.bit(pos)?;
        let has_data = root.bit(pos + 1)?;
        if !has_data {
            return Err(CellError::MissingData);
        }

        let data_ref = if has_code { 1 } else { 0 };
        let index = *root.refs.get(data_ref).ok_or(CellError::MissingData)?;
        Ok(&self.cells[index])
    }

    /// Representation hashes of all cells, children before parents
    fn hashes(&self) -> Vec<[u8; 32]> {
        let mut hashes = vec![[0u8; 32]; self.cells.len()];
        let mut depths = vec![0u16; self.cells.len()];

        for (index, cell) in self.cells.iter().enumerate().rev() {
            let mut hasher = Sha256::new();
            hasher.update([cell.refs.len() as u8, cell.d2]);
            hasher.update(cell.data);
            for &child in &cell.refs {
                hasher.update(depths[child].to_be_bytes());
            }
            for &child in &cell.refs {
                hasher.update(hashes[child]);
            }
            hashes[index] = hasher.finalize().into();
            depths[index] = cell
                .refs
                .iter()
                .map(|&child| depths[child].saturating_add(1))
                .max()
                .unwrap_or(0);
        }

        hashes
    }
}

fn parse_cell<'a>(
    reader: &mut Reader<'a>,
    index: usize,
    cell_count: usize,
    ref_size: usize,
) -> CellResult<Cell<'a>> {
    let d1 = reader.u8()?;
    let d2 = reader.u8()?;

    let ref_count = (d1 & 0x07) as usize;
    let exotic = d1 & 0x08 != 0;
    let with_hashes = d1 & 0x10 != 0;
    let level_mask = d1 >> 5;

    if exotic {
        return Err(CellError::Unsupported("exotic cell"));
    }
    if level_mask != 0 {
        return Err(CellError::Unsupported("cell level"));
    }
    if ref_count > 4 {
        return Err(CellError::Invalid("reference count"));
    }
    if with_hashes {
        // one hash and one depth for a level-0 cell
        reader.take(32 + 2)?;
    }

    let data_len = (d2 as usize + 1) / 2;
    let data = reader.take(data_len)?;
    let bit_len = if d2 % 2 == 0 {
        data_len * 8
    } else {
        let last = data[data_len - 1];
        if last == 0 {
            return Err(CellError::Invalid("completion tag"));
        }
        data_len * 8 - (last.trailing_zeros() as usize + 1)
    };

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        let child = reader.uint(ref_size)?;
        if child <= index || child >= cell_count {
            return Err(CellError::Invalid("reference index"));
        }
        refs.push(child);
    }

    Ok(Cell {
        d2,
        data,
        bit_len,
        refs,
    })
}

fn read_public_key(blob: &[u8]) -> CellResult<[u8; 32]> {
    let boc = BagOfCells::parse(blob)?;
    let data = boc.data_cell()?;
    if data.bit_len < PUBLIC_KEY_OFFSET_BITS + 256 {
        return Err(CellError::Truncated);
    }

    let start = PUBLIC_KEY_OFFSET_BITS / 8;
    let mut key = [0u8; 32];
    key.copy_from_slice(&data.data[start..start + 32]);
    Ok(key)
}

/// Extract the wallet public key from a serialized `StateInit`
///
/// Returns `None` for anything that is not a well-formed `StateInit` whose
/// data cell carries at least 32 + 256 bits.
pub fn extract_public_key(blob: &[u8]) -> Option<[u8; 32]> {
    match read_public_key(blob) {
        Ok(key) => Some(key),
        Err(err) => {
            debug!(error = %err, "cannot read public key from state init");
            None
        }
    }
}

/// Representation hash of the root cell, i.e. the account id the
/// `StateInit` deploys to
pub fn state_init_hash(blob: &[u8]) -> Option<[u8; 32]> {
    match BagOfCells::parse(blob) {
        Ok(boc) => Some(boc.hashes()[boc.root]),
        Err(err) => {
            debug!(error = %err, "cannot hash state init");
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    const KEY: [u8; 32] = [0x5a; 32];

    /// Wallet v3r2 code as published, a single 111-byte cell with CRC32C
    const WALLET_V3R2_CODE: &str = "\
        b5ee9c724101010100710000deff0020dd2082014c97ba218201339cbab19f71b0ed44d0d31fd31f31d70bff\
        e304e0a4f2608308d71820d31fd31fd31ff82313bbf263ed44d0d31fd31fd3ffd15132baf2a15144baf2a204\
        f901541055f910f2a3f8009320d74a96d307d402fb00e8d101a4c8cb1fcb1fcbffc9ed5410bd6dad";

    const WALLET_V3R2_CODE_HASH: &str =
        "84dafa449f98a6987789ba232358072bc0f76dc4524002a5d0918b9a75d2d599";

    /// `StateInit` deploying the v3r2 code above with a seqno and key data
    /// cell, serialized with CRC32C and one-byte offsets
    const PINNED_STATE_INIT: &str = "\
        b5ee9c7241010301009c00020134010200deff0020dd2082014c97ba218201339cbab19f71b0ed44d0d31fd3\
        1f31d70bffe304e0a4f2608308d71820d31fd31fd31ff82313bbf263ed44d0d31fd31fd3ffd15132baf2a151\
        44baf2a204f901541055f910f2a3f8009320d74a96d307d402fb00e8d101a4c8cb1fcb1fcbffc9ed54004800\
        0000005f2a1c9e3b7d4a6081f2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718ab9cd967";

    const PINNED_KEY: &str = "5f2a1c9e3b7d4a6081f2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718";

    const PINNED_ACCOUNT_HASH: &str =
        "815961d61c2010c425bfd50740fc3207e17cf426bd9e1471a32b7a5af2dde749";

    fn hex32(s: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out).unwrap();
        out
    }

    #[test]
    fn test_extracts_key_from_wallet_state_init() {
        let blob = wallet_state_init(&KEY);
        assert_eq!(extract_public_key(&blob), Some(KEY));
    }

    #[test]
    fn test_state_init_without_code() {
        let header = [false, false, false, true, false];
        let blob = bag_of_cells(&[cell(&header, &[1]), cell(&wallet_data(&KEY), &[])]);
        assert_eq!(extract_public_key(&blob), Some(KEY));
    }

    #[test]
    fn test_state_init_with_split_depth_and_special() {
        let header = [
            true, false, false, true, false, true, // split_depth = 5
            true, true, false, // special: tick only
            true, true, false,
        ];
        let blob = bag_of_cells(&[
            cell(&header, &[1, 2]),
            cell(&bits_of(b"code"), &[]),
            cell(&wallet_data(&KEY), &[]),
        ]);
        assert_eq!(extract_public_key(&blob), Some(KEY));
    }

    #[test]
    fn test_longer_data_cell_still_reads_key_at_offset() {
        let mut data = wallet_data(&KEY);
        data.extend_from_slice(&[true, false, true]);
        let header = [false, false, false, true, false];
        let blob = bag_of_cells(&[cell(&header, &[1]), cell(&data, &[])]);
        assert_eq!(extract_public_key(&blob), Some(KEY));
    }

    #[test]
    fn test_index_and_crc_are_skipped() {
        let blob = wallet_state_init(&KEY);
        // rebuild with has_idx | has_crc32c, three cells, two-byte offsets
        let mut with_extras = blob[..4].to_vec();
        with_extras.push(0x01 | HAS_INDEX | HAS_CRC32C);
        with_extras.extend_from_slice(&blob[5..12]);
        with_extras.extend_from_slice(&[0u8; 6]);
        with_extras.extend_from_slice(&blob[12..]);
        with_extras.extend_from_slice(&[0u8; 4]);

        assert_eq!(extract_public_key(&with_extras), Some(KEY));
    }

    #[test]
    fn test_missing_data_cell() {
        let header = [false, false, true, false, false];
        let blob = bag_of_cells(&[cell(&header, &[1]), cell(&bits_of(b"code"), &[])]);
        assert_eq!(extract_public_key(&blob), None);
    }

    #[test]
    fn test_data_flag_without_reference() {
        let header = [false, false, true, true, false];
        let blob = bag_of_cells(&[cell(&header, &[1]), cell(&bits_of(b"code"), &[])]);
        assert_eq!(extract_public_key(&blob), None);
    }

    #[test]
    fn test_data_cell_too_short() {
        let header = [false, false, false, true, false];
        let short = bits_of(&[0u8; 4 + 31]);
        let blob = bag_of_cells(&[cell(&header, &[1]), cell(&short, &[])]);
        assert_eq!(extract_public_key(&blob), None);
    }

    #[test]
    fn test_malformed_blobs() {
        let blob = wallet_state_init(&KEY);

        assert_eq!(extract_public_key(&[]), None);
        assert_eq!(extract_public_key(&blob[..blob.len() - 1]), None);

        let mut bad_magic = blob.clone();
        bad_magic[0] = 0x00;
        assert_eq!(extract_public_key(&bad_magic), None);

        let mut trailing = blob.clone();
        trailing.push(0);
        assert_eq!(extract_public_key(&trailing), None);
    }

    #[test]
    fn test_backward_reference_rejected() {
        let header = [false, false, false, true, false];
        let blob = bag_of_cells(&[cell(&wallet_data(&KEY), &[]), cell(&header, &[0])]);
        assert_eq!(extract_public_key(&blob), None);
    }

    #[test]
    fn test_exotic_cell_rejected() {
        let mut blob = wallet_state_init(&KEY);
        // first descriptor byte of the root cell
        blob[12] |= 0x08;
        assert_eq!(extract_public_key(&blob), None);
    }

    #[test]
    fn test_empty_cell_hash() {
        let blob = bag_of_cells(&[cell(&[], &[])]);
        let expected: [u8; 32] = Sha256::digest([0u8, 0u8]).into();
        assert_eq!(state_init_hash(&blob), Some(expected));
    }

    #[test]
    fn test_hash_covers_children() {
        let a = state_init_hash(&wallet_state_init(&[1u8; 32])).unwrap();
        let b = state_init_hash(&wallet_state_init(&[2u8; 32])).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, state_init_hash(&wallet_state_init(&[1u8; 32])).unwrap());
    }

    #[test]
    fn test_hash_of_single_child() {
        let child = cell(&bits_of(&[0xab]), &[]);
        let blob = bag_of_cells(&[cell(&[], &[1]), child]);

        let child_hash: [u8; 32] = Sha256::digest([0x00, 0x02, 0xab]).into();
        let mut repr = vec![0x01, 0x00, 0x00, 0x00];
        repr.extend_from_slice(&child_hash);
        let expected: [u8; 32] = Sha256::digest(&repr).into();

        assert_eq!(state_init_hash(&blob), Some(expected));
    }

    #[test]
    fn test_published_wallet_code_hash() {
        let blob = hex::decode(WALLET_V3R2_CODE).unwrap();
        assert_eq!(state_init_hash(&blob), Some(hex32(WALLET_V3R2_CODE_HASH)));
    }

    #[test]
    fn test_pinned_state_init() {
        let blob = hex::decode(PINNED_STATE_INIT).unwrap();
        assert_eq!(extract_public_key(&blob), Some(hex32(PINNED_KEY)));
        assert_eq!(state_init_hash(&blob), Some(hex32(PINNED_ACCOUNT_HASH)));
    }
}
