//! # Persistence — Binary Set Record Codec
//!
//! Binary file format for a single [`crate::set_record::SetRecord`]:
//!
//! ```text
//! 0x000 .. 0x7FF   reserved (free for a user header, stored as text)
//! 0x800            four newline-terminated header lines (see below)
//! 0x1000           exactly `total` bytes of cell data, combinadic order
//! ```
//!
//! The header lines at `0x800`, in order:
//!
//! ```text
//! Full Set -- Size: %zu
//! Variable Segment -- Size: %zu, M-Value Range: %lu to %lu
//! Fixed Segment -- Size: %zu, Values: %lu, %lu, %lu, %lu
//! SHA-256: <64 hex digits>
//! Data begins 4K (4096) into the file
//! ```
//!
//! (four value slots in the fixed-segment line; unused slots are `0`). The
//! `SHA-256` line hashes the cell payload at `0x1000`; `import` recomputes it
//! and rejects the file with [`Error::InvalidFile`] on mismatch, guarding
//! against truncated or bit-flipped exports.
//!
//! `export` additionally writes a `<path>.summary.json` sidecar — metadata
//! plus the same hash, for tooling that wants to inspect a record without
//! parsing the binary header. It is not consulted by `import`; the `.dat`
//! file alone is authoritative.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::set_record::SetRecord;

const HEADER_OFFSET: u64 = 0x800;
const DATA_OFFSET: u64 = 0x1000;

fn hex_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[derive(Serialize)]
struct SrSummary {
    size: usize,
    var_size: usize,
    min_m: u64,
    max_m: u64,
    fixed_values: Vec<u64>,
    total: usize,
    sha256: String,
}

fn summary_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".summary.json");
    PathBuf::from(os)
}

/// Writes `sr` to `path` in the format described above. Truncates/creates
/// the file as needed.
pub fn export(sr: &SetRecord, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|e| Error::io(path, e))?;

    let reserved = vec![0u8; HEADER_OFFSET as usize];
    file.write_all(&reserved).map_err(|e| Error::io(path, e))?;

    let fixed_size = sr.get_fixed_size();
    let mut fixed_slots = [0u64; 4];
    for (i, slot) in fixed_slots.iter_mut().enumerate() {
        *slot = sr.get_fixed_value(i).unwrap_or(0);
    }

    let total = sr.get_total();
    let mut buf = Vec::with_capacity(total);
    for i in 0..total {
        buf.push(sr.cell_raw(i));
    }
    let sha256 = hex_digest(&buf);

    let header = format!(
        "Full Set -- Size: {}\n\
         Variable Segment -- Size: {}, M-Value Range: {} to {}\n\
         Fixed Segment -- Size: {}, Values: {}, {}, {}, {}\n\
         SHA-256: {}\n\
         Data begins 4K (4096) into the file\n",
        sr.get_size(),
        sr.get_var_size(),
        sr.get_min_m(),
        sr.get_max_m(),
        fixed_size,
        fixed_slots[0],
        fixed_slots[1],
        fixed_slots[2],
        fixed_slots[3],
        sha256,
    );
    file.write_all(header.as_bytes())
        .map_err(|e| Error::io(path, e))?;

    file.seek(SeekFrom::Start(DATA_OFFSET))
        .map_err(|e| Error::io(path, e))?;
    file.write_all(&buf).map_err(|e| Error::io(path, e))?;

    let summary = SrSummary {
        size: sr.get_size(),
        var_size: sr.get_var_size(),
        min_m: sr.get_min_m(),
        max_m: sr.get_max_m(),
        fixed_values: (0..sr.get_fixed_size())
            .filter_map(|i| sr.get_fixed_value(i))
            .collect(),
        total,
        sha256,
    };
    let summary_file = File::create(summary_path(path)).map_err(|e| Error::io(path, e))?;
    serde_json::to_writer_pretty(summary_file, &summary).map_err(|e| {
        Error::InvalidFile(format!("failed writing summary sidecar for {}: {e}", path.display()))
    })?;
    Ok(())
}

struct ParsedHeader {
    size: usize,
    var_size: usize,
    min_m: u64,
    max_m: u64,
    fixed_values: Vec<u64>,
    sha256: String,
}

fn parse_header(text: &str, path: &Path) -> Result<ParsedHeader> {
    let mut lines = text.lines();
    let bad = || Error::InvalidFile(format!("malformed header in {}", path.display()));

    let l1 = lines.next().ok_or_else(bad)?;
    let size: usize = l1
        .strip_prefix("Full Set -- Size: ")
        .ok_or_else(bad)?
        .trim()
        .parse()
        .map_err(|_| bad())?;

    let l2 = lines.next().ok_or_else(bad)?;
    let rest = l2
        .strip_prefix("Variable Segment -- Size: ")
        .ok_or_else(bad)?;
    let (var_size_str, range_str) = rest.split_once(", M-Value Range: ").ok_or_else(bad)?;
    let var_size: usize = var_size_str.trim().parse().map_err(|_| bad())?;
    let (min_str, max_str) = range_str.split_once(" to ").ok_or_else(bad)?;
    let min_m: u64 = min_str.trim().parse().map_err(|_| bad())?;
    let max_m: u64 = max_str.trim().parse().map_err(|_| bad())?;

    let l3 = lines.next().ok_or_else(bad)?;
    let rest = l3.strip_prefix("Fixed Segment -- Size: ").ok_or_else(bad)?;
    let (fixed_size_str, values_str) = rest.split_once(", Values: ").ok_or_else(bad)?;
    let fixed_size: usize = fixed_size_str.trim().parse().map_err(|_| bad())?;
    let values: Vec<u64> = values_str
        .split(',')
        .map(|s| s.trim().parse::<u64>().map_err(|_| bad()))
        .collect::<Result<_>>()?;
    if values.len() < fixed_size {
        return Err(bad());
    }
    let fixed_values = values[..fixed_size].to_vec();

    let l4 = lines.next().ok_or_else(bad)?;
    let sha256 = l4.strip_prefix("SHA-256: ").ok_or_else(bad)?.trim().to_string();

    Ok(ParsedHeader {
        size,
        var_size,
        min_m,
        max_m,
        fixed_values,
        sha256,
    })
}

/// Reads a [`SetRecord`] from `path`: parses the header at `0x800`,
/// allocates, then reads exactly `total` bytes of cell data from `0x1000`.
///
/// [`Error::WrongSize`] if the on-disk cell payload doesn't match the size
/// implied by the header; [`Error::InvalidFile`] on a malformed header.
pub fn import(path: &Path) -> Result<SetRecord> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;

    file.seek(SeekFrom::Start(HEADER_OFFSET))
        .map_err(|e| Error::io(path, e))?;
    let mut header_buf = vec![0u8; (DATA_OFFSET - HEADER_OFFSET) as usize];
    file.read_exact(&mut header_buf)
        .map_err(|e| Error::io(path, e))?;
    let header_text = String::from_utf8_lossy(&header_buf);
    let parsed = parse_header(&header_text, path)?;

    let mut sr = SetRecord::initialize(parsed.size);
    sr.allocate(
        parsed.var_size,
        parsed.min_m,
        parsed.max_m,
        &parsed.fixed_values,
    )?;

    file.seek(SeekFrom::Start(DATA_OFFSET))
        .map_err(|e| Error::io(path, e))?;
    let total = sr.get_total();
    let mut data = vec![0u8; total];
    let read = file.read(&mut data).map_err(|e| Error::io(path, e))?;
    if read != total {
        return Err(Error::WrongSize {
            expected: total,
            found: read,
        });
    }
    if hex_digest(&data) != parsed.sha256 {
        return Err(Error::InvalidFile(format!(
            "cell payload checksum mismatch in {}",
            path.display()
        )));
    }
    sr.load_raw(&data);
    Ok(sr)
}
