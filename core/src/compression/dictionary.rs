//! compression/dictionary.rs
//!
//! Compiled zstd dictionaries.
//!
//! Design notes:
//! - A `Dictionary` is compiled once into both a `CDict` and a `DDict` and is
//!   immutable afterwards; share it between sessions with `Arc`.
//! - Sessions reference the compiled form with `ref_cdict`/`ref_ddict`, so
//!   attaching a dictionary costs no per-session copy.
//! - The raw bytes are kept for persistence; they are the only on-disk state.
use std::fmt;
use std::fs;
use std::num::NonZeroU32;
use std::path::Path;

use log::debug;
use zstd_safe::{CDict, DDict};

use crate::compression::codec::{library_error, NativeError};
use crate::constants::MAGIC_DICT;
use crate::types::{Result, ZframeError};
use crate::utils::saturating_sum;

pub struct Dictionary {
    bytes: Vec<u8>,
    level: i32,
    id: Option<u32>,
    cdict: CDict<'static>,
    ddict: DDict<'static>,
}

impl Dictionary {
    /// Compile raw dictionary bytes for use at `level`.
    ///
    /// # Errors
    /// - `InvalidOptions` for empty bytes.
    /// - `Library` if libzstd refuses the bytes (e.g. a corrupt trained dictionary).
    pub fn compile(raw: &[u8], level: i32) -> Result<Self> {
        if raw.is_empty() {
            return Err(ZframeError::InvalidOptions("dictionary bytes are empty".into()));
        }
        let created = || library_error(NativeError::DictionaryCreationFailed.code());
        let cdict = CDict::try_create(raw, level).ok_or_else(created)?;
        let ddict = DDict::try_create(raw).ok_or_else(created)?;
        let id = zstd_safe::get_dict_id_from_dict(raw).map(NonZeroU32::get);
        debug!("compiled dictionary: {} bytes, id {:?}, level {}", raw.len(), id, level);

        Ok(Self { bytes: raw.to_vec(), level, id, cdict, ddict })
    }

    /// Load a persisted dictionary blob and compile it.
    pub fn load<P: AsRef<Path>>(path: P, level: i32) -> Result<Self> {
        let raw = fs::read(path)?;
        Self::compile(&raw, level)
    }

    /// Persist the raw bytes; `load` restores an equivalent dictionary.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, &self.bytes)?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Trained dictionaries carry a header; anything else is raw content.
    pub fn is_trained(&self) -> bool {
        self.bytes.starts_with(&MAGIC_DICT)
    }

    /// ID written into the dictionary header; `None` for raw-content dictionaries.
    pub fn id(&self) -> Option<u32> {
        self.id
    }

    pub(crate) fn cdict(&self) -> &CDict<'static> {
        &self.cdict
    }

    pub(crate) fn ddict(&self) -> &DDict<'static> {
        &self.ddict
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("len", &self.bytes.len())
            .field("level", &self.level)
            .field("id", &self.id)
            .finish()
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level && self.bytes == other.bytes
    }
}

/// Train dictionary bytes from representative samples.
///
/// # Errors
/// - `InvalidOptions` if `samples` is empty or `capacity` is zero.
/// - `Library` if the trainer fails (too few or unsuitable samples).
pub fn train<S: AsRef<[u8]>>(samples: &[S], capacity: usize) -> Result<Vec<u8>> {
    if samples.is_empty() {
        return Err(ZframeError::InvalidOptions("no samples to train on".into()));
    }
    if capacity == 0 {
        return Err(ZframeError::InvalidOptions("dictionary capacity must be positive".into()));
    }

    let sizes: Vec<usize> = samples.iter().map(|s| s.as_ref().len()).collect();
    let mut joined = Vec::with_capacity(saturating_sum(&sizes));
    for sample in samples {
        joined.extend_from_slice(sample.as_ref());
    }

    let mut dict = Vec::with_capacity(capacity);
    let written = zstd_safe::train_from_buffer(&mut dict, &joined, &sizes).map_err(library_error)?;
    dict.truncate(written);
    debug!("trained dictionary: {} samples -> {} bytes", samples.len(), written);
    Ok(dict)
}
