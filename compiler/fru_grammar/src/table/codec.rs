//! Binary table format.
//!
//! ```text
//! +--------+----------------+---------------------------+
//! | "FRUT" | version: u32le | bincode(GrammarTable)     |
//! +--------+----------------+---------------------------+
//! ```
//!
//! Loading checks the magic and version before decoding and validates the
//! decoded table before returning it.

use super::GrammarTable;
use crate::error::GrammarTableError;

pub const MAGIC: [u8; 4] = *b"FRUT";
pub const FORMAT_VERSION: u32 = 2;

const HEADER_LEN: usize = MAGIC.len() + 4;

impl GrammarTable {
    /// Serialize into the binary table format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GrammarTableError> {
        let mut out = Vec::with_capacity(HEADER_LEN + 4096);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bincode::serialize_into(&mut out, self).map_err(GrammarTableError::Encode)?;
        Ok(out)
    }

    /// Load and validate a table in the binary format.
    #[tracing::instrument(level = "debug", skip_all, fields(len = bytes.len()))]
    pub fn from_bytes(bytes: &[u8]) -> Result<GrammarTable, GrammarTableError> {
        let Some((magic, rest)) = bytes.split_first_chunk::<4>() else {
            return Err(GrammarTableError::BadMagic);
        };
        if *magic != MAGIC {
            return Err(GrammarTableError::BadMagic);
        }
        let Some((version, body)) = rest.split_first_chunk::<4>() else {
            return Err(GrammarTableError::BadMagic);
        };
        let found = u32::from_le_bytes(*version);
        if found != FORMAT_VERSION {
            return Err(GrammarTableError::UnsupportedVersion {
                found,
                expected: FORMAT_VERSION,
            });
        }
        let table: GrammarTable = bincode::deserialize(body).map_err(GrammarTableError::Decode)?;
        table.validate()?;
        tracing::debug!(
            name = %table.name,
            states = table.states.len(),
            symbols = table.symbols.len(),
            "loaded grammar table"
        );
        Ok(table)
    }
}
