//! Exact-match table from press sequences to sound files.

use heapless::{String, Vec};

use crate::types::Symbol;

/// Longest sequence the game can capture.
pub const MAX_PATTERN_LEN: usize = 8;

/// Capacity of [`DefaultPatternTable`].
pub const DEFAULT_TABLE_CAPACITY: usize = 32;

/// Table type sized for [`DEFAULT_PATTERNS`].
pub type DefaultPatternTable = PatternTable<DEFAULT_TABLE_CAPACITY>;

/// Capacity of a rendered sequence key. Large enough to log an overflowing
/// capture as well as any valid pattern.
pub const KEY_CAPACITY: usize = 2 * MAX_PATTERN_LEN;

/// Sequence key as captured, e.g. `"LRR"`.
pub type SequenceKey = String<KEY_CAPACITY>;

/// The deployed pattern set: every sequence of length one to four.
pub const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    ("L", "TM-SOOTY.MP3"),
    ("R", "TM-SHARK.MP3"),
    ("LL", "TM-PEPPA.MP3"),
    ("RR", "TM-SESAM.MP3"),
    ("LR", "TM-FIREM.MP3"),
    ("RL", "TM-BLUEY.MP3"),
    ("LLL", "TM-WHEEL.MP3"),
    ("LLR", "TM-MCDON.MP3"),
    ("LRL", "TM-MARIO.MP3"),
    ("LRR", "TM-THOM.MP3"),
    ("RLL", "TM-PAWP.MP3"),
    ("RLR", "TM-DRWHO.MP3"),
    ("RRL", "TM-ROLR.MP3"),
    ("RRR", "TM-SPID.MP3"),
    ("LLLL", "TM-PRLD.MP3"),
    ("LLLR", "TM-HIGN.MP3"),
    ("LLRL", "TM-XFIL.MP3"),
    ("LLRR", "TM-TBIRD.MP3"),
    ("LRLL", "TM-QUAN.MP3"),
    ("LRLR", "TM-ALLO.MP3"),
    ("LRRL", "TM-STAR.MP3"),
    ("LRRR", "TM-KNIG.MP3"),
    ("RLLL", "TM-STARW.MP3"),
    ("RLLR", "TM-TOPG.MP3"),
    ("RLRL", "TM-CHRS.MP3"),
    ("RLRR", "TM-POSTP.MP3"),
    ("RRLL", "TM-HAWAI.MP3"),
    ("RRLR", "TM-BLUEY.MP3"),
    ("RRRL", "TM-NEV.MP3"),
    ("RRRR", "TM-NEIGH.MP3"),
];

/// One table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pattern {
    /// Sequence over `L`/`R`.
    pub sequence: &'static str,
    /// File name relative to the game folder.
    pub file: &'static str,
}

/// Pattern validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternError {
    /// No patterns provided.
    EmptyTable,

    /// A sequence has no symbols.
    EmptySequence,

    /// A sequence contains something other than `L` or `R`.
    InvalidSymbol(char),

    /// A sequence is longer than [`MAX_PATTERN_LEN`].
    SequenceTooLong(usize),

    /// The same sequence appears twice.
    DuplicateSequence(&'static str),

    /// Table capacity exceeded.
    CapacityExceeded,
}

impl core::fmt::Display for PatternError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PatternError::EmptyTable => write!(f, "pattern table must have at least one entry"),
            PatternError::EmptySequence => write!(f, "pattern sequence is empty"),
            PatternError::InvalidSymbol(c) => {
                write!(f, "invalid symbol {:?}, expected 'L' or 'R'", c)
            }
            PatternError::SequenceTooLong(len) => write!(
                f,
                "sequence of {} symbols exceeds maximum of {}",
                len, MAX_PATTERN_LEN
            ),
            PatternError::DuplicateSequence(seq) => write!(f, "duplicate sequence {}", seq),
            PatternError::CapacityExceeded => write!(f, "pattern table capacity exceeded"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PatternError {}

/// Read-only mapping from press sequences to files.
///
/// Entries are kept sorted by sequence and looked up by binary search.
/// Lookups are exact: `"LR"` never matches `"LRL"`.
///
/// # Type Parameters
/// * `N` - Maximum number of entries
#[derive(Debug, Clone)]
pub struct PatternTable<const N: usize> {
    entries: Vec<Pattern, N>,
    max_len: usize,
}

impl<const N: usize> PatternTable<N> {
    /// Creates a new table builder.
    pub fn builder() -> PatternBuilder<N> {
        PatternBuilder::new()
    }

    /// Builds a table from `(sequence, file)` pairs.
    pub fn from_pairs(pairs: &[(&'static str, &'static str)]) -> Result<Self, PatternError> {
        pairs
            .iter()
            .try_fold(Self::builder(), |builder, &(sequence, file)| {
                builder.pattern(sequence, file)
            })?
            .build()
    }

    /// Looks up a sequence written as `L`/`R` characters.
    pub fn lookup(&self, sequence: &str) -> Option<&'static str> {
        self.entries
            .binary_search_by(|entry| entry.sequence.cmp(sequence))
            .ok()
            .map(|index| self.entries[index].file)
    }

    /// Looks up a captured symbol sequence.
    pub fn lookup_symbols(&self, symbols: &[Symbol]) -> Option<&'static str> {
        let key = sequence_key(symbols)?;
        self.lookup(&key)
    }

    /// Length of the longest sequence in the table.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.entries.iter()
    }
}

/// Renders symbols as an `L`/`R` string.
///
/// Returns `None` if there are more than [`KEY_CAPACITY`] symbols.
pub fn sequence_key(symbols: &[Symbol]) -> Option<SequenceKey> {
    let mut key = SequenceKey::new();
    for symbol in symbols {
        key.push(symbol.as_char()).ok()?;
    }
    Some(key)
}

/// Builder for constructing validated pattern tables.
#[derive(Debug)]
pub struct PatternBuilder<const N: usize> {
    entries: Vec<Pattern, N>,
}

impl<const N: usize> PatternBuilder<N> {
    /// Creates a new empty builder.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a pattern.
    ///
    /// # Errors
    /// * `EmptySequence` - `sequence` is empty
    /// * `InvalidSymbol` - `sequence` contains a character other than `L`/`R`
    /// * `SequenceTooLong` - `sequence` exceeds [`MAX_PATTERN_LEN`]
    /// * `CapacityExceeded` - the table already holds `N` entries
    pub fn pattern(
        mut self,
        sequence: &'static str,
        file: &'static str,
    ) -> Result<Self, PatternError> {
        if sequence.is_empty() {
            return Err(PatternError::EmptySequence);
        }
        if let Some(bad) = sequence.chars().find(|&c| Symbol::from_char(c).is_none()) {
            return Err(PatternError::InvalidSymbol(bad));
        }
        if sequence.len() > MAX_PATTERN_LEN {
            return Err(PatternError::SequenceTooLong(sequence.len()));
        }

        self.entries
            .push(Pattern { sequence, file })
            .map_err(|_| PatternError::CapacityExceeded)?;
        Ok(self)
    }

    /// Builds and validates the table.
    ///
    /// # Errors
    /// * `EmptyTable` - No patterns were added
    /// * `DuplicateSequence` - A sequence was added twice
    pub fn build(mut self) -> Result<PatternTable<N>, PatternError> {
        if self.entries.is_empty() {
            return Err(PatternError::EmptyTable);
        }

        self.entries
            .sort_unstable_by(|a, b| a.sequence.cmp(b.sequence));

        if let Some(pair) = self
            .entries
            .windows(2)
            .find(|pair| pair[0].sequence == pair[1].sequence)
        {
            return Err(PatternError::DuplicateSequence(pair[0].sequence));
        }

        let max_len = self
            .entries
            .iter()
            .map(|entry| entry.sequence.len())
            .max()
            .unwrap_or(0);

        Ok(PatternTable {
            entries: self.entries,
            max_len,
        })
    }
}

impl<const N: usize> Default for PatternBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}
