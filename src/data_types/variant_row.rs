
/// Alternate allele used when a base could not be called inside the trusted window
pub const NO_CALL_BASE: &str = "N";

/// The kinds of rows the caller produces
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, strum_macros::AsRefStr, strum_macros::EnumIter, strum_macros::IntoStaticStr)]
pub enum VariantKind {
    /// Query base differs from the reference base
    #[strum(serialize = "SNV")]
    Snv=0,
    /// Gap in a flank that falls inside the analysis window, reported as an `N`
    #[strum(serialize = "NOCALL")]
    NoCall,
    /// A run of gaps bounded by called bases on both sides
    #[strum(serialize = "DEL")]
    Deletion,
}

/// A single emitted difference between one query and the reference.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariantRow {
    /// Sample identifier from the query record
    sample_id: String,
    /// 1-based reference coordinate; first deleted base for deletions
    position: u64,
    /// Reference base, empty for deletions
    reference_base: String,
    /// Query base, `N` for no-calls, or `<len>D` for deletions
    alternate_base: String,
    /// The type of row
    kind: VariantKind,
    /// Number of reference bases covered by this row
    ref_len: u64,
}

impl VariantRow {
    /// Creates a single-nucleotide difference row
    /// # Arguments
    /// * `sample_id` - the query sample
    /// * `position` - 1-based reference coordinate
    /// * `reference_base` - the reference symbol at `position`
    /// * `alternate_base` - the query symbol at `position`
    pub fn new_snv(sample_id: &str, position: u64, reference_base: u8, alternate_base: u8) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            position,
            reference_base: char::from(reference_base).to_string(),
            alternate_base: char::from(alternate_base).to_string(),
            kind: VariantKind::Snv,
            ref_len: 1,
        }
    }

    /// Creates a no-call row for an un-called position inside the analysis window
    /// # Arguments
    /// * `sample_id` - the query sample
    /// * `position` - 1-based reference coordinate
    /// * `reference_base` - the reference symbol at `position`
    pub fn new_no_call(sample_id: &str, position: u64, reference_base: u8) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            position,
            reference_base: char::from(reference_base).to_string(),
            alternate_base: NO_CALL_BASE.to_string(),
            kind: VariantKind::NoCall,
            ref_len: 1,
        }
    }

    /// Creates a deletion row
    /// # Arguments
    /// * `sample_id` - the query sample
    /// * `position` - 1-based coordinate of the first deleted reference base
    /// * `length` - number of deleted reference bases, must be > 0
    pub fn new_deletion(sample_id: &str, position: u64, length: u64) -> Self {
        debug_assert!(length > 0);
        Self {
            sample_id: sample_id.to_string(),
            position,
            reference_base: String::new(),
            alternate_base: format!("{length}D"),
            kind: VariantKind::Deletion,
            ref_len: length,
        }
    }

    pub fn is_indel(&self) -> bool {
        self.kind == VariantKind::Deletion
    }

    // getters
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn reference_base(&self) -> &str {
        &self.reference_base
    }

    pub fn alternate_base(&self) -> &str {
        &self.alternate_base
    }

    pub fn kind(&self) -> VariantKind {
        self.kind
    }

    pub fn ref_len(&self) -> u64 {
        self.ref_len
    }
}
