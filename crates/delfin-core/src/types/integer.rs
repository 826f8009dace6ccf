//! Integer widths and range arithmetic

use std::fmt;

/// A two's-complement integer type, identified by byte size and signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerType {
    pub size: u8,
    pub signed: bool,
}

impl IntegerType {
    pub const SHORT_INT: IntegerType = IntegerType::new(1, true);
    pub const SMALL_INT: IntegerType = IntegerType::new(2, true);
    pub const INTEGER: IntegerType = IntegerType::new(4, true);
    pub const INT64: IntegerType = IntegerType::new(8, true);
    pub const BYTE: IntegerType = IntegerType::new(1, false);
    pub const WORD: IntegerType = IntegerType::new(2, false);
    pub const CARDINAL: IntegerType = IntegerType::new(4, false);
    pub const UINT64: IntegerType = IntegerType::new(8, false);

    pub const SIGNED: [IntegerType; 4] = [
        Self::SHORT_INT,
        Self::SMALL_INT,
        Self::INTEGER,
        Self::INT64,
    ];
    pub const UNSIGNED: [IntegerType; 4] = [Self::BYTE, Self::WORD, Self::CARDINAL, Self::UINT64];

    pub const fn new(size: u8, signed: bool) -> Self {
        Self { size, signed }
    }

    fn bits(&self) -> u32 {
        u32::from(self.size) * 8
    }

    pub fn min(&self) -> i128 {
        if self.signed {
            -(1i128 << (self.bits() - 1))
        } else {
            0
        }
    }

    pub fn max(&self) -> i128 {
        if self.signed {
            (1i128 << (self.bits() - 1)) - 1
        } else {
            (1i128 << self.bits()) - 1
        }
    }

    pub fn contains(&self, value: i128) -> bool {
        (self.min()..=self.max()).contains(&value)
    }

    /// True when `other` is at least as wide as this type. Sign is ignored.
    pub fn is_within_limit(&self, other: &IntegerType) -> bool {
        self.size <= other.size
    }

    pub fn is_same_range(&self, other: &IntegerType) -> bool {
        self.size == other.size && self.signed == other.signed
    }

    /// Sum of the distances between the two lower bounds and the two upper
    /// bounds. Zero only for identical ranges.
    pub fn ordinal_distance(&self, other: &IntegerType) -> f64 {
        let low = (self.min() - other.min()).unsigned_abs();
        let high = (self.max() - other.max()).unsigned_abs();
        (low + high) as f64
    }

    /// True when every value of this type is representable in `other`.
    pub fn fits_in(&self, other: &IntegerType) -> bool {
        other.min() <= self.min() && self.max() <= other.max()
    }

    pub fn image(&self) -> &'static str {
        match (self.size, self.signed) {
            (1, true) => "ShortInt",
            (2, true) => "SmallInt",
            (4, true) => "Integer",
            (8, true) => "Int64",
            (1, false) => "Byte",
            (2, false) => "Word",
            (4, false) => "Cardinal",
            (8, false) => "UInt64",
            (_, true) => "<signed integer>",
            (_, false) => "<unsigned integer>",
        }
    }

    /// Narrowest of Integer, Int64 and UInt64 able to hold a literal value.
    pub fn for_literal(value: u64) -> IntegerType {
        let value = i128::from(value);
        [Self::INTEGER, Self::INT64]
            .into_iter()
            .find(|candidate| candidate.contains(value))
            .unwrap_or(Self::UINT64)
    }
}

impl fmt::Display for IntegerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.image())
    }
}
