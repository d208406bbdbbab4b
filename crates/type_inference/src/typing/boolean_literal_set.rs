/// A set in the domain {`true`,`false`}.
/// There are four possible sets: {}, {`true`}, {`false`}, {`true`,`false`}.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BooleanLiteralSet {
    EMPTY = 0,
    TRUE = 1,
    FALSE = 2,
    BOTH = 3,
}

impl BooleanLiteralSet {
    /// Computes the intersection of this set and `other`.
    pub fn intersection(self, other: BooleanLiteralSet) -> BooleanLiteralSet {
        BooleanLiteralSet::from(self as u8 & other as u8)
    }

    /// Computes the union of this set and `other`.
    pub fn union(self, other: BooleanLiteralSet) -> BooleanLiteralSet {
        BooleanLiteralSet::from(self as u8 | other as u8)
    }

    /// Returns whether `self` contains the given literal value.
    pub fn contains(self, literal_value: bool) -> bool {
        match self {
            BooleanLiteralSet::EMPTY => false,
            BooleanLiteralSet::TRUE => literal_value,
            BooleanLiteralSet::FALSE => !literal_value,
            BooleanLiteralSet::BOTH => true,
        }
    }

    /// Returns the singleton set {`literal_value`}.
    pub fn get(literal_value: bool) -> BooleanLiteralSet {
        if literal_value {
            BooleanLiteralSet::TRUE
        } else {
            BooleanLiteralSet::FALSE
        }
    }
}

impl From<u8> for BooleanLiteralSet {
    /// Only the low two bits are significant.
    fn from(ordinal: u8) -> Self {
        match ordinal & 0b11 {
            0 => BooleanLiteralSet::EMPTY,
            1 => BooleanLiteralSet::TRUE,
            2 => BooleanLiteralSet::FALSE,
            _ => BooleanLiteralSet::BOTH,
        }
    }
}
