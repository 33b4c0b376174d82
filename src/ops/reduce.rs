//! Whole-array reduction kinds

/// Built-in reduction over every element of a storage
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reduction {
    /// Sum of elements
    Sum,
    /// Mean of elements (sum / count)
    Mean,
    /// Maximum element
    Max,
    /// Minimum element
    Min,
    /// Flat index of the maximum element, first occurrence on ties
    ArgMax,
    /// Flat index of the minimum element, first occurrence on ties
    ArgMin,
    /// Element count
    Len,
}

impl Reduction {
    /// Reductions that have no value for an empty array
    #[inline]
    pub const fn requires_elements(self) -> bool {
        matches!(self, Self::Max | Self::Min | Self::ArgMax | Self::ArgMin)
    }

    /// Lowercase name used in logs and errors
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Max => "max",
            Self::Min => "min",
            Self::ArgMax => "argmax",
            Self::ArgMin => "argmin",
            Self::Len => "len",
        }
    }
}
