/// Tri-state outcome shared by tree nodes and the lookups that walk them.
///
/// `Indeterminate` means "not known yet": data is still loading and the
/// question should be asked again on a later frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Validity {
    #[default]
    Indeterminate,
    Invalid,
    Valid,
}

impl Validity {
    pub fn is_determined(self) -> bool {
        self != Validity::Indeterminate
    }
}

/// Whether a node's cached surrogate elevation can be used as a height sample.
pub fn valid_surrogate(value: f64) -> bool {
    value.is_finite()
}
