use foundation::math::ConvertError;
use terrain::TileId;

/// Errors that abort a navigation call. They indicate a configuration or
/// programming mistake; continuing would corrupt the camera state.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationError {
    CartesianNavigation,
    UnresolvedGeographicMode,
    InvalidOptions(String),
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationError::CartesianNavigation => {
                write!(f, "navigation in a cartesian reference frame is not supported")
            }
            NavigationError::UnresolvedGeographicMode => {
                write!(f, "dynamic geographic mode was not resolved before use")
            }
            NavigationError::InvalidOptions(reason) => write!(f, "invalid navigation options: {reason}"),
        }
    }
}

impl std::error::Error for NavigationError {}

/// Expected, recoverable failures. They invalidate a single height request
/// (or a camera frame query) and never the navigation update itself.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    OutsideReferenceFrame,
    NoContainingChild(TileId),
    CornerOutOfRange(TileId),
    Conversion(ConvertError),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::OutsideReferenceFrame => write!(f, "point is outside every reference frame root"),
            DomainError::NoContainingChild(id) => write!(f, "no child of tile {id} contains the point"),
            DomainError::CornerOutOfRange(id) => write!(f, "sampling corner of tile {id} is off the grid"),
            DomainError::Conversion(err) => write!(f, "coordinate conversion failed: {err}"),
        }
    }
}

impl std::error::Error for DomainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DomainError::Conversion(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConvertError> for DomainError {
    fn from(err: ConvertError) -> Self {
        DomainError::Conversion(err)
    }
}

#[cfg(test)]
mod tests {
    use super::{DomainError, NavigationError};
    use foundation::math::ConvertError;
    use terrain::TileId;

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            NavigationError::InvalidOptions("bad inertia".into()).to_string(),
            "invalid navigation options: bad inertia"
        );
        assert_eq!(
            DomainError::NoContainingChild(TileId::new(2, 1, 3)).to_string(),
            "no child of tile 2-1-3 contains the point"
        );
    }

    #[test]
    fn conversion_errors_are_wrapped() {
        let err: DomainError = ConvertError::NonFinite.into();
        assert_eq!(err, DomainError::Conversion(ConvertError::NonFinite));
        assert!(std::error::Error::source(&err).is_some());
    }
}
