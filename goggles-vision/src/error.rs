use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    #[error("malformed landmarks: expected at least 10 coordinates, got {len}")]
    MalformedLandmarks { len: usize },

    #[error("degenerate geometry: eyes share the same x coordinate")]
    VerticalEyeLine,
}
