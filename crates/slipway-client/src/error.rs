//! Client-side error taxonomy.

/// Failures while computing build staleness.
///
/// These surface as a typed "status unavailable" state on the view rather
/// than failing the whole build page.
#[derive(Debug, thiserror::Error)]
pub enum StalenessError {
    #[error("build carries no CI identity; staleness cannot be computed")]
    MissingCiIdentity,

    #[error("status feed error: {0}")]
    Feed(String),
}
