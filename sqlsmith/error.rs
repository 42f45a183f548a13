#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("catalog has no usable tables")]
    EmptyCatalog,
    #[error("invalid generation options: {0}")]
    InvalidOpts(#[from] garde::Report),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
