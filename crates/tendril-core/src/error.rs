use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a reducer dispatch did not reach the reducer.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("middleware `{middleware}` rejected the action: {source}")]
    Rejected {
        middleware: String,
        #[source]
        source: BoxError,
    },
    #[error("nested dispatch exceeded depth {0}")]
    TooDeep(usize),
}

impl DispatchError {
    pub fn rejected(middleware: impl Into<String>, reason: impl Into<BoxError>) -> Self {
        Self::Rejected {
            middleware: middleware.into(),
            source: reason.into(),
        }
    }
}
