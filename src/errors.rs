#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    // Errors from external libraries
    Io(std::io::Error),
    Ibapi(ibapi::Error),
    Poison(String),

    // Errors from the probe itself
    Simple(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(ref err) => err.fmt(f),
            Error::Ibapi(ref err) => err.fmt(f),
            Error::Poison(ref err) => write!(f, "{}", err),

            Error::Simple(ref err) => write!(f, "error occurred: {err}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ibapi::Error> for Error {
    fn from(err: ibapi::Error) -> Error {
        Error::Ibapi(err)
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Error {
        Error::Poison(format!("Mutex poison error: {}", err))
    }
}
