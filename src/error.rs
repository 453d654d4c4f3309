use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenoptError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid fitness value: {0}")]
    InvalidFitness(f64),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),
}

pub type Result<T> = std::result::Result<T, GenoptError>;
