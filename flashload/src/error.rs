use flashload_core::ConfigError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build the HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
