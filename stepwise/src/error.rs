use stepwise_core::ScenarioError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("scenario `{0}`")]
    Scenario(#[from] ScenarioError),
}

pub type Result<T> = std::result::Result<T, Error>;
