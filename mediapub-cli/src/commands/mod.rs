pub mod add;
pub mod list;
pub mod pr;
pub mod publish;
pub mod sync;

use anyhow::Result;
use mediapub_core::Config;
use mediapub_sync::{GithubClient, Token};

/// Client for `<owner>/<config.repo>`, authenticated from `config.token_env`.
pub(crate) fn github_client(config: &Config, owner: &str) -> Result<GithubClient> {
    let token = Token::from_env(&config.token_env)?;
    Ok(GithubClient::new(
        &config.api_url,
        owner,
        &config.repo,
        token,
        config.timeout(),
    ))
}

/// Local date used in default commit messages and pull request titles.
pub(crate) fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
