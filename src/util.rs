use std::sync::Arc;

use anyhow::Result;

use crate::infra::remote::RestStore;

pub fn is_local() -> bool {
    std::env::var("LOCAL").is_ok()
}

pub fn must_get_env(key: &str) -> String {
    match std::env::var(key) {
        Ok(val) => val,
        Err(_) => panic!("{} must be set", key),
    }
}

/// Build the remote store client from the environment. `.env` is honored;
/// `LOCAL` points everything at a dev instance.
pub fn make_remote_store(access_token: &str) -> Result<Arc<RestStore>> {
    dotenv::dotenv().ok();
    let store = match is_local() {
        true => RestStore::new("http://localhost:54321", "local-anon-key", access_token)?,
        false => RestStore::new(
            must_get_env("STORE_URL").as_str(),
            must_get_env("STORE_API_KEY").as_str(),
            access_token,
        )?,
    };
    Ok(Arc::new(store))
}
