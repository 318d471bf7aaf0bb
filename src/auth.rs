use tracing::info;

use crate::api::{AccountApi, AccountType, RegisterRequest};
use crate::error::{ApiError, AuthError, StoreResult};
use crate::model::UserIdentity;
use crate::router::{Screen, ScreenRouter};
use crate::store::ClientStore;

/// Signs in and persists identity and bearer token.
pub async fn login<A: AccountApi>(
    api: &A,
    store: &ClientStore,
    username: &str,
    password: &str,
) -> Result<UserIdentity, AuthError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::validation("username and password are required").into());
    }

    let grant = api.login(username, password).await?;
    let identity = UserIdentity {
        id: grant.user_id,
        username: grant.username,
        account_type: grant.account_type,
    };

    store.set_token(&grant.access_token)?;
    store.set_user(&identity)?;
    info!(user_id = identity.id, username = %identity.username, "signed in");

    Ok(identity)
}

/// Creates an account. Nothing is stored; the learner signs in afterwards.
pub async fn register<A: AccountApi>(
    api: &A,
    username: &str,
    password: &str,
    account_type: AccountType,
    teacher_id: Option<&str>,
) -> Result<String, AuthError> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::validation("username and password are required").into());
    }
    let teacher_id = match account_type {
        AccountType::Student => teacher_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        AccountType::Teacher => None,
    };

    let request = RegisterRequest {
        username: username.to_string(),
        password: password.to_string(),
        account_type,
        teacher_id,
    };
    let message = api.register(&request).await?;
    info!(username, account_type = account_type.as_str(), "account registered");

    Ok(message)
}

/// Clears identity and token and shows the landing screen.
pub fn logout(store: &ClientStore, router: &ScreenRouter) -> StoreResult<()> {
    store.clear_identity()?;
    router.show(Screen::Landing);
    info!("signed out");
    Ok(())
}

pub fn restore_identity(store: &ClientStore) -> Option<UserIdentity> {
    store.user()
}
