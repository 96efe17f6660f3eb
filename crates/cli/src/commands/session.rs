//! Login, registration and logout.

use order_portal_client::{ApiError, Credentials, PortalClient, Registration};
use order_portal_core::{Email, Phone};
use secrecy::SecretString;

use super::InputError;

/// Log in and show who we are.
pub async fn login(
    client: &PortalClient,
    username: String,
    password: SecretString,
) -> Result<(), ApiError> {
    client
        .auth()
        .login(&Credentials { username, password })
        .await?;

    match client.profile().current() {
        Some(profile) => tracing::info!("Logged in as {}", profile.display_name()),
        None => tracing::info!("Logged in (profile unavailable)"),
    }
    Ok(())
}

/// Create an account.
pub async fn register(
    client: &PortalClient,
    username: String,
    password: SecretString,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut registration = Registration::new(Credentials { username, password });
    registration.email = email.map(Email::parse).transpose().map_err(InputError::from)?;
    registration.phone = phone
        .map(Phone::parse_lenient)
        .transpose()
        .map_err(InputError::from)?;

    client.auth().register(&registration).await?;
    tracing::info!("Account created, you are logged in");
    Ok(())
}

/// Forget the stored session.
pub fn logout(client: &PortalClient) {
    client.logout();
}
