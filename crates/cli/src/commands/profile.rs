//! Profile display and editing.

use order_portal_client::PortalClient;
use order_portal_core::{Email, Phone, Profile, parse_full_name};

use super::InputError;

/// Requested profile edits; `None` leaves a field as it is.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ProfileChanges {
    const fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.address.is_none()
            && self.phone.is_none()
            && self.email.is_none()
    }

    /// Validate and apply onto `profile`.
    fn apply(self, profile: &mut Profile) -> Result<(), InputError> {
        if let Some(full_name) = self.full_name {
            profile.name_parts = parse_full_name(&full_name);
        }
        if let Some(address) = self.address {
            profile.address = address;
        }
        if let Some(phone) = self.phone {
            profile.phone = Phone::parse_lenient(&phone)?.as_str().to_owned();
        }
        if let Some(email) = self.email {
            profile.email = Email::parse(&email)?.into_inner();
        }
        Ok(())
    }
}

fn print(profile: &Profile) {
    let name = &profile.name_parts;
    let address = &profile.address_parts;
    tracing::info!("Username:   {}", profile.username);
    tracing::info!("Name:       {} / {} / {}", name.last_name, name.first_name, name.patronymic);
    tracing::info!("Email:      {}", profile.email);
    tracing::info!("Phone:      {}", profile.phone);
    tracing::info!("Postal:     {}", address.postal_code);
    tracing::info!("Region:     {}", address.region);
    tracing::info!("City:       {}", address.city);
    tracing::info!("Street:     {}", address.street);
    tracing::info!("Building:   {}", address.building);
    tracing::info!("Apartment:  {}", address.apartment);
}

/// Fetch and show the profile.
pub async fn show(client: &PortalClient) -> Result<(), Box<dyn std::error::Error>> {
    if !client.session().is_authenticated() {
        return Err(InputError::NotLoggedIn.into());
    }
    let profile = client.profile().fetch().await?;
    print(&profile);
    Ok(())
}

/// Apply edits to the current profile and send it.
pub async fn update(
    client: &PortalClient,
    changes: ProfileChanges,
) -> Result<(), Box<dyn std::error::Error>> {
    if !client.session().is_authenticated() {
        return Err(InputError::NotLoggedIn.into());
    }
    if changes.is_empty() {
        return Err(InputError::NoChanges.into());
    }

    let mut profile = match client.profile().current() {
        Some(profile) => profile,
        None => client.profile().fetch().await?,
    };
    changes.apply(&mut profile)?;

    let updated = client.profile().update(profile).await?;
    print(&updated);
    Ok(())
}
