use serde::Serialize;
use tracing::{info, instrument, warn};

use super::invalid;
use crate::app_system::MarketSystem;
use crate::domain::{Client, ProfileForm};
use crate::error::AppResult;
use crate::session::{CurrentUser, UserKind};

#[derive(Debug, Clone)]
pub enum Credentials {
    Client { phone: String },
    Maalem { phone: String },
    Admin { username: String, password: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct WhoAmI {
    #[serde(rename = "type")]
    pub kind: UserKind,
    pub id: u64,
    pub name: Option<String>,
}

/// Fields to change on the client's profile; unset fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

#[instrument(skip(system, credentials))]
pub async fn login(system: &mut MarketSystem, credentials: Credentials) -> AppResult<WhoAmI> {
    let whoami = match credentials {
        Credentials::Client { phone } => {
            let client = system.api.login_client(&phone).await?;
            WhoAmI { kind: UserKind::Client, id: client.id, name: Some(client.full_name()) }
        }
        Credentials::Maalem { phone } => {
            let maalem = system.api.login_maalem(&phone).await?;
            WhoAmI { kind: UserKind::Maalem, id: maalem.id, name: Some(maalem.full_name()) }
        }
        Credentials::Admin { username, password } => {
            let admin = system.api.login_admin(&username, &password).await?;
            WhoAmI { kind: UserKind::Admin, id: admin.id, name: admin.username }
        }
    };
    system
        .session
        .login(CurrentUser { kind: whoami.kind, id: whoami.id })
        .await?;
    Ok(whoami)
}

pub async fn logout(system: &mut MarketSystem) -> AppResult<()> {
    system.session.logout().await?;
    Ok(())
}

/// The logged-in user with their display name, when the backend still has
/// their profile.
pub async fn whoami(system: &MarketSystem) -> AppResult<Option<WhoAmI>> {
    let Some(user) = system.session.current() else {
        return Ok(None);
    };
    let profile = match user.kind {
        UserKind::Client => Some(system.api.get_client(user.id).await.map(|c| c.full_name())),
        UserKind::Maalem => Some(system.api.get_maalem(user.id).await.map(|m| m.full_name())),
        UserKind::Admin => None,
    };
    let name = match profile {
        Some(Ok(name)) => Some(name),
        Some(Err(e)) => {
            warn!(kind = %user.kind, id = user.id, error = %e, "Profile lookup failed; showing the user without a name");
            None
        }
        None => None,
    };
    Ok(Some(WhoAmI { kind: user.kind, id: user.id, name }))
}

/// Creates the profile and logs in as it.
#[instrument(skip(system, form))]
pub async fn register(system: &mut MarketSystem, kind: UserKind, form: ProfileForm) -> AppResult<WhoAmI> {
    form.validate().map_err(invalid)?;
    let (id, name) = match kind {
        UserKind::Client => {
            let client = system.api.register_client(&form).await?;
            (client.id, client.full_name())
        }
        UserKind::Maalem => {
            let maalem = system.api.register_maalem(&form).await?;
            (maalem.id, maalem.full_name())
        }
        UserKind::Admin => return Err(invalid("admin accounts cannot be registered here")),
    };
    info!(kind = %kind, id, "Registered");
    system.session.login(CurrentUser { kind, id }).await?;
    Ok(WhoAmI { kind, id, name: Some(name) })
}

/// Client profiles are replaced whole, so unchanged fields are sent back as
/// the backend last had them.
#[instrument(skip(system, changes))]
pub async fn update_profile(system: &MarketSystem, changes: ProfileChanges) -> AppResult<Client> {
    let id = system.session.require(UserKind::Client)?;
    let current = system.api.get_client(id).await?;

    let mut form = ProfileForm::from(&current);
    if let Some(v) = changes.firstname {
        form.firstname = v;
    }
    if let Some(v) = changes.lastname {
        form.lastname = v;
    }
    if let Some(v) = changes.address {
        form.address = v;
    }
    if let Some(v) = changes.phone_number {
        form.phone_number = v;
    }
    form.validate().map_err(invalid)?;

    Ok(system.api.update_client(id, &form).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, SessionError};
    use crate::mock_framework::MockBackend;
    use crate::session::Session;
    use crate::views::testing::system_for;
    use serde_json::json;

    fn client_json(address: &str) -> serde_json::Value {
        json!({ "client_id": 5, "firstname": "Sara", "lastname": "Idrissi", "address": address, "phoneNumber": "0611223344" })
    }

    #[tokio::test]
    async fn login_writes_session_file() {
        let backend = MockBackend::start().await;
        backend.route("GET", "users/client/login/0611223344/", 200, client_json("Rabat"));
        let (mut system, _, _dir) = system_for(&backend, None).await;

        let who = login(&mut system, Credentials::Client { phone: "0611223344".into() }).await.unwrap();
        assert_eq!(who.id, 5);

        let restored = Session::restore(system.session.path()).await;
        assert_eq!(restored.current(), Some(CurrentUser { kind: UserKind::Client, id: 5 }));
    }

    #[tokio::test]
    async fn failed_login_keeps_logged_out() {
        let backend = MockBackend::start().await;
        backend.route("GET", "users/maalem/login/1/", 404, json!({ "error": "Maalem with provided phone number doesn`t exist" }));
        let (mut system, _, _dir) = system_for(&backend, None).await;

        let err = login(&mut system, Credentials::Maalem { phone: "1".into() }).await.unwrap_err();
        assert!(matches!(err, AppError::Api(_)));
        assert_eq!(system.session.current(), None);
    }

    #[tokio::test]
    async fn whoami_survives_a_failed_profile_lookup() {
        let backend = MockBackend::start().await;
        backend.route("GET", "users/client/5/", 500, json!({ "detail": "database is locked" }));
        let (system, _, _dir) = system_for(&backend, Some((UserKind::Client, 5))).await;

        let who = whoami(&system).await.unwrap().unwrap();
        assert_eq!((who.kind, who.id, who.name), (UserKind::Client, 5, None));
        assert_eq!(backend.requests_to("GET", "users/client/5/").len(), 1);

        backend.route("GET", "users/client/5/", 200, client_json("Rabat"));
        let who = whoami(&system).await.unwrap().unwrap();
        assert_eq!(who.name.as_deref(), Some("Sara Idrissi"));
    }

    #[tokio::test]
    async fn profile_update_sends_merged_form() {
        let backend = MockBackend::start().await;
        backend.route("GET", "users/client/5/", 200, client_json("Rabat"));
        backend.route("PUT", "users/client/update/5/", 200, client_json("Tanger"));
        let (system, _, _dir) = system_for(&backend, Some((UserKind::Client, 5))).await;

        let changes = ProfileChanges { address: Some("Tanger".into()), ..ProfileChanges::default() };
        let updated = update_profile(&system, changes).await.unwrap();
        assert_eq!(updated.address, "Tanger");
        assert_eq!(
            backend.requests_to("PUT", "users/client/update/5/")[0].body,
            Some(json!({ "firstname": "Sara", "lastname": "Idrissi", "address": "Tanger", "phoneNumber": "0611223344" }))
        );
    }

    #[tokio::test]
    async fn maalem_cannot_edit_client_profile() {
        let backend = MockBackend::start().await;
        let (system, _, _dir) = system_for(&backend, Some((UserKind::Maalem, 2))).await;

        let err = update_profile(&system, ProfileChanges::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Session(SessionError::WrongRole { .. })));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn invalid_registration_never_reaches_backend() {
        let backend = MockBackend::start().await;
        let (mut system, _, _dir) = system_for(&backend, None).await;
        let form = ProfileForm {
            firstname: "Omar".into(),
            lastname: String::new(),
            address: "Fes".into(),
            phone_number: "0700".into(),
        };

        let err = register(&mut system, UserKind::Maalem, form).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(backend.requests().is_empty());
    }
}
