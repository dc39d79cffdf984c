use tracing::{debug, instrument};

use super::ApiClient;
use crate::domain::{Admin, AdminLogin, Client, Maalem, ProfileForm};
use crate::error::ApiError;
use crate::ingest::decode_one;

crate::impl_resource_reads!(Client, client, list: "users/client/", get: "users/client/{}/");
crate::impl_resource_reads!(Maalem, maalem, list: "users/maalem/", get: "users/maalem/{}/");

impl ApiClient {
    /// Phone-number login. The backend answers 404 for unknown numbers.
    #[instrument(skip(self))]
    pub async fn login_client(&self, phone: &str) -> Result<Client, ApiError> {
        debug!("Sending request");
        self.get_one(&format!("users/client/login/{}/", phone.trim())).await
    }

    #[instrument(skip(self))]
    pub async fn login_maalem(&self, phone: &str) -> Result<Maalem, ApiError> {
        debug!("Sending request");
        self.get_one(&format!("users/maalem/login/{}/", phone.trim())).await
    }

    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login_admin(&self, username: &str, password: &str) -> Result<Admin, ApiError> {
        debug!("Sending request");
        let body = AdminLogin { username: username.to_string(), password: password.to_string() };
        decode_one(self.post_json("users/admin-secret-path-login/", &body).await?)
    }

    #[instrument(skip(self, form))]
    pub async fn register_client(&self, form: &ProfileForm) -> Result<Client, ApiError> {
        debug!("Sending request");
        decode_one(self.post_json("users/client/post/", form).await?)
    }

    #[instrument(skip(self, form))]
    pub async fn register_maalem(&self, form: &ProfileForm) -> Result<Maalem, ApiError> {
        debug!("Sending request");
        decode_one(self.post_json("users/maalem/post/", form).await?)
    }

    /// Full replacement of a client profile.
    #[instrument(skip(self, form))]
    pub async fn update_client(&self, id: u64, form: &ProfileForm) -> Result<Client, ApiError> {
        debug!("Sending request");
        decode_one(self.put_json(&format!("users/client/update/{id}/"), form).await?)
    }
}
