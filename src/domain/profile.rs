use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire;

/// Buyer profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: u64,
    pub firstname: String,
    pub lastname: String,
    #[serde(default, with = "wire::timestamp")]
    pub date_joined: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "phoneNumber", default)]
    pub phone_number: String,
}

/// Artisan profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maalem {
    pub id: u64,
    pub firstname: String,
    pub lastname: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default = "managed_by_default")]
    pub is_managed_by_admin: bool,
    #[serde(rename = "phoneNumber", default)]
    pub phone_number: String,
}

fn managed_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

impl Maalem {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Registration and full-replacement body shared by both profile kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileForm {
    pub firstname: String,
    pub lastname: String,
    pub address: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("address", &self.address),
            ("phone number", &self.phone_number),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{name} is required"));
            }
        }
        if !self
            .phone_number
            .chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c == ' ')
        {
            return Err(format!("invalid phone number {:?}", self.phone_number));
        }
        Ok(())
    }
}

impl From<&Client> for ProfileForm {
    fn from(client: &Client) -> Self {
        Self {
            firstname: client.firstname.clone(),
            lastname: client.lastname.clone(),
            address: client.address.clone(),
            phone_number: client.phone_number.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}
