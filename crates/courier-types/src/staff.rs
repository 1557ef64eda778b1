use serde::{Deserialize, Serialize};

use crate::email::Participant;

/// Directory record for a member of staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffProfile {
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub profile_photo_url: String,
    #[serde(default)]
    pub status: String,
}

impl StaffProfile {
    /// Display identity for `address`, as it appears on an envelope
    pub fn to_participant(&self, address: &str) -> Participant {
        Participant {
            email: address.to_string(),
            full_name: self.full_name.clone(),
            profile_photo: self.profile_photo_url.clone(),
        }
    }
}
