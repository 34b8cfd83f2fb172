//! User profile and auth session persistence.

use serde::{Deserialize, Serialize};

use crate::prefs::{keys, PrefsStore};

/// Failure to rebuild session state from the local store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No profile is cached locally; the caller should re-authenticate.
    #[error("user details are not present in the local store")]
    DetailsNotPresent,
}

/// Profile keys cleared on logout. The presence flag is handled separately.
const PROFILE_KEYS: [&str; 15] = [
    keys::USER_ID,
    keys::FIRST_NAME,
    keys::LAST_NAME,
    keys::IS_ALUMNUS,
    keys::IS_ADMIN,
    keys::ADMISSION_YEAR,
    keys::DEPT_NAME,
    keys::EMAIL,
    keys::UNIV_ROLL,
    keys::PASSOUT_YEAR,
    keys::GCM_REG_ID,
    keys::IS_VERIFIED,
    keys::URL,
    keys::GOOGLE_SUB,
    keys::CURRENT_SEM,
];

/// The signed-in user's attribute set, as returned by the server.
///
/// Every field defaults when the server omits it, so a sparse response
/// still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Server-side user ID.
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Whether the user has graduated.
    #[serde(default)]
    pub is_alumnus: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub admission_year: i32,
    #[serde(default)]
    pub department_name: String,
    #[serde(default)]
    pub email_address: String,
    /// University-wide roll number.
    #[serde(default)]
    pub univ_roll: String,
    #[serde(default)]
    pub passout_year: i32,
    /// Push registration ID, set once the device registers for notifications.
    #[serde(default)]
    pub gcm_reg_id: String,
    #[serde(default)]
    pub is_verified: bool,
    /// Profile picture URL.
    #[serde(default)]
    pub url: String,
    /// Subject claim from the external identity provider.
    #[serde(default)]
    pub google_sub: String,
    #[serde(default)]
    pub current_semester: i32,
}

impl UserProfile {
    /// Rebuild the cached profile from the preference store.
    ///
    /// Fails with [`SessionError::DetailsNotPresent`] when the presence
    /// flag is false or unset, regardless of any other stored fields.
    /// Individual fields fall back to empty / zero / false.
    pub fn load(prefs: &PrefsStore) -> Result<Self, SessionError> {
        if !prefs.get_bool(keys::IS_USER_DETAILS_PRESENT, false) {
            return Err(SessionError::DetailsNotPresent);
        }

        Ok(Self {
            id: prefs.get_i64(keys::USER_ID, 0),
            first_name: prefs.get_string(keys::FIRST_NAME, ""),
            last_name: prefs.get_string(keys::LAST_NAME, ""),
            is_alumnus: prefs.get_bool(keys::IS_ALUMNUS, false),
            is_admin: prefs.get_bool(keys::IS_ADMIN, false),
            admission_year: prefs.get_i32(keys::ADMISSION_YEAR, 0),
            department_name: prefs.get_string(keys::DEPT_NAME, ""),
            email_address: prefs.get_string(keys::EMAIL, ""),
            univ_roll: prefs.get_string(keys::UNIV_ROLL, ""),
            passout_year: prefs.get_i32(keys::PASSOUT_YEAR, 0),
            gcm_reg_id: prefs.get_string(keys::GCM_REG_ID, ""),
            is_verified: prefs.get_bool(keys::IS_VERIFIED, false),
            url: prefs.get_string(keys::URL, ""),
            google_sub: prefs.get_string(keys::GOOGLE_SUB, ""),
            current_semester: prefs.get_i32(keys::CURRENT_SEM, 0),
        })
    }

    /// Write every field as a single batch, then mark details present.
    pub fn save(&self, prefs: &PrefsStore) -> anyhow::Result<()> {
        let mut batch = prefs.batch()?;
        batch
            .put_i64(keys::USER_ID, self.id)
            .put_string(keys::FIRST_NAME, &self.first_name)
            .put_string(keys::LAST_NAME, &self.last_name)
            .put_bool(keys::IS_ALUMNUS, self.is_alumnus)
            .put_bool(keys::IS_ADMIN, self.is_admin)
            .put_i32(keys::ADMISSION_YEAR, self.admission_year)
            .put_string(keys::DEPT_NAME, &self.department_name)
            .put_string(keys::EMAIL, &self.email_address)
            .put_string(keys::UNIV_ROLL, &self.univ_roll)
            .put_i32(keys::PASSOUT_YEAR, self.passout_year)
            .put_string(keys::GCM_REG_ID, &self.gcm_reg_id)
            .put_bool(keys::IS_VERIFIED, self.is_verified)
            .put_string(keys::URL, &self.url)
            .put_string(keys::GOOGLE_SUB, &self.google_sub)
            .put_i32(keys::CURRENT_SEM, self.current_semester)
            .put_bool(keys::IS_USER_DETAILS_PRESENT, true);
        batch.commit()
    }

    /// Drop the cached profile and unset the presence flag.
    pub fn clear(prefs: &PrefsStore) -> anyhow::Result<()> {
        let mut batch = prefs.batch()?;
        for key in PROFILE_KEYS {
            batch.remove(key);
        }
        batch.put_bool(keys::IS_USER_DETAILS_PRESENT, false);
        batch.commit()
    }

    /// "First Last" with either part omitted when empty.
    pub fn display_name(&self) -> String {
        [self.first_name.as_str(), self.last_name.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An active login: the bearer token plus the logged-in flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
}

impl AuthSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The stored session, or `None` when logged out or the token is empty.
    pub fn load(prefs: &PrefsStore) -> Option<Self> {
        if !prefs.get_bool(keys::IS_LOGGED_IN, false) {
            return None;
        }
        let token = prefs.get_string(keys::AUTH_TOKEN, "");
        if token.is_empty() {
            return None;
        }
        Some(Self { token })
    }

    /// Persist the token and set the logged-in flag, atomically.
    pub fn persist(&self, prefs: &PrefsStore) -> anyhow::Result<()> {
        let mut batch = prefs.batch()?;
        batch
            .put_string(keys::AUTH_TOKEN, &self.token)
            .put_bool(keys::IS_LOGGED_IN, true);
        batch.commit()
    }

    /// Drop the token and unset the logged-in flag.
    pub fn clear(prefs: &PrefsStore) -> anyhow::Result<()> {
        let mut batch = prefs.batch()?;
        batch
            .remove(keys::AUTH_TOKEN)
            .put_bool(keys::IS_LOGGED_IN, false);
        batch.commit()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
