//! Who a session is: fixed login identity plus mutable presentation.

use std::sync::{PoisonError, RwLock};

use vw_rs_proto::packets::{LoginPacket, Skin};
use vw_rs_proto::types::Uuid;

/// Login details of a session. Name, uuid, xuid, client id and locale are fixed
/// at login; display name and skin may change while connected.
pub struct Identity {
    /// Login name. Unique across the registry and never changed after login.
    name: String,
    display_name: RwLock<String>,
    uuid: Uuid,
    xuid: String,
    client_id: i64,
    locale: String,
    skin: RwLock<Skin>,
}

impl Identity {
    /// Display name starts out equal to the login name.
    pub fn from_login(login: &LoginPacket) -> Self {
        Self {
            name: login.username.clone(),
            display_name: RwLock::new(login.username.clone()),
            uuid: login.client_uuid,
            xuid: login.client_xuid.clone(),
            client_id: login.client_id,
            locale: login.language.clone(),
            skin: RwLock::new(Skin {
                skin_id: login.skin_id.clone(),
                skin_data: login.skin_data.clone(),
                cape_data: login.cape_data.clone(),
                geometry_name: login.geometry_name.clone(),
                geometry_data: login.geometry_data.clone(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> String {
        self.display_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_display_name(&self, name: impl Into<String>) {
        *self
            .display_name
            .write()
            .unwrap_or_else(PoisonError::into_inner) = name.into();
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn xuid(&self) -> &str {
        &self.xuid
    }

    pub fn client_id(&self) -> i64 {
        self.client_id
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn skin(&self) -> Skin {
        self.skin
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_skin(&self, skin: Skin) {
        *self.skin.write().unwrap_or_else(PoisonError::into_inner) = skin;
    }
}
