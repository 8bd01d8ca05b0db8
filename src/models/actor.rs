use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Rider,
    Driver,
    Admin,
}

/// The authenticated party behind a request, passed explicitly into every
/// lifecycle call. There is no ambient session state in the core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Actor {
    pub role: ActorRole,
    pub id: Uuid,
}
