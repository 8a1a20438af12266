//! Message shapes exchanged with the randomizer service client. The packet
//! names follow the service's command names so they serialise the same way
//! the client library reports them.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub slot: u32,
    #[serde(default)]
    pub name: String,
}

/// An item delivered by the service. Immutable once received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedItem {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sender: PlayerRef,
    #[serde(default)]
    pub receiver: PlayerRef,
}

impl ReceivedItem {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            name: String::new(),
            sender: PlayerRef::default(),
            receiver: PlayerRef::default(),
        }
    }

    pub fn from_player(mut self, slot: u32, name: &str) -> Self {
        self.sender = PlayerRef {
            slot,
            name: name.to_string(),
        };
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlayer {
    pub slot: u32,
    pub name: String,
    #[serde(default)]
    pub game: String,
    #[serde(default)]
    pub alias: String,
}

/// Per-slot options the service hands over on connect.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotOptions {
    #[serde(rename = "DeathLink", default)]
    pub death_link: u32,
    #[serde(rename = "DeathLink_Amnesty", default)]
    pub death_link_amnesty: u32,
    #[serde(rename = "MedalHunt", default)]
    pub medal_hunt: u32,
    #[serde(rename = "ExtraCheckpoint", default)]
    pub extra_checkpoint: u32,
    #[serde(rename = "ExtraChecks", default)]
    pub extra_checks: u32,
    #[serde(default)]
    pub dexsanity: bool,
    #[serde(default)]
    pub exp_multiplier: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum ServerEvent {
    Connected {
        slot: u32,
        #[serde(default)]
        players: Vec<NetworkPlayer>,
        #[serde(default)]
        slot_data: SlotOptions,
    },
    ReceivedItems {
        index: u64,
        items: Vec<ReceivedItem>,
    },
    Print {
        text: String,
    },
    Disconnected,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ClientStatus {
    Unknown,
    Connected,
    Ready,
    Playing,
    Goal,
}

impl From<ClientStatus> for u8 {
    fn from(status: ClientStatus) -> u8 {
        match status {
            ClientStatus::Unknown => 0,
            ClientStatus::Connected => 5,
            ClientStatus::Ready => 10,
            ClientStatus::Playing => 20,
            ClientStatus::Goal => 30,
        }
    }
}

impl TryFrom<u8> for ClientStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ClientStatus::Unknown),
            5 => Ok(ClientStatus::Connected),
            10 => Ok(ClientStatus::Ready),
            20 => Ok(ClientStatus::Playing),
            30 => Ok(ClientStatus::Goal),
            other => Err(format!("unknown client status {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum ClientPacket {
    Sync,
    LocationChecks { locations: Vec<i64> },
    StatusUpdate { status: ClientStatus },
}

/// Everything the client adapter needs to open a slot connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub server_url: String,
    pub game: String,
    pub player_name: String,
    pub password: Option<String>,
    pub items_handling: u8,
}
