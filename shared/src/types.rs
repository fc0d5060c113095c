use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One game server as announced to the list service.
/// This is the canonical record used by the list payload, filter and renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Host name or literal IP address
    pub address: String,

    /// Game port
    #[serde(default)]
    pub port: u16,

    /// Lowest protocol version the server accepts
    #[serde(rename = "proto_min", default)]
    pub protocol_min: u32,

    /// Highest protocol version the server accepts
    #[serde(rename = "proto_max", default)]
    pub protocol_max: u32,

    #[serde(default)]
    pub clients: u32,
    #[serde(default)]
    pub clients_max: u32,
    #[serde(default)]
    pub clients_top: u32,

    /// Population average
    #[serde(default)]
    pub pop_v: f64,

    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub gameid: String,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub mapgen: Option<String>,

    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub mods: Vec<String>,

    /// Default privileges granted to new players, free text
    #[serde(rename = "privs", default, deserialize_with = "non_empty_string")]
    pub privileges: Option<String>,

    #[serde(default)]
    pub creative: bool,
    #[serde(default)]
    pub damage: bool,
    #[serde(default)]
    pub pvp: bool,
    #[serde(default)]
    pub password: bool,
    #[serde(default)]
    pub rollback: bool,
    #[serde(default)]
    pub can_see_far_names: bool,
    #[serde(default)]
    pub dedicated: bool,

    /// Seconds since the server started; `None` when the payload value is not a number
    #[serde(default, deserialize_with = "lenient_number")]
    pub uptime: Option<f64>,

    /// In-game age of the world in seconds
    #[serde(default, deserialize_with = "lenient_number")]
    pub game_time: Option<f64>,

    /// Round trip time measured by the list service, in seconds
    #[serde(default, deserialize_with = "lenient_number")]
    pub ping: Option<f64>,

    /// Server step lag in seconds
    #[serde(default, deserialize_with = "lenient_number")]
    pub lag: Option<f64>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub clients_list: Vec<String>,

    /// Two letter continent code resolved by the list service
    #[serde(default, deserialize_with = "non_empty_string")]
    pub geo_continent: Option<String>,
}

/// Player and server counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(default)]
    pub clients: u64,
    #[serde(default)]
    pub servers: u64,
}

/// The complete payload of one successful list fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub list: Vec<ServerRecord>,

    #[serde(default)]
    pub total: Totals,

    /// All-time maxima reported by the list service
    #[serde(default)]
    pub total_max: Totals,

    /// When this payload was decoded; not part of the wire format
    #[serde(skip, default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            list: Vec::new(),
            total: Totals::default(),
            total_max: Totals::default(),
            fetched_at: Utc::now(),
        }
    }
}

/// Inclusive protocol version range selected in the page filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct ProtoRange {
    pub low: u32,
    pub high: u32,
}

impl ProtoRange {
    /// True when `[protocol_min, protocol_max]` overlaps this range.
    pub fn overlaps(&self, protocol_min: u32, protocol_max: u32) -> bool {
        !(self.low > protocol_max || self.high < protocol_min)
    }
}

impl From<[u32; 2]> for ProtoRange {
    fn from([low, high]: [u32; 2]) -> Self {
        Self { low, high }
    }
}

impl From<ProtoRange> for [u32; 2] {
    fn from(range: ProtoRange) -> Self {
        [range.low, range.high]
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
