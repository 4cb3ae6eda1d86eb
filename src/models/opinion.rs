use crate::error::{AppError, Result};
use crate::models::user_agent::parse_user_agent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// A single piece of submitted feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    /// Primary key
    pub id: u64,

    /// Praise, issue or suggestion
    #[serde(rename = "type")]
    pub opinion_type: OpinionType,

    /// Free-text body
    pub description: String,

    /// Page the user was on, if they chose to share it
    #[serde(default)]
    pub url: Option<String>,

    /// Raw User-Agent header of the submitting browser
    pub user_agent: String,

    /// Detected locale (e.g. "en-US", "de", "unknown")
    pub locale: String,

    /// Device manufacturer (mobile only)
    #[serde(default)]
    pub manufacturer: String,

    /// Device model (mobile only)
    #[serde(default)]
    pub device: String,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Product derived from the user agent
    pub product: Product,

    /// Product version derived from the user agent
    pub version: String,

    /// Operating system derived from the user agent
    pub os: String,
}

impl Opinion {
    /// Create an opinion, deriving product, version and OS from the user agent.
    ///
    /// Fails with a validation error when the user agent is not one we accept
    /// feedback from.
    pub fn new(
        id: u64,
        opinion_type: OpinionType,
        description: impl Into<String>,
        user_agent: impl Into<String>,
        locale: impl Into<String>,
    ) -> Result<Self> {
        let user_agent = user_agent.into();
        let info = parse_user_agent(&user_agent).ok_or_else(|| {
            AppError::Validation(format!("unsupported user agent: {user_agent:?}"))
        })?;

        Ok(Self {
            id,
            opinion_type,
            description: description.into(),
            url: None,
            user_agent,
            locale: locale.into(),
            manufacturer: String::new(),
            device: String::new(),
            created: Utc::now(),
            product: info.product,
            version: info.version,
            os: info.os,
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.url = if url.is_empty() { None } else { Some(url) };
        self
    }

    pub fn with_device(mut self, manufacturer: impl Into<String>, device: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self.device = device.into();
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }
}

/// Kind of opinion
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OpinionType {
    Praise,
    Issue,
    Suggestion,
}

impl OpinionType {
    /// Numeric code stored in the index
    pub fn code(self) -> u64 {
        match self {
            OpinionType::Praise => 1,
            OpinionType::Issue => 2,
            OpinionType::Suggestion => 3,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        OpinionType::iter().find(|t| t.code() == code)
    }

    /// Parse a request parameter, accepting either the name or the numeric code.
    pub fn from_param(value: &str) -> Option<Self> {
        let value = value.trim();
        value
            .parse::<OpinionType>()
            .ok()
            .or_else(|| value.parse::<u64>().ok().and_then(Self::from_code))
    }
}

/// Product an opinion was submitted for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Product {
    Firefox,
    Mobile,
}

impl Product {
    pub fn id(self) -> u64 {
        match self {
            Product::Firefox => 1,
            Product::Mobile => 2,
        }
    }

    pub fn from_id(id: u64) -> Option<Self> {
        Product::iter().find(|p| p.id() == id)
    }

    /// URL-safe short name
    pub fn short_name(self) -> &'static str {
        match self {
            Product::Firefox => "firefox",
            Product::Mobile => "mobile",
        }
    }

    /// Human-readable name used in titles
    pub fn pretty_name(self) -> &'static str {
        match self {
            Product::Firefox => "Firefox",
            Product::Mobile => "Mobile",
        }
    }

    /// Parse a request parameter: short name or numeric id.
    pub fn from_param(value: &str) -> Option<Self> {
        let value = value.trim();
        value
            .parse::<Product>()
            .ok()
            .or_else(|| value.parse::<u64>().ok().and_then(Self::from_id))
    }
}
