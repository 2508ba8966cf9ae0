//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Shipping carriers supported by the storefront
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryProvider {
    Yalidine,
    #[serde(rename = "zrexpress")]
    ZrExpress,
}

impl DeliveryProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryProvider::Yalidine => "yalidine",
            DeliveryProvider::ZrExpress => "zrexpress",
        }
    }
}

impl std::str::FromStr for DeliveryProvider {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yalidine" => Ok(DeliveryProvider::Yalidine),
            "zrexpress" => Ok(DeliveryProvider::ZrExpress),
            _ => Err("Unknown delivery provider"),
        }
    }
}

impl std::fmt::Display for DeliveryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the parcel reaches the customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Door-to-door delivery
    #[default]
    Home,
    /// Customer collects at a carrier stop-desk
    PickupPoint,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Home => "home",
            DeliveryMode::PickupPoint => "pickup_point",
        }
    }
}

impl std::str::FromStr for DeliveryMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(DeliveryMode::Home),
            "pickup_point" => Ok(DeliveryMode::PickupPoint),
            _ => Err("Unknown delivery mode"),
        }
    }
}
