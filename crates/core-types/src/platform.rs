use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target platforms the façade knows how to reach.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    LinkedIn,
    Reddit,
    Email,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unsupported platform: {0}")]
pub struct UnknownPlatform(pub String);

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::LinkedIn, Platform::Reddit, Platform::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::Reddit => "reddit",
            Platform::Email => "email",
        }
    }

    /// Human-facing spelling used in result messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Reddit => "Reddit",
            Platform::Email => "Email",
        }
    }

    /// Email never goes through a browser session.
    pub fn supports_browser(&self) -> bool {
        !matches!(self, Platform::Email)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Ok(Platform::LinkedIn),
            "reddit" => Ok(Platform::Reddit),
            "email" => Ok(Platform::Email),
            _ => Err(UnknownPlatform(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("LinkedIn".parse::<Platform>(), Ok(Platform::LinkedIn));
        assert_eq!(" REDDIT ".parse::<Platform>(), Ok(Platform::Reddit));
        assert_eq!("eMail".parse::<Platform>(), Ok(Platform::Email));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "myspace".parse::<Platform>().unwrap_err();
        assert_eq!(err, UnknownPlatform("myspace".into()));
        assert!("".parse::<Platform>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        for platform in Platform::ALL {
            assert_eq!(platform.to_string().parse::<Platform>(), Ok(platform));
        }
    }
}
