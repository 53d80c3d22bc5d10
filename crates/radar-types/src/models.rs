use serde::{Deserialize, Serialize};

/// The two profile kinds. Points, levels and badges are tracked per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Fan,
    Artist,
}

impl ProfileKind {
    pub fn from_is_artist(is_artist: bool) -> Self {
        if is_artist { Self::Artist } else { Self::Fan }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fan => "fan",
            Self::Artist => "artist",
        }
    }

    /// Column on `users` holding this kind's point counter.
    pub fn points_column(self) -> &'static str {
        match self {
            Self::Fan => "fan_points",
            Self::Artist => "artist_points",
        }
    }

    /// Column on `users` holding this kind's current level id.
    pub fn level_column(self) -> &'static str {
        match self {
            Self::Fan => "fan_level_id",
            Self::Artist => "artist_level_id",
        }
    }
}

impl std::str::FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fan" => Ok(Self::Fan),
            "artist" => Ok(Self::Artist),
            other => Err(format!("unknown profile kind '{}'", other)),
        }
    }
}

/// A user's reaction to a board post. Stored as +1 / -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn value(self) -> i64 {
        match self {
            Self::Like => 1,
            Self::Dislike => -1,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Like),
            -1 => Some(Self::Dislike),
            _ => None,
        }
    }
}
