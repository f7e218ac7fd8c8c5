use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of content held by the backend, as it appears in backend URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Posts,
    Videos,
}

impl ItemType {
    pub const ALL: [ItemType; 2] = [ItemType::Posts, ItemType::Videos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Videos => "videos",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(Self::Posts),
            "videos" => Ok(Self::Videos),
            _ => Err(()),
        }
    }
}

/// One row of a backend listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_round_trips_through_path_segment() {
        for item_type in ItemType::ALL {
            assert_eq!(item_type.as_str().parse::<ItemType>(), Ok(item_type));
        }
        assert!("products".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_summary_tolerates_missing_optional_fields() {
        let row: ContentSummary =
            serde_json::from_str(r#"{"id": 4, "title": "Ridge loop"}"#).unwrap();
        assert_eq!(row.id, 4);
        assert!(row.category_id.is_none());
        assert!(row.status.is_none());
    }
}
