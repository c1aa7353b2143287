use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerView {
    Files,
    Recent,
    Favorites,
}

impl std::fmt::Display for PickerView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Files => write!(f, "files"),
            Self::Recent => write!(f, "recent"),
            Self::Favorites => write!(f, "favorites"),
        }
    }
}

impl std::str::FromStr for PickerView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files" => Ok(Self::Files),
            "recent" => Ok(Self::Recent),
            "favorites" => Ok(Self::Favorites),
            _ => Err(format!("unknown picker view: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Size,
    Mtime,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "basename" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            "mtime" => Ok(Self::Mtime),
            _ => Err(format!("unknown sort key: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
    None,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            "none" => Ok(Self::None),
            _ => Err(format!("unknown sort order: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    pub sort_by: SortKey,
    pub order: SortOrder,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            sort_by: SortKey::Name,
            order: SortOrder::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    pub show_hidden: bool,
    pub mime_filter: Vec<String>,
    pub text_filter: String,
    pub allow_directory_selection: bool,
    pub sort: SortConfig,
    pub sort_folders_first: bool,
    pub sort_favorites_first: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            show_hidden: false,
            mime_filter: Vec::new(),
            text_filter: String::new(),
            allow_directory_selection: false,
            sort: SortConfig::default(),
            sort_folders_first: true,
            sort_favorites_first: true,
        }
    }
}
