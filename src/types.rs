use std::fmt;
use std::str::FromStr;

/// Asset category a changed file is classified into.
///
/// The declaration order is the classification priority: a file is checked
/// against `Less` suffixes first, then `Css`, `Js` and finally `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetKind {
    Less,
    Css,
    Js,
    Other,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Less,
        AssetKind::Css,
        AssetKind::Js,
        AssetKind::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Less => "less",
            AssetKind::Css => "css",
            AssetKind::Js => "js",
            AssetKind::Other => "other",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "less" => Ok(AssetKind::Less),
            "css" => Ok(AssetKind::Css),
            "js" => Ok(AssetKind::Js),
            "other" => Ok(AssetKind::Other),
            other => Err(format!(
                "invalid asset kind: {other} (expected \"less\", \"css\", \"js\" or \"other\")"
            )),
        }
    }
}

/// What happened to the file that produced a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    Saved,
    Added,
    Renamed,
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeReason::Saved => "saved",
            ChangeReason::Added => "added",
            ChangeReason::Renamed => "renamed",
        };
        f.write_str(s)
    }
}
