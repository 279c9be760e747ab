//! Remote paths relative to the panel's file root.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel the panel uses for its file root.
pub const ROOT_SENTINEL: &str = ".";

/// A normalized path on the remote file tree.
///
/// The root is represented by the `.` sentinel; every other path is a
/// slash-joined relative path without a leading slash, empty segments or
/// `.` segments. `..` pops a segment and never climbs above the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath {
    segments: Vec<String>,
}

/// One breadcrumb entry: a path segment and the cumulative prefix it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub label: String,
    pub path: RemotePath,
}

impl RemotePath {
    /// The root of the remote tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse and normalize an operator-supplied path.
    pub fn parse(raw: &str) -> Self {
        let mut segments: Vec<String> = Vec::new();
        for segment in raw.trim().split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other.to_string()),
            }
        }
        Self { segments }
    }

    /// Check whether this is the root sentinel.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Number of segments (0 at root).
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Append an entry name verbatim as one segment.
    ///
    /// Listing names come from the server as-is: no trimming, no separator
    /// splitting, no `.`/`..` handling.
    pub fn child(&self, name: &str) -> Self {
        let mut child = self.clone();
        child.segments.push(name.to_string());
        child
    }

    /// Parent path, `None` at root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let mut parent = self.clone();
        parent.segments.pop();
        Some(parent)
    }

    /// The "up" target: last segment stripped, root if none remain.
    pub fn up(&self) -> Self {
        self.parent().unwrap_or_default()
    }

    /// Breadcrumb trail, one entry per segment.
    ///
    /// The trail is empty at root; otherwise joining the labels with `/`
    /// reconstructs the path exactly.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        (1..=self.segments.len())
            .map(|len| Breadcrumb {
                label: self.segments[len - 1].clone(),
                path: Self {
                    segments: self.segments[..len].to_vec(),
                },
            })
            .collect()
    }

    /// Check whether `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &RemotePath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Wire form: `.` at root, the joined segments otherwise.
    pub fn to_wire(&self) -> String {
        if self.is_root() {
            ROOT_SENTINEL.to_string()
        } else {
            self.segments.join("/")
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl From<&str> for RemotePath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for RemotePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for RemotePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(RemotePath::parse("/minecraft//plugins/").to_wire(), "minecraft/plugins");
        assert_eq!(RemotePath::parse("./minecraft/./logs").to_wire(), "minecraft/logs");
        assert_eq!(RemotePath::parse("").to_wire(), ".");
        assert_eq!(RemotePath::parse(".").to_wire(), ".");
    }

    #[test]
    fn test_parent_dir_never_escapes_root() {
        assert_eq!(RemotePath::parse("minecraft/../..").to_wire(), ".");
        assert_eq!(RemotePath::parse("a/b/../c").to_wire(), "a/c");
    }

    #[test]
    fn test_up_and_parent() {
        let path = RemotePath::parse("minecraft/plugins");
        assert_eq!(path.up().to_wire(), "minecraft");
        assert_eq!(RemotePath::parse("minecraft").up(), RemotePath::root());
        assert!(RemotePath::root().parent().is_none());
        assert!(RemotePath::root().up().is_root());
    }

    #[test]
    fn test_child_keeps_name_verbatim() {
        let dir = RemotePath::parse("minecraft");
        assert_eq!(dir.child(" notes.txt").to_wire(), "minecraft/ notes.txt");
        assert_eq!(dir.child("a\\b.txt").depth(), 2);
        assert_eq!(dir.child("..").file_name(), Some(".."));
        assert_eq!(RemotePath::root().child("world").to_wire(), "world");
        assert_eq!(
            RemotePath::root().child("minecraft").child("server.jar").to_wire(),
            "minecraft/server.jar"
        );
    }

    #[test]
    fn test_breadcrumbs_map_to_prefixes() {
        let crumbs = RemotePath::parse("minecraft/plugins/Essentials").breadcrumbs();
        let paths: Vec<String> = crumbs.iter().map(|c| c.path.to_wire()).collect();
        assert_eq!(paths, vec!["minecraft", "minecraft/plugins", "minecraft/plugins/Essentials"]);
        assert!(RemotePath::root().breadcrumbs().is_empty());
    }

    #[test]
    fn test_starts_with() {
        let parent = RemotePath::parse("minecraft");
        assert!(RemotePath::parse("minecraft/plugins").starts_with(&parent));
        assert!(!RemotePath::parse("backup").starts_with(&parent));
        assert!(parent.starts_with(&RemotePath::root()));
    }

    #[test]
    fn test_serde_uses_wire_form() {
        let json = serde_json::to_string(&RemotePath::root()).unwrap();
        assert_eq!(json, "\".\"");
        let back: RemotePath = serde_json::from_str("\"minecraft/plugins\"").unwrap();
        assert_eq!(back.depth(), 2);
    }
}
