//! Icon Set Builder
//!
//! Entries live in discovery order. Removal leaves a tombstone so that an
//! in-progress `for_each_entry` pass never shifts or revisits entries.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::svg::SvgDocument;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("no SVG files found in {path}")]
    NoSvgFiles { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Icon,
    Alias,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::Icon => "icon",
            EntryKind::Alias => "alias",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct License {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spdx: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Set-level metadata. Keys not modelled here pass through unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IconSetInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl IconSetInfo {
    pub fn is_palette(&self) -> bool {
        self.palette.unwrap_or(false)
    }
}

/// One exported icon: inner markup plus its viewBox.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedIcon {
    pub body: String,
    #[serde(skip_serializing_if = "is_zero", serialize_with = "serialize_dimension")]
    pub left: f64,
    #[serde(skip_serializing_if = "is_zero", serialize_with = "serialize_dimension")]
    pub top: f64,
    #[serde(serialize_with = "serialize_dimension")]
    pub width: f64,
    #[serde(serialize_with = "serialize_dimension")]
    pub height: f64,
}

impl From<&SvgDocument> for NormalizedIcon {
    fn from(svg: &SvgDocument) -> Self {
        Self {
            body: svg.body(),
            left: svg.view_box.left,
            top: svg.view_box.top,
            width: svg.view_box.width,
            height: svg.view_box.height,
        }
    }
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

/// Whole numbers are written as integers.
fn serialize_dimension<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AliasData {
    pub parent: String,
}

/// Final snapshot of one job, in Iconify JSON shape.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IconSet {
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<IconSetInfo>,
    pub icons: BTreeMap<String, NormalizedIcon>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, AliasData>,
}

#[derive(Debug)]
enum EntryData {
    Icon(Result<SvgDocument, String>),
    Alias { parent: String },
}

#[derive(Debug)]
struct Entry {
    name: String,
    data: EntryData,
    removed: bool,
}

impl Entry {
    fn kind(&self) -> EntryKind {
        match self.data {
            EntryData::Icon(_) => EntryKind::Icon,
            EntryData::Alias { .. } => EntryKind::Alias,
        }
    }
}

/// Build an icon name from a path relative to the source directory:
/// `Arrows/Left Arrow.svg` becomes `arrows-left-arrow`.
pub fn icon_name(relative: &Path) -> Option<String> {
    let stem = relative.with_extension("");
    let joined = stem
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("-");

    let mut name = String::with_capacity(joined.len());
    for ch in joined.chars().flat_map(char::to_lowercase) {
        let ch = if ch.is_ascii_alphanumeric() { ch } else { '-' };
        if ch == '-' && (name.is_empty() || name.ends_with('-')) {
            continue;
        }
        name.push(ch);
    }
    while name.ends_with('-') {
        name.pop();
    }
    (!name.is_empty()).then_some(name)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("svg"))
}

/// In-memory icon set for one job.
#[derive(Debug)]
pub struct IconSetBuilder {
    prefix: String,
    info: Option<IconSetInfo>,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl IconSetBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            info: None,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Discover every `.svg` file under `source_dir`, recursively and in
    /// sorted order. Files that cannot be read or parsed are registered
    /// anyway; `get_icon` returns `None` for them.
    pub fn load(source_dir: &Path, prefix: &str) -> Result<Self, LoadError> {
        let mut builder = Self::new(prefix);
        let walker = WalkDir::new(source_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker {
            let entry = entry.map_err(|source| LoadError::DirectoryRead {
                path: source_dir.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() || !is_svg(entry.path()) {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .unwrap_or(entry.path());
            let Some(name) = icon_name(relative) else {
                tracing::warn!(file = %entry.path().display(), "Skipping file with no usable icon name");
                continue;
            };
            if builder.index.contains_key(&name) {
                tracing::warn!(
                    icon = %name,
                    file = %entry.path().display(),
                    "Duplicate icon name, keeping the first file"
                );
                continue;
            }

            let document = match fs::read_to_string(entry.path()) {
                Ok(source) => SvgDocument::parse(&source).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            builder.push(name, EntryData::Icon(document));
        }

        if builder.entries.is_empty() {
            return Err(LoadError::NoSvgFiles {
                path: source_dir.to_path_buf(),
            });
        }
        Ok(builder)
    }

    fn push(&mut self, name: String, data: EntryData) {
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(Entry {
            name,
            data,
            removed: false,
        });
    }

    pub fn set_info(&mut self, info: IconSetInfo) {
        self.info = Some(info);
    }

    /// Register an icon from SVG source. Unparsable source is kept as an
    /// unusable entry, like a bad file found by `load`.
    pub fn add_svg(&mut self, name: &str, source: &str) {
        let document = SvgDocument::parse(source).map_err(|e| e.to_string());
        self.insert(name, EntryData::Icon(document));
    }

    pub fn add_alias(&mut self, name: &str, parent: &str) {
        self.insert(
            name,
            EntryData::Alias {
                parent: parent.to_string(),
            },
        );
    }

    fn insert(&mut self, name: &str, data: EntryData) {
        match self.index.get(name) {
            Some(&i) => {
                self.entries[i].data = data;
                self.entries[i].removed = false;
            }
            None => self.push(name.to_string(), data),
        }
    }

    /// The stored document, or `None` when the icon is unknown, removed,
    /// an alias, or failed to load.
    pub fn get_icon(&self, name: &str) -> Option<&SvgDocument> {
        let entry = self.live(name)?;
        match &entry.data {
            EntryData::Icon(Ok(document)) => Some(document),
            _ => None,
        }
    }

    /// Why an icon could not be loaded, if it failed.
    pub fn load_error(&self, name: &str) -> Option<&str> {
        match &self.live(name)?.data {
            EntryData::Icon(Err(message)) => Some(message),
            _ => None,
        }
    }

    fn live(&self, name: &str) -> Option<&Entry> {
        let entry = &self.entries[*self.index.get(name)?];
        (!entry.removed).then_some(entry)
    }

    /// Returns `true` only when this call removed the entry.
    pub fn remove_icon(&mut self, name: &str) -> bool {
        let Some(&i) = self.index.get(name) else {
            return false;
        };
        let entry = &mut self.entries[i];
        if entry.removed {
            return false;
        }
        entry.removed = true;
        true
    }

    /// Replace the stored document. Removed entries stay removed; unknown
    /// names are appended as new icons.
    pub fn put_icon(&mut self, name: &str, document: SvgDocument) -> bool {
        match self.index.get(name) {
            Some(&i) if self.entries[i].removed => false,
            Some(&i) => {
                self.entries[i].data = EntryData::Icon(Ok(document));
                true
            }
            None => {
                self.push(name.to_string(), EntryData::Icon(Ok(document)));
                true
            }
        }
    }

    /// Visit each entry in discovery order. Entries removed before their
    /// turn are skipped; entries added during the pass are not visited.
    pub fn for_each_entry<F>(&mut self, mut visitor: F)
    where
        F: FnMut(&mut Self, &str, EntryKind),
    {
        let len = self.entries.len();
        for i in 0..len {
            if self.entries[i].removed {
                continue;
            }
            let name = self.entries[i].name.clone();
            let kind = self.entries[i].kind();
            visitor(self, &name, kind);
        }
    }

    fn resolves_to_icon(&self, alias: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = alias;
        while seen.insert(current) {
            let Some(entry) = self.live(current) else {
                return false;
            };
            match &entry.data {
                EntryData::Icon(Ok(_)) => return true,
                EntryData::Icon(Err(_)) => return false,
                EntryData::Alias { parent } => current = parent.as_str(),
            }
        }
        false
    }

    pub fn export(&self) -> IconSet {
        let mut icons = BTreeMap::new();
        let mut aliases = BTreeMap::new();
        for entry in self.entries.iter().filter(|e| !e.removed) {
            match &entry.data {
                EntryData::Icon(Ok(document)) => {
                    icons.insert(entry.name.clone(), NormalizedIcon::from(document));
                }
                EntryData::Icon(Err(_)) => {}
                EntryData::Alias { parent } => {
                    if self.resolves_to_icon(parent) {
                        aliases.insert(
                            entry.name.clone(),
                            AliasData {
                                parent: parent.clone(),
                            },
                        );
                    }
                }
            }
        }

        let info = self.info.clone().map(|mut info| {
            info.total = Some(icons.len());
            info
        });

        IconSet {
            prefix: self.prefix.clone(),
            info,
            icons,
            aliases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SQUARE: &str = r#"<svg viewBox="0 0 24 24"><path d="M0 0h24v24H0z"/></svg>"#;

    #[test]
    fn test_icon_names() {
        assert_eq!(icon_name(Path::new("home.svg")).as_deref(), Some("home"));
        assert_eq!(
            icon_name(Path::new("Arrows/Left  Arrow.svg")).as_deref(),
            Some("arrows-left-arrow")
        );
        assert_eq!(icon_name(Path::new("_x_.svg")).as_deref(), Some("x"));
        assert_eq!(icon_name(Path::new("___.svg")), None);
    }

    #[test]
    fn test_load_discovers_sorted_and_nested() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.svg"), SQUARE).unwrap();
        fs::write(dir.path().join("a.svg"), SQUARE).unwrap();
        fs::write(dir.path().join("sub/c.SVG"), SQUARE).unwrap();
        fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        fs::write(dir.path().join(".hidden.svg"), SQUARE).unwrap();

        let mut builder = IconSetBuilder::load(dir.path(), "test").unwrap();
        let mut seen = Vec::new();
        builder.for_each_entry(|_, name, kind| seen.push(format!("{}:{}", kind, name)));
        assert_eq!(seen, vec!["icon:a", "icon:b", "icon:sub-c"]);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            IconSetBuilder::load(dir.path(), "x"),
            Err(LoadError::NoSvgFiles { .. })
        ));
        assert!(matches!(
            IconSetBuilder::load(&dir.path().join("missing"), "x"),
            Err(LoadError::DirectoryRead { .. })
        ));
    }

    #[test]
    fn test_unparsable_icon_has_no_document() {
        let mut builder = IconSetBuilder::new("x");
        builder.add_svg("bad", "<svg");
        assert!(builder.get_icon("bad").is_none());
        assert!(builder.load_error("bad").is_some());
        assert!(builder.export().icons.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent_and_put_replaces() {
        let mut builder = IconSetBuilder::new("x");
        builder.add_svg("a", SQUARE);
        builder.add_svg("b", SQUARE);

        let replacement =
            SvgDocument::parse(r#"<svg viewBox="0 0 24 24"><circle r="2"/></svg>"#).unwrap();
        assert!(builder.put_icon("b", replacement));
        assert!(builder.remove_icon("a"));
        assert!(!builder.remove_icon("a"));
        assert!(!builder.remove_icon("never"));
        assert!(!builder.put_icon("a", SvgDocument::parse(SQUARE).unwrap()));

        let set = builder.export();
        assert_eq!(set.icons.keys().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(set.icons["b"].body, r#"<circle r="2"/>"#);
    }

    #[test]
    fn test_removal_during_iteration_skips_entry() {
        let mut builder = IconSetBuilder::new("x");
        for name in ["a", "b", "c"] {
            builder.add_svg(name, SQUARE);
        }
        let mut visited = Vec::new();
        builder.for_each_entry(|set, name, _| {
            visited.push(name.to_string());
            if name == "a" {
                set.remove_icon("b");
            }
        });
        assert_eq!(visited, vec!["a", "c"]);
    }

    #[test]
    fn test_export_aliases_follow_parents() {
        let mut builder = IconSetBuilder::new("x");
        builder.add_svg("home", SQUARE);
        builder.add_svg("gone", SQUARE);
        builder.add_alias("house", "home");
        builder.add_alias("cottage", "house");
        builder.add_alias("lost", "gone");
        builder.add_alias("loop", "loop");
        builder.remove_icon("gone");

        let set = builder.export();
        let names: Vec<_> = set.aliases.keys().cloned().collect();
        assert_eq!(names, vec!["cottage", "house"]);
    }

    #[test]
    fn test_export_json_shape() {
        let mut builder = IconSetBuilder::new("demo");
        builder.add_svg(
            "wide",
            r#"<svg viewBox="-1 0 32.5 16"><path d="M0 0h1z"/></svg>"#,
        );
        let info: IconSetInfo = serde_json::from_value(serde_json::json!({
            "name": "Demo",
            "author": { "name": "Someone" },
            "height": 16
        }))
        .unwrap();
        builder.set_info(info);

        let json = serde_json::to_value(builder.export()).unwrap();
        assert_eq!(json["info"]["total"], 1);
        assert_eq!(json["info"]["height"], 16);
        assert_eq!(json["icons"]["wide"]["left"], -1);
        assert_eq!(json["icons"]["wide"]["width"], 32.5);
        assert_eq!(json["icons"]["wide"]["height"], 16);
        assert!(json["icons"]["wide"].get("top").is_none());
        assert!(json.get("aliases").is_none());
    }
}
