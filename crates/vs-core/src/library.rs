//! Asset/component library.
//!
//! The stage never owns library entries; scene objects refer to them by
//! [`AssetId`]. A component layers an animation preset over a base asset,
//! so every lookup that needs markup resolves through to an asset.

use crate::geometry::ViewBox;
use crate::id::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Component → component chains longer than this are treated as cycles.
const MAX_RESOLVE_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// SVG markup.
    pub data: String,
    /// Named alternative markups (hover, pressed, …).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub states: BTreeMap<String, String>,
    /// Opaque animation preset name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<String>,
}

impl Asset {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            states: BTreeMap::new(),
            fx: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub base_asset: AssetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibe: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LibraryEntry {
    Asset(Asset),
    Component(Component),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LibraryError {
    #[error("no library entry named `{0}`")]
    UnknownEntry(AssetId),
    #[error("`{0}` does not resolve to an asset")]
    Unresolved(AssetId),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    entries: HashMap<AssetId, LibraryEntry>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, id: AssetId, entry: LibraryEntry) -> Option<LibraryEntry> {
        self.entries.insert(id, entry)
    }

    pub fn insert_asset(&mut self, id: AssetId, data: impl Into<String>) {
        self.insert(id, LibraryEntry::Asset(Asset::new(data)));
    }

    pub fn insert_component(&mut self, id: AssetId, base_asset: AssetId, vibe: Option<String>) {
        self.insert(id, LibraryEntry::Component(Component { base_asset, vibe }));
    }

    pub fn get(&self, id: AssetId) -> Option<&LibraryEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Follow component references down to the asset that owns the markup.
    /// Returns the asset's own id alongside it.
    pub fn resolve(&self, id: AssetId) -> Option<(AssetId, &Asset)> {
        let mut current = id;
        for _ in 0..MAX_RESOLVE_DEPTH {
            match self.entries.get(&current)? {
                LibraryEntry::Asset(asset) => return Some((current, asset)),
                LibraryEntry::Component(component) => current = component.base_asset,
            }
        }
        log::warn!("component chain from {id} does not reach an asset");
        None
    }

    pub fn asset_data(&self, id: AssetId) -> Option<&str> {
        self.resolve(id).map(|(_, asset)| asset.data.as_str())
    }

    /// Unscaled size of the resolved asset's root `<svg>`: its `viewBox`,
    /// else its numeric `width`/`height` attributes.
    pub fn intrinsic_size(&self, id: AssetId) -> Option<(f64, f64)> {
        svg_intrinsic_size(self.asset_data(id)?)
    }

    /// `viewBox` of the resolved asset's root `<svg>`.
    pub fn view_box(&self, id: AssetId) -> Option<ViewBox> {
        svg_view_box(self.asset_data(id)?)
    }

    /// Intrinsic size, or a square of `fallback` when unknown.
    pub fn object_size(&self, id: AssetId, fallback: f64) -> (f64, f64) {
        self.intrinsic_size(id).unwrap_or((fallback, fallback))
    }

    /// Replace the markup of the asset `id` resolves to (a component updates
    /// its base asset). Returns the id of the asset that changed.
    pub fn update_asset_data(&mut self, id: AssetId, data: impl Into<String>) -> Result<AssetId, LibraryError> {
        if !self.contains(id) {
            return Err(LibraryError::UnknownEntry(id));
        }
        let (target, _) = self.resolve(id).ok_or(LibraryError::Unresolved(id))?;
        match self.entries.get_mut(&target) {
            Some(LibraryEntry::Asset(asset)) => {
                asset.data = data.into();
                log::debug!("updated asset data for {target}");
                Ok(target)
            }
            _ => Err(LibraryError::Unresolved(id)),
        }
    }
}

/// The root element's `viewBox`, if present and well formed.
pub fn svg_view_box(svg: &str) -> Option<ViewBox> {
    let doc = roxmltree::Document::parse(svg).ok()?;
    doc.root_element().attribute("viewBox").and_then(ViewBox::parse)
}

/// Size declared by an SVG document's root element.
pub fn svg_intrinsic_size(svg: &str) -> Option<(f64, f64)> {
    if let Some(vb) = svg_view_box(svg) {
        return Some((vb.width, vb.height));
    }
    let doc = roxmltree::Document::parse(svg).ok()?;
    let root = doc.root_element();
    let dim = |name: &str| {
        root.attribute(name)
            .map(|v| v.trim_end_matches("px"))
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| *v > 0.0)
    };
    Some((dim("width")?, dim("height")?))
}

/// The `d` attribute of the first `<path>` in an SVG document.
pub fn first_path_data(svg: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(svg).ok()?;
    doc.descendants()
        .filter(|n| n.has_tag_name("path"))
        .find_map(|n| n.attribute("d"))
        .map(str::to_string)
}

/// Rewrite the first `<path>`'s `d` attribute in place, leaving the rest
/// of the markup byte-for-byte intact.
pub fn replace_first_path_data(svg: &str, data: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(svg).ok()?;
    let range = doc
        .descendants()
        .filter(|n| n.has_tag_name("path"))
        .find_map(|n| n.attributes().find(|a| a.name() == "d"))?
        .range_value();
    let mut out = String::with_capacity(svg.len() + data.len());
    out.push_str(&svg[..range.start]);
    out.push_str(data);
    out.push_str(&svg[range.end..]);
    Some(out)
}
