//! Hit testing: stage point → scene object lookup.
//!
//! Layers are walked front-to-back (highest `z` first, later array entries
//! first among equal `z`), and objects within a layer from last painted to
//! first. Hidden layers and hidden objects are never hit.

use crate::geometry::Bounds;
use crate::id::ObjectId;
use crate::scene::{Layer, SceneObject};
use kurbo::Point;

/// Layers in paint order (stable ascending `z`) without reordering the
/// caller's slice.
pub fn paint_order(layers: &[Layer]) -> Vec<&Layer> {
    let mut ordered: Vec<&Layer> = layers.iter().collect();
    ordered.sort_by_key(|l| l.z);
    ordered
}

/// Find the topmost visible object containing `point`.
///
/// `size_of` supplies the unscaled footprint of an object (normally the
/// library's intrinsic size for its asset).
pub fn hit_test(layers: &[Layer], point: Point, size_of: impl Fn(&SceneObject) -> (f64, f64)) -> Option<ObjectId> {
    for layer in paint_order(layers).into_iter().rev() {
        if !layer.visible {
            continue;
        }
        for obj in layer.objects.iter().rev() {
            if !obj.visible {
                continue;
            }
            let (w, h) = size_of(obj);
            if obj.bounds(w, h).contains(point) {
                log::trace!("hit {} at ({}, {})", obj.id, point.x, point.y);
                return Some(obj.id);
            }
        }
    }
    None
}

/// All visible objects whose bounds intersect `rect`, in paint order.
/// Used for box selection.
pub fn hit_test_rect(layers: &[Layer], rect: &Bounds, size_of: impl Fn(&SceneObject) -> (f64, f64)) -> Vec<ObjectId> {
    paint_order(layers)
        .into_iter()
        .filter(|layer| layer.visible)
        .flat_map(|layer| layer.objects.iter())
        .filter(|obj| obj.visible)
        .filter(|obj| {
            let (w, h) = size_of(obj);
            obj.bounds(w, h).intersects(rect)
        })
        .map(|obj| obj.id)
        .collect()
}
