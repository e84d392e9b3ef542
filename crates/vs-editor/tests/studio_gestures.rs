//! Pointer gestures driven through the studio controller.

use kurbo::Point;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use vs_core::{Alignment, AssetId, Axis, LayerId, Library, ObjectId, StudioConfig};
use vs_editor::{InputEvent, Modifiers, Studio, StudioEvent, ToolKind};

const TILE: &str = r#"<svg viewBox="0 0 20 20"><rect width="20" height="20"/></svg>"#;

fn studio() -> (Studio, LayerId, AssetId) {
    let asset = AssetId::intern("gesture_tile");
    let mut library = Library::new();
    library.insert_asset(asset, TILE);
    let mut studio = Studio::new(StudioConfig::default(), library);
    let layer = studio.add_layer("Main");
    (studio, layer, asset)
}

fn place(studio: &mut Studio, layer: LayerId, asset: AssetId, x: f64, y: f64) -> ObjectId {
    // Tiles are 20x20 and placed by their center.
    studio.instantiate(asset, layer, Point::new(x + 10.0, y + 10.0)).unwrap()
}

fn press_drag_release(studio: &mut Studio, from: Point, to: Point) {
    studio.handle_input(InputEvent::down(from.x, from.y));
    studio.handle_input(InputEvent::moved(to.x, to.y));
    studio.handle_input(InputEvent::up(to.x, to.y));
}

#[test]
fn drag_snaps_left_edge_onto_neighbour() {
    let (mut studio, layer, asset) = studio();
    let moving = place(&mut studio, layer, asset, 10.0, 10.0);
    let _other = place(&mut studio, layer, asset, 10.0, 100.0);

    studio.handle_input(InputEvent::down(15.0, 15.0));
    studio.handle_input(InputEvent::moved(14.7, 15.0));

    let guides = studio.guides();
    assert!(!guides.is_empty());
    assert_eq!((guides[0].axis, guides[0].alignment), (Axis::Vertical, Alignment::Left));
    assert_eq!(guides[0].position, 10.0);
    assert!((studio.object(moving).unwrap().x - 10.0).abs() < 1e-9);

    studio.handle_input(InputEvent::up(14.7, 15.0));
    assert!(studio.guides().is_empty());
    assert_eq!(studio.selection(), vec![moving]);
}

#[test]
fn box_select_collects_touched_objects() {
    let (mut studio, layer, asset) = studio();
    let a = place(&mut studio, layer, asset, 10.0, 10.0);
    let b = place(&mut studio, layer, asset, 100.0, 10.0);
    let _far = place(&mut studio, layer, asset, 400.0, 400.0);

    studio.handle_input(InputEvent::down(-50.0, -50.0));
    assert!(studio.selection().is_empty());
    studio.handle_input(InputEvent::moved(200.0, 50.0));
    assert!(studio.marquee().is_some());
    assert_eq!(studio.selection(), vec![a, b]);

    studio.handle_input(InputEvent::up(200.0, 50.0));
    assert_eq!(studio.marquee(), None);
    assert_eq!(studio.selection(), vec![a, b]);
}

#[test]
fn shift_click_extends_selection() {
    let (mut studio, layer, asset) = studio();
    let a = place(&mut studio, layer, asset, 0.0, 0.0);
    let b = place(&mut studio, layer, asset, 100.0, 0.0);
    assert_eq!(studio.selection(), vec![b]);

    studio.handle_input(InputEvent::down(5.0, 5.0).with_modifiers(Modifiers::SHIFT));
    studio.handle_input(InputEvent::up(5.0, 5.0).with_modifiers(Modifiers::SHIFT));
    assert_eq!(studio.selection(), vec![b, a]);
}

#[test]
fn scale_handle_scales_about_center() {
    let (mut studio, layer, asset) = studio();
    let id = place(&mut studio, layer, asset, 0.0, 0.0);

    press_drag_release(&mut studio, Point::new(20.0, 20.0), Point::new(30.0, 30.0));
    let obj = studio.object(id).unwrap();
    assert!((obj.scale - 2.0).abs() < 1e-9);
    assert!((obj.x + 10.0).abs() < 1e-9);
    assert!((obj.y + 10.0).abs() < 1e-9);

    assert!(studio.undo());
    assert_eq!(studio.object(id).unwrap().scale, 1.0);
}

#[test]
fn rotate_handle_follows_pointer_angle() {
    let (mut studio, layer, asset) = studio();
    let id = place(&mut studio, layer, asset, 0.0, 0.0);

    // Rotate handle sits above top-center: (10, -24). Center is (10, 10).
    press_drag_release(&mut studio, Point::new(10.0, -24.0), Point::new(44.0, 10.0));
    assert!((studio.object(id).unwrap().rotation - 90.0).abs() < 1e-9);
}

#[test]
fn locked_object_does_not_move() {
    let (mut studio, layer, asset) = studio();
    let id = place(&mut studio, layer, asset, 0.0, 0.0);
    studio.toggle_lock_selected();

    press_drag_release(&mut studio, Point::new(5.0, 5.0), Point::new(50.0, 50.0));
    let obj = studio.object(id).unwrap();
    assert_eq!((obj.x, obj.y), (0.0, 0.0));
}

#[test]
fn pen_clicks_create_a_path() {
    let (mut studio, _, _) = studio();
    let created = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&created);
    studio.subscribe(move |event| {
        if let StudioEvent::PathCreated(data) = event {
            sink.lock().unwrap().push(data.clone());
        }
    });

    studio.set_tool(ToolKind::Pen);
    for (x, y) in [(0.0, 0.0), (50.0, 0.0), (50.0, 0.0)] {
        studio.handle_input(InputEvent::down(x, y));
        studio.handle_input(InputEvent::up(x, y));
    }
    studio.handle_input(InputEvent::double_click(50.0, 0.0));

    assert_eq!(*created.lock().unwrap(), vec!["M 0 0 L 50 0".to_string()]);
}

#[test]
fn switching_tools_mid_drag_restores_stage() {
    let (mut studio, layer, asset) = studio();
    let id = place(&mut studio, layer, asset, 0.0, 0.0);

    studio.handle_input(InputEvent::down(5.0, 5.0));
    studio.handle_input(InputEvent::moved(45.0, 5.0));
    assert_eq!(studio.object(id).unwrap().x, 40.0);

    studio.set_tool(ToolKind::Pen);
    assert_eq!(studio.object(id).unwrap().x, 0.0);
    assert!(studio.guides().is_empty());
}
