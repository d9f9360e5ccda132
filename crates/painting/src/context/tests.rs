use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use glam::Vec2;

use super::*;
use crate::history::{Change, HistoryItem};
use crate::tiles::TileSetEvent;
use crate::types::{Bgra, bgra};

const RED: Bgra = bgra(255, 0, 0, 255);
const BLUE: Bgra = bgra(0, 0, 255, 255);

#[derive(Debug, Clone, PartialEq)]
enum HostEvent {
    Invalidate(Option<PixelRect>),
    Capture(bool),
    Resync,
}

#[derive(Debug, Clone, Default)]
struct RecordingHost {
    events: Arc<Mutex<Vec<HostEvent>>>,
}

impl RecordingHost {
    fn take(&self) -> Vec<HostEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl CanvasHost for RecordingHost {
    fn invalidate(&mut self, dirty: Option<PixelRect>) {
        self.events.lock().unwrap().push(HostEvent::Invalidate(dirty));
    }

    fn set_pointer_capture(&mut self, captured: bool) {
        self.events.lock().unwrap().push(HostEvent::Capture(captured));
    }

    fn resync_derived_state(&mut self, _document: &Document) {
        self.events.lock().unwrap().push(HostEvent::Resync);
    }
}

fn solid_tile(color: Bgra) -> Vec<u8> {
    [color; 16 * 16].concat()
}

/// 32x32 document, 16x16 tiles, cells (0,0) and (1,1) map one empty tile
fn tiled_context() -> (PaintContext, TileId) {
    let mut ctx = PaintContext::new(Document::with_tiles(32, 32, 16, 16).unwrap());
    let tile = ctx.create_empty_tile().unwrap();
    let layer = ctx.active_layer_id();
    ctx.set_mapping_cell(layer, TileCoord::new(0, 0), Some(tile)).unwrap();
    ctx.set_mapping_cell(layer, TileCoord::new(1, 1), Some(tile)).unwrap();
    (ctx, tile)
}

/// Same layout with a solid red tile stamped into both cells
fn stamped_context() -> (PaintContext, TileId) {
    let mut ctx = PaintContext::new(Document::with_tiles(32, 32, 16, 16).unwrap());
    let tile = ctx.create_tile(solid_tile(RED)).unwrap();
    ctx.stamp_tile(TileCoord::new(0, 0), Some(tile)).unwrap();
    ctx.stamp_tile(TileCoord::new(1, 1), Some(tile)).unwrap();
    (ctx, tile)
}

/// Every layer's pixels plus every tile definition
fn snapshot(ctx: &PaintContext) -> (Vec<Vec<u8>>, BTreeMap<TileId, Vec<u8>>) {
    let layers: Vec<Vec<u8>> = ctx
        .document()
        .layers()
        .iter()
        .map(|layer| layer.surface.pixels().to_vec())
        .collect();
    let tiles = ctx
        .document()
        .tile_set()
        .map(|set| set.snapshot())
        .unwrap_or_default();
    (layers, tiles)
}

fn pixel(ctx: &PaintContext, x: i32, y: i32) -> Bgra {
    let layer = ctx.active_layer_id();
    ctx.document().layer(layer).unwrap().surface.get_pixel(x, y).unwrap()
}

/// Every mapped block on every layer equals its tile's canonical pixels
fn assert_instances_match(ctx: &PaintContext) {
    let (tile_w, tile_h) = ctx.tile_size().unwrap();
    for layer in ctx.document().layers() {
        let Some(mapping) = layer.mapping.as_ref() else {
            continue;
        };
        for (coord, id) in mapping.mapped_cells() {
            assert_eq!(
                layer.read_tile_block(coord, tile_w, tile_h),
                ctx.tile_pixels(id).unwrap(),
                "instance at {:?} diverged from tile {}",
                coord,
                id
            );
        }
    }
}

#[test]
fn test_stroke_propagates_to_every_instance() {
    let (mut ctx, tile) = tiled_context();
    let before = snapshot(&ctx);

    ctx.begin_stroke().unwrap();
    ctx.paint_pixel(0, 0, RED).unwrap();
    // Visible on the other instance before the stroke ends
    assert_eq!(pixel(&ctx, 16, 16), RED);
    assert!(ctx.end_stroke("Pencil").unwrap());

    assert_eq!(ctx.history().len(), 1);
    assert!(matches!(
        ctx.history().items()[0].change(),
        Change::TileMappedPixels(_)
    ));
    assert_eq!(&ctx.tile_pixels(tile).unwrap()[..4], &RED);
    assert_instances_match(&ctx);

    assert!(ctx.undo().unwrap());
    assert_eq!(snapshot(&ctx), before);
    assert_eq!(pixel(&ctx, 0, 0), [0; 4]);
    assert_eq!(pixel(&ctx, 16, 16), [0; 4]);
}

#[test]
fn test_undo_redo_round_trip() {
    let (mut ctx, _) = tiled_context();
    let before = snapshot(&ctx);

    ctx.begin_stroke().unwrap();
    ctx.paint_line(0, 0, 20, 3, BLUE).unwrap();
    ctx.fill_rect(PixelRect::new(28, 2, 4, 4), RED).unwrap();
    assert!(ctx.end_stroke("Line").unwrap());
    let after = snapshot(&ctx);
    assert_instances_match(&ctx);

    ctx.undo().unwrap();
    assert_eq!(snapshot(&ctx), before);
    ctx.redo().unwrap();
    assert_eq!(snapshot(&ctx), after);
    assert_instances_match(&ctx);
}

#[test]
fn test_push_after_undo_truncates_redo() {
    let (mut ctx, _) = tiled_context();
    for color in [RED, BLUE] {
        ctx.begin_stroke().unwrap();
        ctx.paint_pixel(20, 2, color).unwrap();
        ctx.end_stroke("Pencil").unwrap();
    }
    ctx.undo().unwrap();
    assert!(ctx.can_redo());

    ctx.begin_stroke().unwrap();
    ctx.paint_pixel(21, 2, RED).unwrap();
    ctx.end_stroke("Pencil").unwrap();

    assert!(!ctx.can_redo());
    assert_eq!(ctx.history().len(), 2);
    assert!(!ctx.redo().unwrap());
}

#[test]
fn test_noop_stroke_records_nothing() {
    let (mut ctx, _) = tiled_context();
    ctx.begin_stroke().unwrap();
    ctx.paint_pixel(3, 3, [0; 4]).unwrap();
    assert!(!ctx.end_stroke("Pencil").unwrap());
    assert!(ctx.history().is_empty());

    let mut ctx = PaintContext::new(Document::new(8, 8).unwrap());
    ctx.begin_stroke().unwrap();
    assert!(!ctx.end_stroke("Pencil").unwrap());
    assert!(ctx.history().is_empty());
}

#[test]
fn test_unmapped_layer_records_pixel_change() {
    let mut ctx = PaintContext::new(Document::new(8, 8).unwrap());
    ctx.begin_stroke().unwrap();
    ctx.paint_line(0, 0, 7, 7, RED).unwrap();
    assert!(ctx.end_stroke("Pencil").unwrap());
    assert!(matches!(
        ctx.history().items()[0].change(),
        Change::Pixels(_)
    ));

    ctx.undo().unwrap();
    assert_eq!(pixel(&ctx, 3, 3), [0; 4]);
}

#[test]
fn test_stroke_on_free_area_of_mapped_layer() {
    let (mut ctx, tile) = tiled_context();
    ctx.begin_stroke().unwrap();
    ctx.paint_pixel(20, 2, RED).unwrap();
    ctx.end_stroke("Pencil").unwrap();

    assert!(matches!(
        ctx.history().items()[0].change(),
        Change::Pixels(_)
    ));
    assert!(ctx.tile_pixels(tile).unwrap().iter().all(|byte| *byte == 0));
}

#[test]
fn test_cancel_stroke_restores_tiles() {
    let (mut ctx, _) = tiled_context();
    let before = snapshot(&ctx);
    ctx.begin_stroke().unwrap();
    ctx.paint_pixel(5, 5, RED).unwrap();
    assert_eq!(pixel(&ctx, 21, 21), RED);
    ctx.cancel_stroke().unwrap();

    assert_eq!(snapshot(&ctx), before);
    assert!(ctx.history().is_empty());
    assert!(!ctx.is_stroking());
}

#[test]
fn test_stroke_respects_selection_mask() {
    let mut ctx = PaintContext::new(Document::new(8, 8).unwrap());
    ctx.select_rect(PixelRect::new(0, 0, 4, 8)).unwrap();
    ctx.begin_stroke().unwrap();
    ctx.paint_line(0, 2, 7, 2, RED).unwrap();
    ctx.end_stroke("Pencil").unwrap();

    assert_eq!(pixel(&ctx, 3, 2), RED);
    assert_eq!(pixel(&ctx, 4, 2), [0; 4]);
}

#[test]
fn test_paint_requires_stroke() {
    let mut ctx = PaintContext::new(Document::new(8, 8).unwrap());
    assert!(matches!(
        ctx.paint_pixel(0, 0, RED),
        Err(PaintError::NoActiveStroke)
    ));
    ctx.begin_stroke().unwrap();
    assert!(matches!(
        ctx.begin_stroke(),
        Err(PaintError::StrokeAlreadyActive)
    ));
    assert!(matches!(ctx.undo(), Err(PaintError::StrokeAlreadyActive)));
}

#[test]
fn test_write_pixels_with_tile_update() {
    let (mut ctx, _) = tiled_context();
    let layer = ctx.active_layer_id();
    let data = [RED; 4].concat();
    assert!(ctx
        .write_pixels_with_tile_update(layer, PixelRect::new(1, 1, 2, 2), &data, "Paste")
        .unwrap());

    assert_eq!(pixel(&ctx, 17, 17), RED);
    assert!(matches!(
        ctx.history().items()[0].change(),
        Change::TileAwarePixels(_)
    ));
    ctx.undo().unwrap();
    assert_eq!(pixel(&ctx, 17, 17), [0; 4]);
    assert_eq!(pixel(&ctx, 1, 1), [0; 4]);
    assert_instances_match(&ctx);
}

#[test]
fn test_host_notifications() {
    let host = RecordingHost::default();
    let (ctx, _) = tiled_context();
    let mut ctx = ctx.with_host(host.clone());

    ctx.begin_stroke().unwrap();
    ctx.paint_pixel(0, 0, RED).unwrap();
    ctx.end_stroke("Pencil").unwrap();
    let events = host.take();
    assert_eq!(events.first(), Some(&HostEvent::Capture(true)));
    assert_eq!(events.last(), Some(&HostEvent::Capture(false)));
    assert!(events.iter().any(|event| matches!(
        event,
        HostEvent::Invalidate(Some(rect)) if rect.contains(16, 16)
    )));

    ctx.add_layer("Top").unwrap();
    let events = host.take();
    assert!(events.contains(&HostEvent::Resync));
    assert!(events.contains(&HostEvent::Invalidate(None)));

    ctx.undo().unwrap();
    assert!(host.take().contains(&HostEvent::Resync));
}

#[test]
fn test_lift_and_commit_in_place() {
    let (mut ctx, tile) = stamped_context();
    let base = ctx.history().len();
    let before = snapshot(&ctx);

    ctx.select_rect(PixelRect::new(0, 0, 8, 16)).unwrap();
    ctx.lift_selection().unwrap();
    assert!(ctx.floating().is_some());
    // Lifted half vanishes from every instance
    assert_eq!(pixel(&ctx, 16, 16), [0; 4]);
    assert_eq!(pixel(&ctx, 24, 16), RED);
    assert_eq!(ctx.history().len(), base);

    assert!(ctx.commit_floating().unwrap());
    assert!(ctx.floating().is_none());
    assert_eq!(ctx.history().len(), base + 2);
    let descriptions = ctx.history().descriptions();
    assert_eq!(
        &descriptions[base..],
        &["Lift selection", "Commit selection"]
    );
    assert_eq!(snapshot(&ctx), before);
    assert_eq!(ctx.tile_pixels(tile).unwrap(), solid_tile(RED).as_slice());

    // Commit undo brings the float back, lift undo restores the layer
    ctx.undo().unwrap();
    assert!(ctx.floating().is_some());
    ctx.undo().unwrap();
    assert!(ctx.floating().is_none());
    assert_eq!(snapshot(&ctx), before);
    assert_instances_match(&ctx);
}

#[test]
fn test_lift_move_commit() {
    let mut ctx = PaintContext::new(Document::new(8, 8).unwrap());
    let layer = ctx.active_layer_id();
    ctx.write_pixels(layer, PixelRect::new(0, 0, 2, 2), &[RED; 4].concat())
        .unwrap();
    ctx.select_rect(PixelRect::new(0, 0, 2, 2)).unwrap();
    ctx.lift_selection().unwrap();
    ctx.move_floating(4, 4).unwrap();
    assert_eq!(ctx.selection().bounds(), PixelRect::new(4, 4, 2, 2));

    assert!(ctx.commit_floating().unwrap());
    assert_eq!(pixel(&ctx, 0, 0), [0; 4]);
    assert_eq!(pixel(&ctx, 5, 5), RED);
    assert_eq!(ctx.selection().bounds(), PixelRect::new(4, 4, 2, 2));

    ctx.undo().unwrap();
    ctx.undo().unwrap();
    assert_eq!(pixel(&ctx, 0, 0), RED);
    assert_eq!(pixel(&ctx, 5, 5), [0; 4]);
}

#[test]
fn test_commit_vanished_float_records_only_lift() {
    let (mut ctx, _) = stamped_context();
    let base = ctx.history().len();

    ctx.select_rect(PixelRect::new(0, 0, 16, 16)).unwrap();
    ctx.lift_selection().unwrap();
    ctx.set_floating_scale(Vec2::ZERO).unwrap();
    assert!(ctx.selection().is_empty());

    assert!(!ctx.commit_floating().unwrap());
    assert!(ctx.floating().is_none());
    assert!(ctx.selection().is_empty());
    assert_eq!(ctx.history().len(), base + 1);
    assert!(matches!(
        ctx.history().peek_undo().map(HistoryItem::change),
        Some(Change::SelectionLift(_))
    ));
    assert_eq!(pixel(&ctx, 0, 0), [0; 4]);
    assert_eq!(pixel(&ctx, 16, 16), [0; 4]);

    ctx.undo().unwrap();
    assert!(ctx.floating().is_none());
    assert_eq!(pixel(&ctx, 0, 0), RED);
    assert_eq!(pixel(&ctx, 16, 16), RED);
}

#[test]
fn test_undo_while_floating_cancels_lift() {
    let (mut ctx, _) = stamped_context();
    let base = ctx.history().len();
    let before = snapshot(&ctx);

    ctx.select_rect(PixelRect::new(2, 2, 4, 4)).unwrap();
    ctx.lift_selection().unwrap();
    ctx.move_floating(3, 0).unwrap();
    assert!(ctx.can_undo());
    assert!(!ctx.can_redo());
    assert!(matches!(ctx.redo(), Err(PaintError::FloatingSelectionActive)));

    assert!(ctx.undo().unwrap());
    assert!(ctx.floating().is_none());
    assert_eq!(ctx.history().len(), base);
    assert_eq!(snapshot(&ctx), before);
}

#[test]
fn test_cancel_painted_float_commits_in_place() {
    let mut ctx = PaintContext::new(Document::new(8, 8).unwrap());
    let layer = ctx.active_layer_id();
    ctx.write_pixels(layer, PixelRect::new(0, 0, 2, 2), &[RED; 4].concat())
        .unwrap();
    ctx.select_rect(PixelRect::new(0, 0, 2, 2)).unwrap();
    ctx.lift_selection().unwrap();
    ctx.move_floating(3, 3).unwrap();
    ctx.paint_floating_pixel(0, 0, BLUE).unwrap();

    ctx.cancel_floating().unwrap();
    assert!(ctx.floating().is_none());
    assert_eq!(pixel(&ctx, 0, 0), BLUE);
    assert_eq!(pixel(&ctx, 1, 1), RED);
    assert_eq!(pixel(&ctx, 3, 3), [0; 4]);
    assert_eq!(ctx.history().len(), 2);
}

#[test]
fn test_floating_blocks_other_edits() {
    let (mut ctx, tile) = stamped_context();
    ctx.select_rect(PixelRect::new(0, 0, 4, 4)).unwrap();
    ctx.lift_selection().unwrap();

    assert!(matches!(ctx.add_layer("Top"), Err(PaintError::FloatingSelectionActive)));
    assert!(matches!(
        ctx.stamp_tile(TileCoord::new(1, 0), Some(tile)),
        Err(PaintError::FloatingSelectionActive)
    ));
    assert!(matches!(ctx.begin_stroke(), Err(PaintError::FloatingSelectionActive)));
    assert!(matches!(ctx.lift_selection(), Err(PaintError::FloatingSelectionActive)));
    assert!(matches!(ctx.save_json(), Err(PaintError::FloatingSelectionActive)));
}

#[test]
fn test_lift_empty_selection() {
    let mut ctx = PaintContext::new(Document::new(8, 8).unwrap());
    assert!(matches!(ctx.lift_selection(), Err(PaintError::EmptySelection)));
    assert!(matches!(ctx.commit_floating(), Err(PaintError::NoFloatingSelection)));
}

#[test]
fn test_stamp_and_undo() {
    let mut ctx = PaintContext::new(Document::with_tiles(32, 32, 16, 16).unwrap());
    let layer = ctx.active_layer_id();
    let tile = ctx.create_tile(solid_tile(BLUE)).unwrap();

    assert!(ctx.stamp_tile(TileCoord::new(1, 0), Some(tile)).unwrap());
    assert_eq!(ctx.mapping_cell(layer, TileCoord::new(1, 0)), Some(tile));
    assert_eq!(pixel(&ctx, 20, 5), BLUE);
    assert_eq!(ctx.sample_tile_at(layer, 20, 5), Some(tile));

    assert!(ctx.stamp_tile(TileCoord::new(1, 0), None).unwrap());
    assert_eq!(ctx.mapping_cell(layer, TileCoord::new(1, 0)), None);
    assert_eq!(ctx.history().descriptions(), vec!["Stamp tile", "Unmap tile"]);

    ctx.undo().unwrap();
    assert_eq!(ctx.mapping_cell(layer, TileCoord::new(1, 0)), Some(tile));
    ctx.undo().unwrap();
    assert_eq!(ctx.mapping_cell(layer, TileCoord::new(1, 0)), None);
    assert_eq!(pixel(&ctx, 20, 5), [0; 4]);

    assert!(matches!(
        ctx.stamp_tile(TileCoord::new(2, 0), Some(tile)),
        Err(PaintError::CellOutOfRange { x: 2, y: 0 })
    ));
    assert!(matches!(
        ctx.stamp_tile(TileCoord::new(0, 0), Some(TileId(99))),
        Err(PaintError::TileNotFound(_))
    ));
}

#[test]
fn test_capture_tile() {
    let mut ctx = PaintContext::new(Document::with_tiles(32, 32, 16, 16).unwrap());
    let layer = ctx.active_layer_id();
    ctx.write_pixels(layer, PixelRect::new(16, 16, 1, 1), &RED).unwrap();

    let tile = ctx.capture_tile(TileCoord::new(1, 1)).unwrap();
    assert_eq!(&ctx.tile_pixels(tile).unwrap()[..4], &RED);
    assert_eq!(ctx.mapping_cell(layer, TileCoord::new(1, 1)), Some(tile));

    ctx.undo().unwrap();
    assert_eq!(ctx.mapping_cell(layer, TileCoord::new(1, 1)), None);
    assert!(ctx.tile_ids().contains(&tile));
    assert_eq!(pixel(&ctx, 16, 16), RED);
}

#[test]
fn test_delete_tile_unmaps_cells() {
    let (mut ctx, tile) = stamped_context();
    let layer = ctx.active_layer_id();
    assert!(ctx.delete_tile(tile).unwrap());
    assert!(!ctx.delete_tile(tile).unwrap());

    assert!(ctx.tile_mapping(layer).unwrap().is_unmapped());
    assert!(ctx.tile_ids().is_empty());
    // Pixels stay behind as free pixels
    assert_eq!(pixel(&ctx, 16, 16), RED);

    // Undoing a stamp of the deleted tile leaves the cell unmapped
    ctx.undo().unwrap();
    assert_eq!(ctx.mapping_cell(layer, TileCoord::new(1, 1)), None);
    ctx.redo().unwrap();
    assert_eq!(ctx.mapping_cell(layer, TileCoord::new(1, 1)), None);
}

#[test]
fn test_update_tile_pixels_syncs_layers() {
    let (mut ctx, tile) = stamped_context();
    let base = ctx.active_layer_id();
    let top = ctx.add_layer("Top").unwrap();
    ctx.set_mapping_cell(top, TileCoord::new(0, 1), Some(tile)).unwrap();

    assert!(ctx.update_tile_pixels(tile, solid_tile(BLUE)).unwrap());
    let surface = |id| &ctx.document().layer(id).unwrap().surface;
    assert_eq!(surface(base).get_pixel(16, 16), Some(BLUE));
    assert_eq!(surface(top).get_pixel(0, 16), Some(BLUE));
    assert!(!ctx.update_tile_pixels(TileId(42), solid_tile(RED)).unwrap());
}

#[test]
fn test_tile_events() {
    let (mut ctx, tile) = tiled_context();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = ctx
        .subscribe_tiles(move |event| sink.lock().unwrap().push(*event))
        .unwrap();

    ctx.begin_stroke().unwrap();
    ctx.paint_pixel(0, 0, RED).unwrap();
    ctx.end_stroke("Pencil").unwrap();
    assert!(seen
        .lock()
        .unwrap()
        .contains(&TileSetEvent::TileUpdated { id: tile }));

    assert!(ctx.unsubscribe_tiles(subscription));
    seen.lock().unwrap().clear();
    ctx.create_empty_tile().unwrap();
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_layer_add_remove_move_undo() {
    let mut ctx = PaintContext::new(Document::new(8, 8).unwrap());
    let base = ctx.active_layer_id();
    let top = ctx.add_layer("Top").unwrap();
    assert_eq!(ctx.active_layer_id(), top);
    assert_eq!(ctx.document().layer_index(top), Some(1));

    ctx.move_layer(top, 0).unwrap();
    assert_eq!(ctx.document().layer_index(top), Some(0));
    ctx.remove_layer(base).unwrap();
    assert_eq!(ctx.document().layer_count(), 1);
    assert!(matches!(ctx.remove_layer(top), Err(PaintError::LastLayer)));

    ctx.undo().unwrap();
    assert_eq!(ctx.document().layer_index(base), Some(1));
    ctx.undo().unwrap();
    assert_eq!(ctx.document().layer_index(top), Some(1));
    ctx.undo().unwrap();
    assert_eq!(ctx.document().layer_count(), 1);
    assert_eq!(ctx.active_layer_id(), base);

    assert_eq!(ctx.jump_to(3).unwrap(), 3);
    assert_eq!(ctx.document().layer_count(), 1);
    assert_eq!(ctx.document().layers()[0].id, top);
}

#[test]
fn test_resize_canvas_undo() {
    let (mut ctx, _) = stamped_context();
    let before = snapshot(&ctx);
    ctx.resize_canvas(16, 48).unwrap();
    assert_eq!(ctx.document_size(), (16, 48));
    assert_eq!(ctx.tile_grid_size(), Some((1, 3)));

    ctx.undo().unwrap();
    assert_eq!(ctx.document_size(), (32, 32));
    assert_eq!(snapshot(&ctx), before);
    ctx.redo().unwrap();
    assert_eq!(ctx.document_size(), (16, 48));
}

#[test]
fn test_history_limit_from_config() {
    let mut config = EditorConfig::default();
    config.tiles.enabled = false;
    config.history.max_items = 2;
    let mut ctx = PaintContext::from_config(&config).unwrap();
    for x in 0..4 {
        ctx.begin_stroke().unwrap();
        ctx.paint_pixel(x, 0, RED).unwrap();
        ctx.end_stroke("Pencil").unwrap();
    }
    assert_eq!(ctx.history().len(), 2);
    ctx.undo().unwrap();
    ctx.undo().unwrap();
    assert!(!ctx.can_undo());
    assert_eq!(pixel(&ctx, 1, 0), RED);
    assert_eq!(pixel(&ctx, 2, 0), [0; 4]);
}

#[test]
fn test_save_and_load() {
    let (mut ctx, tile) = stamped_context();
    let json = ctx.save_json().unwrap();
    let before = snapshot(&ctx);

    let mut restored = PaintContext::new(Document::new(4, 4).unwrap());
    restored.load_json(&json).unwrap();
    assert_eq!(snapshot(&restored), before);
    assert!(restored.history().is_empty());
    let layer = restored.active_layer_id();
    assert_eq!(restored.mapping_cell(layer, TileCoord::new(1, 1)), Some(tile));

    ctx.begin_stroke().unwrap();
    assert!(matches!(ctx.load_json(&json), Err(PaintError::StrokeAlreadyActive)));
}

#[test]
fn test_resize_keeps_edge_instances_whole() {
    let mut ctx = PaintContext::new(Document::with_tiles(20, 20, 16, 16).unwrap());
    let tile = ctx.create_tile(solid_tile(RED)).unwrap();
    ctx.stamp_tile(TileCoord::new(1, 1), Some(tile)).unwrap();

    ctx.resize_canvas(32, 32).unwrap();
    assert_eq!(pixel(&ctx, 24, 24), RED);
    assert_instances_match(&ctx);

    ctx.undo().unwrap();
    assert_eq!(ctx.document_size(), (20, 20));
    ctx.redo().unwrap();
    assert_eq!(pixel(&ctx, 31, 31), RED);
    assert_instances_match(&ctx);
}

#[test]
fn test_undo_discards_painted_float_without_recording() {
    let (mut ctx, _) = stamped_context();
    let before = snapshot(&ctx);
    let (len, applied) = (ctx.history().len(), ctx.history().applied_count());

    ctx.select_rect(PixelRect::new(0, 0, 8, 8)).unwrap();
    ctx.lift_selection().unwrap();
    ctx.paint_floating_pixel(0, 0, BLUE).unwrap();

    assert!(ctx.undo().unwrap());
    assert_eq!(ctx.history().len(), len);
    assert_eq!(ctx.history().applied_count(), applied);
    assert!(ctx.floating().is_none());
    assert_eq!(pixel(&ctx, 0, 0), RED);
    assert_eq!(snapshot(&ctx), before);
    assert_instances_match(&ctx);
}

#[test]
fn test_undo_of_repainted_restored_float_moves_pointer_only() {
    let (mut ctx, _) = stamped_context();
    ctx.select_rect(PixelRect::new(0, 0, 8, 8)).unwrap();
    ctx.lift_selection().unwrap();
    ctx.commit_floating().unwrap();
    let len = ctx.history().len();

    // Commit undone: the float is back without a pending lift
    ctx.undo().unwrap();
    ctx.paint_floating_pixel(1, 1, BLUE).unwrap();
    ctx.undo().unwrap();

    assert_eq!(ctx.history().len(), len);
    assert_eq!(ctx.history().applied_count(), len - 2);
    assert!(ctx.floating().is_none());
    assert_eq!(pixel(&ctx, 1, 1), RED);
    assert_instances_match(&ctx);
}

#[test]
fn test_undo_stroke_after_tile_deleted() {
    let (mut ctx, tile) = stamped_context();
    ctx.begin_stroke().unwrap();
    ctx.paint_pixel(0, 0, BLUE).unwrap();
    ctx.end_stroke("Pencil").unwrap();
    assert_eq!(pixel(&ctx, 16, 16), BLUE);

    ctx.delete_tile(tile).unwrap();
    assert!(ctx.undo().unwrap());
    assert_eq!(pixel(&ctx, 0, 0), RED);
    assert_eq!(pixel(&ctx, 16, 16), RED);

    ctx.redo().unwrap();
    assert_eq!(pixel(&ctx, 0, 0), BLUE);
    assert_eq!(pixel(&ctx, 16, 16), BLUE);
}

#[test]
fn test_commit_blits_float_pixels() {
    let mut ctx = PaintContext::new(Document::new(8, 8).unwrap());
    let layer = ctx.active_layer_id();
    let translucent = bgra(255, 0, 0, 128);
    ctx.write_pixels(layer, PixelRect::new(0, 0, 1, 1), &translucent).unwrap();
    ctx.write_pixels(layer, PixelRect::new(4, 4, 1, 1), &BLUE).unwrap();

    ctx.select_rect(PixelRect::new(0, 0, 1, 1)).unwrap();
    ctx.lift_selection().unwrap();
    ctx.move_floating(4, 4).unwrap();
    ctx.commit_floating().unwrap();

    assert_eq!(pixel(&ctx, 4, 4), translucent);
    assert_eq!(pixel(&ctx, 0, 0), [0; 4]);
}
