use planboard_core::model::item::MINUTE_MS;
use planboard_core::{
    apply_layout_suggestion, auto_layout_all_conflicts, detect_conflicts, detect_conflicts_json,
    generate_layout_suggestion, CalendarItem, LayoutKind, Placement, Severity,
};

fn at(hour: i64, minute: i64) -> i64 {
    (hour * 60 + minute) * MINUTE_MS
}

fn item(title: &str, start: i64, end: i64) -> CalendarItem {
    CalendarItem::new(title, start, end)
}

#[test]
fn two_overlapping_items_split_the_row_in_half() {
    let a = item("a", at(9, 0), at(10, 0));
    let b = item("b", at(9, 30), at(10, 30));

    let groups = detect_conflicts(&[a.clone(), b.clone()]);

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.density, 2);
    assert_eq!(group.member_ids(), vec![a.id, b.id]);
    assert_eq!(group.time_range.start, at(9, 0));
    assert_eq!(group.time_range.end, at(10, 30));

    let suggestion = &group.layout_suggestion;
    assert_eq!(suggestion.kind, LayoutKind::TwoColumn);
    assert_eq!(suggestion.confidence, 0.95);
    assert_eq!(suggestion.placement_for(a.id), Some(Placement::new(0.0, 50.0)));
    assert_eq!(suggestion.placement_for(b.id), Some(Placement::new(50.0, 50.0)));
    assert!(group.events.iter().all(|event| event.severity == Severity::Low));
}

#[test]
fn three_items_in_the_same_half_hour_get_wide_first_column() {
    let items = (0..3)
        .map(|n| item(&format!("sync-{n}"), at(10, 0), at(10, 30)))
        .collect::<Vec<_>>();

    let groups = detect_conflicts(&items);

    assert_eq!(groups.len(), 1);
    let suggestion = &groups[0].layout_suggestion;
    assert_eq!(suggestion.kind, LayoutKind::ThreeColumn);
    assert_eq!(suggestion.confidence, 0.90);
    let slots = suggestion
        .assignments
        .iter()
        .map(|assignment| (assignment.x_position, assignment.width))
        .collect::<Vec<_>>();
    assert_eq!(slots, vec![(0.0, 50.0), (50.0, 25.0), (75.0, 25.0)]);
    assert!(groups[0]
        .events
        .iter()
        .all(|event| event.severity == Severity::Medium));
}

#[test]
fn chained_overlaps_form_one_group() {
    let a = item("a", at(9, 0), at(10, 0));
    let b = item("b", at(9, 45), at(11, 0));
    let c = item("c", at(10, 30), at(12, 0));

    let groups = detect_conflicts(&[a.clone(), b.clone(), c.clone()]);

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert!(group.contains(a.id) && group.contains(b.id) && group.contains(c.id));
    let first = &group.events[0];
    assert_eq!(first.item.id, a.id);
    assert_eq!(first.overlaps, vec![b.id]);
}

#[test]
fn touching_endpoints_do_not_conflict() {
    let a = item("a", at(9, 0), at(10, 0));
    let b = item("b", at(10, 0), at(11, 0));

    assert!(detect_conflicts(&[a, b]).is_empty());
}

#[test]
fn side_by_side_items_do_not_conflict() {
    let a = item("a", at(9, 0), at(10, 0)).with_placement(Placement::new(0.0, 50.0));
    let b = item("b", at(9, 0), at(10, 0)).with_placement(Placement::new(50.0, 50.0));

    assert!(detect_conflicts(&[a, b]).is_empty());
}

#[test]
fn five_items_stack_the_overflow_in_place() {
    let items = (0..5)
        .map(|n| item(&format!("m{n}"), at(13, 0), at(14, 0)))
        .collect::<Vec<_>>();

    let suggestion = generate_layout_suggestion(&items);

    assert_eq!(suggestion.kind, LayoutKind::Tackboard);
    assert_eq!(suggestion.confidence, 0.70);
    assert_eq!(suggestion.assignments.len(), 4);
    assert_eq!(suggestion.placement_for(items[4].id), None);

    let laid_out = apply_layout_suggestion(&items, &suggestion);
    assert_eq!(laid_out[3].placement(), Placement::new(75.0, 25.0));
    assert_eq!(laid_out[4], items[4]);
}

#[test]
fn auto_layout_leaves_input_untouched_and_resolves_groups() {
    let a = item("a", at(9, 0), at(10, 0));
    let b = item("b", at(9, 30), at(10, 30));
    let lone = item("lone", at(15, 0), at(16, 0));
    let items = vec![a.clone(), b.clone(), lone.clone()];

    let laid_out = auto_layout_all_conflicts(&items);

    assert_eq!(items[0], a);
    assert_eq!(laid_out[0].placement(), Placement::new(0.0, 50.0));
    assert_eq!(laid_out[1].placement(), Placement::new(50.0, 50.0));
    assert_eq!(laid_out[2], lone);
    assert!(detect_conflicts(&laid_out).is_empty());
}

#[test]
fn empty_and_malformed_snapshots_yield_no_groups() {
    assert!(detect_conflicts(&[]).is_empty());
    assert!(detect_conflicts_json("{\"not\": \"an array\"}").is_empty());
    assert!(detect_conflicts_json("[{\"id\": 7}]").is_empty());
}

#[test]
fn json_snapshot_is_detected_like_typed_input() {
    let a = item("a", at(9, 0), at(10, 0));
    let b = item("b", at(9, 30), at(10, 30));
    let payload = serde_json::to_string(&vec![a.clone(), b.clone()])
        .expect("items should serialize");

    let groups = detect_conflicts_json(&payload);

    assert_eq!(groups, detect_conflicts(&[a, b]));
}

#[test]
fn invalid_items_are_ignored() {
    let a = item("a", at(9, 0), at(10, 0));
    let reversed = item("reversed", at(10, 0), at(9, 0));

    assert!(detect_conflicts(&[a, reversed]).is_empty());
}
