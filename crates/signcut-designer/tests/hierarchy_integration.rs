//! Integration tests for the vector hierarchy builder

use proptest::prelude::*;
use signcut_designer::{HierarchyBuilder, ImportOptions, ShapeRole};
use signcut_core::{BBox, Point};

const DONUT: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 200">
    <path d="M50 50 H150 V150 H50 Z M75 75 H125 V125 H75 Z" fill="#333"/>
</svg>"##;

fn approx(a: BBox, b: BBox) -> bool {
    (a.x - b.x).abs() < 1e-6
        && (a.y - b.y).abs() < 1e-6
        && (a.w - b.w).abs() < 1e-6
        && (a.h - b.h).abs() < 1e-6
}

#[test]
fn test_square_with_square_hole() {
    let outcome = HierarchyBuilder::default().import(DONUT).unwrap();

    let depths: Vec<(usize, ShapeRole)> = outcome.shapes.iter().map(|s| (s.depth, s.role)).collect();
    assert_eq!(depths, vec![(0, ShapeRole::Solid), (1, ShapeRole::Hole)]);

    assert_eq!(outcome.parts.len(), 1);
    let part = &outcome.parts[0];
    assert_eq!(part.id, 1);
    assert_eq!(part.fill, "#333");
    assert!(approx(part.bbox, BBox::new(50.0, 50.0, 100.0, 100.0)));
    assert_eq!(part.geometry.holes.len(), 1);

    // Ring is material, the hole and the outside are not.
    assert!(part.contains_point(Point::new(10.0, 10.0)));
    assert!(part.contains_point(Point::new(90.0, 50.0)));
    assert!(!part.contains_point(Point::new(50.0, 50.0)));
    assert!(!part.contains_point(Point::new(120.0, 50.0)));

    let svg = outcome.to_svg();
    assert!(svg.contains("fill-rule=\"evenodd\""));
}

#[test]
fn test_hole_safe_rectangle() {
    let outcome = HierarchyBuilder::default().import(DONUT).unwrap();
    let part = &outcome.parts[0];
    assert_eq!(part.holes.len(), 1);
    let safe = part.holes[0];
    assert!(approx(safe, BBox::new(32.5, 32.5, 35.0, 35.0)));
}

#[test]
fn test_metric_scaling_scenario() {
    let svg = r#"<svg viewBox="0 0 100 50"><rect x="10" y="10" width="20" height="20"/></svg>"#;
    let builder = HierarchyBuilder::new(ImportOptions {
        real_width_cm: Some(20.0),
        ..Default::default()
    });
    let outcome = builder.import(svg).unwrap();

    assert!((outcome.scale_factor - 2.0).abs() < 1e-12);
    let vb = outcome.view_box.unwrap();
    assert!((vb.w - 200.0).abs() < 1e-9);
    assert!((vb.h - 100.0).abs() < 1e-9);

    let part = &outcome.parts[0];
    assert!(approx(part.bbox, BBox::new(20.0, 20.0, 40.0, 40.0)));
    assert!(approx(part.original_bbox, BBox::new(10.0, 10.0, 20.0, 20.0)));
}

#[test]
fn test_island_becomes_separate_part() {
    let svg = r#"<svg viewBox="0 0 300 300">
        <rect x="10" y="10" width="200" height="200"/>
        <rect x="30" y="30" width="160" height="160"/>
        <rect x="60" y="60" width="100" height="100"/>
    </svg>"#;
    let outcome = HierarchyBuilder::default().import(svg).unwrap();

    assert_eq!(outcome.parts.len(), 2);
    assert_eq!(outcome.parts[0].holes.len(), 1);
    assert!(approx(outcome.parts[1].bbox, BBox::new(60.0, 60.0, 100.0, 100.0)));
    assert_eq!(outcome.parts[1].id, 2);
    assert!(outcome.parts[1].holes.is_empty());
}

#[test]
fn test_background_frame_removed() {
    let svg = r#"<svg viewBox="0 0 100 100">
        <rect x="0" y="0" width="100" height="100" fill="white"/>
        <rect x="10" y="10" width="20" height="20"/>
    </svg>"#;
    let outcome = HierarchyBuilder::default().import(svg).unwrap();
    assert!(outcome.background_removed);
    assert_eq!(outcome.parts.len(), 1);
    assert!(approx(outcome.parts[0].bbox, BBox::new(10.0, 10.0, 20.0, 20.0)));

    let keep = HierarchyBuilder::new(ImportOptions {
        remove_background: false,
        ..Default::default()
    })
    .import(svg)
    .unwrap();
    assert!(!keep.background_removed);
    assert_eq!(keep.parts.len(), 1);
    assert_eq!(keep.parts[0].holes.len(), 1);
}

#[test]
fn test_noise_is_discarded() {
    let svg = r#"<svg viewBox="0 0 100 100">
        <rect x="10" y="10" width="20" height="20"/>
        <rect x="50" y="50" width="0.05" height="20"/>
        <line x1="0" y1="70" x2="50" y2="70"/>
    </svg>"#;
    let outcome = HierarchyBuilder::default().import(svg).unwrap();
    assert_eq!(outcome.parts.len(), 1);
    assert_eq!(outcome.discarded, 2);
}

#[test]
fn test_missing_viewbox_is_empty_result() {
    let outcome = HierarchyBuilder::default()
        .import(r#"<svg><rect width="10" height="10"/></svg>"#)
        .unwrap();
    assert!(outcome.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
}

#[test]
fn test_empty_drawing_warns() {
    let outcome = HierarchyBuilder::default()
        .import(r#"<svg viewBox="0 0 10 10"></svg>"#)
        .unwrap();
    assert!(outcome.is_empty());
    assert!(outcome.warnings.iter().any(|w| w.contains("No valid parts")));
}

#[test]
fn test_non_svg_is_contract_violation() {
    assert!(HierarchyBuilder::default().import("%PDF-1.4").is_err());
}

#[test]
fn test_circle_part() {
    let svg = r#"<svg viewBox="0 0 100 100"><circle cx="50" cy="50" r="10"/></svg>"#;
    let outcome = HierarchyBuilder::default().import(svg).unwrap();
    let part = &outcome.parts[0];
    assert!((part.w() - 20.0).abs() < 0.01);
    assert!((part.h() - 20.0).abs() < 0.01);
    assert!(part.geometry.outer.len() > 8);
}

fn near(a: BBox, b: BBox, tol: f64) -> bool {
    (a.x - b.x).abs() < tol
        && (a.y - b.y).abs() < tol
        && (a.w - b.w).abs() < tol
        && (a.h - b.h).abs() < tol
}

fn single_part_bbox(svg: &str) -> BBox {
    let outcome = HierarchyBuilder::default().import(svg).unwrap();
    assert_eq!(outcome.parts.len(), 1, "{:?}", outcome.warnings);
    outcome.parts[0].bbox
}

#[test]
fn test_arc_circle_with_compact_flags() {
    let spaced = single_part_bbox(
        r#"<svg viewBox="0 0 100 100"><path d="M10 50 a20 20 0 1 1 40 0 a20 20 0 1 1 -40 0 z"/></svg>"#,
    );
    let compact = single_part_bbox(
        r#"<svg viewBox="0 0 100 100"><path d="M10 50a20 20 0 1140 0a20 20 0 11-40 0z"/></svg>"#,
    );
    assert!(near(spaced, BBox::new(10.0, 30.0, 40.0, 40.0), 0.25));
    assert!(approx(compact, spaced));
}

#[test]
fn test_absolute_arc_half_disc() {
    // Upper half of a radius-20 circle centred at (50,50), closed by its diameter.
    let bb = single_part_bbox(
        r#"<svg viewBox="0 0 100 100"><path d="M30 50 A20 20 0 0 1 70 50 Z"/></svg>"#,
    );
    assert!(near(bb, BBox::new(30.0, 30.0, 40.0, 20.0), 0.25));
}

#[test]
fn test_smooth_cubic_reflection() {
    // The S control mirrors (50,30) to (50,70), so the lower lobe reaches y=65.
    let bb = single_part_bbox(
        r#"<svg viewBox="0 0 100 100"><path d="M10 50 C10 30 50 30 50 50 S10 70 10 50 Z"/></svg>"#,
    );
    assert!(near(bb, BBox::new(10.0, 35.0, 40.0, 30.0), 0.25));
}

#[test]
fn test_smooth_quadratic_reflection() {
    // T mirrors (30,30) to (70,70): x peaks at 55, y at 60.
    let bb = single_part_bbox(
        r#"<svg viewBox="0 0 100 100"><path d="M10 50 Q30 30 50 50 T10 50 Z"/></svg>"#,
    );
    assert!(near(bb, BBox::new(10.0, 40.0, 45.0, 20.0), 0.25));
}

#[test]
fn test_relative_and_implicit_commands() {
    let svg = r#"<svg viewBox="0 0 100 100">
        <path d="m10 10 20 0 0 20 -20 0z"/>
        <path d="M60 10l10 0 0 10-10 0z"/>
        <path d="M10 60h10v5h-10zm30 0h5v5h-5z"/>
    </svg>"#;
    let outcome = HierarchyBuilder::default().import(svg).unwrap();
    let mut boxes: Vec<BBox> = outcome.parts.iter().map(|p| p.bbox).collect();
    boxes.sort_by(|a, b| (a.x, a.y).partial_cmp(&(b.x, b.y)).unwrap());

    assert_eq!(boxes.len(), 4);
    assert!(approx(boxes[0], BBox::new(10.0, 10.0, 20.0, 20.0)));
    assert!(approx(boxes[1], BBox::new(10.0, 60.0, 10.0, 5.0)));
    assert!(approx(boxes[2], BBox::new(40.0, 60.0, 5.0, 5.0)));
    assert!(approx(boxes[3], BBox::new(60.0, 10.0, 10.0, 10.0)));
}

#[test]
fn test_nested_group_transforms() {
    let bb = single_part_bbox(
        r#"<svg viewBox="0 0 200 200">
        <g transform="translate(50,20)"><g transform="scale(2)"><rect width="10" height="5"/></g></g>
    </svg>"#,
    );
    assert!(approx(bb, BBox::new(50.0, 20.0, 20.0, 10.0)));
}

#[test]
fn test_grouped_hole_nests_in_frame() {
    let svg = r#"<svg viewBox="0 0 300 300">
        <path d="M0 0 H100 V100 H0 Z"/>
        <g transform="translate(25 25)"><rect width="50" height="50"/></g>
    </svg>"#;
    let outcome = HierarchyBuilder::default().import(svg).unwrap();

    assert_eq!(outcome.parts.len(), 1);
    assert_eq!(outcome.parts[0].geometry.holes.len(), 1);
    let roles: Vec<ShapeRole> = outcome.shapes.iter().map(|s| s.role).collect();
    assert_eq!(roles, vec![ShapeRole::Solid, ShapeRole::Hole]);
}

proptest! {
    #[test]
    fn prop_parts_exceed_noise_floor(
        rects in prop::collection::vec((0.0f64..80.0, 0.0f64..80.0, 0.0f64..15.0, 0.0f64..15.0), 1..12)
    ) {
        let mut svg = String::from(r#"<svg viewBox="0 0 100 100">"#);
        for (x, y, w, h) in &rects {
            svg.push_str(&format!(
                r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}"/>"#,
                x, y, w, h
            ));
        }
        svg.push_str("</svg>");

        let outcome = HierarchyBuilder::default().import(&svg).unwrap();
        for part in &outcome.parts {
            prop_assert!(part.w() > 0.1 && part.h() > 0.1);
        }
    }
}
