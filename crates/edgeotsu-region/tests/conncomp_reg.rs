//! Edge filter regression test
//!
//! Short edge components are removed, long ones survive with their class,
//! and filtering a filtered edge set changes nothing.

use edgeotsu_core::{BinaryMask, EdgeClass, EdgeClasses, GeoTransform};
use edgeotsu_region::{
    ConnectivityType, EdgeFilterOptions, filter_edge_classes, filter_edges,
    find_connected_components,
};
use edgeotsu_test::RegParams;
use edgeotsu_test::scene::mask_from_ascii;

#[test]
fn conncomp_reg() {
    let mut rp = RegParams::new("conncomp");
    let gt = GeoTransform::with_pixel_size(30.0).expect("transform");

    // --- Test 1: a lone 5-pixel component is removed at edge length 25 ---
    let small = mask_from_ascii(
        &[
            "..........",
            "..###.....",
            "...##.....",
            "..........",
        ],
        gt,
    )
    .expect("mask");
    let classes = EdgeClasses::from_mask(&small, EdgeClass::Strong);
    let kept = filter_edges(&classes, &EdgeFilterOptions::default()).expect("filter");
    rp.compare_values(5.0, small.count_ones() as f64, 0.0);
    rp.compare_values(0.0, kept.count_ones() as f64, 0.0);
    rp.compare_masks(&kept, &BinaryMask::new(10, 4, gt).expect("zeros"));

    // --- Test 2: a long line survives next to a short one ---
    let row_long = "#".repeat(30);
    let row_gap = ".".repeat(30);
    let row_short = format!("{}{}", "#".repeat(4), ".".repeat(26));
    let mixed = mask_from_ascii(&[row_long.as_str(), row_gap.as_str(), row_short.as_str()], gt).expect("mask");
    let classes = EdgeClasses::from_mask(&mixed, EdgeClass::Strong);
    let kept = filter_edges(&classes, &EdgeFilterOptions::default()).expect("filter");
    rp.compare_values(30.0, kept.count_ones() as f64, 0.0);
    let comps = find_connected_components(&kept, ConnectivityType::EightWay);
    rp.compare_values(1.0, comps.len() as f64, 0.0);
    rp.compare_values(30.0, comps[0].bounds.width() as f64, 0.0);

    // --- Test 3: weak and strong runs are separate components ---
    // A 20-cell strong run touching a 10-cell weak run
    let mut data = vec![EdgeClass::Strong; 20];
    data.extend(vec![EdgeClass::Weak; 10]);
    let line = EdgeClasses::new(30, 1, data, gt).expect("classes");
    let kept = filter_edge_classes(&line, &EdgeFilterOptions::new(15, 100)).expect("filter");
    rp.compare_values(20.0, kept.count(EdgeClass::Strong) as f64, 0.0);
    rp.compare_values(0.0, kept.count(EdgeClass::Weak) as f64, 0.0);

    // --- Test 4: filtering is idempotent ---
    let once = filter_edge_classes(&classes, &EdgeFilterOptions::default()).expect("filter");
    let twice = filter_edge_classes(&once, &EdgeFilterOptions::default()).expect("filter");
    rp.check(once == twice, "second filter pass changes nothing");

    // --- Test 5: no-data survives filtering ---
    let holey = mask_from_ascii(&["x.##", "...."], gt).expect("mask");
    let kept = filter_edges(
        &EdgeClasses::from_mask(&holey, EdgeClass::Strong),
        &EdgeFilterOptions::new(1, 1),
    )
    .expect("filter");
    rp.compare_values(1.0, kept.count_nodata() as f64, 0.0);
    rp.compare_values(2.0, kept.count_ones() as f64, 0.0);

    assert!(rp.cleanup(), "conncomp regression test failed");
}
