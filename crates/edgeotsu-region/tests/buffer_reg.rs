//! Edge buffer regression test
//!
//! The buffer of zero distance is the edge set itself, buffers grow with
//! distance, and the no-data policy decides whether gaps block growth.

use edgeotsu_core::GeoTransform;
use edgeotsu_region::{NoDataDistance, buffer_edges, euclidean_distance};
use edgeotsu_test::RegParams;
use edgeotsu_test::scene::mask_from_ascii;

#[test]
fn buffer_reg() {
    let mut rp = RegParams::new("buffer");
    let gt = GeoTransform::with_pixel_size(30.0).expect("transform");

    let edges = mask_from_ascii(
        &[
            "................",
            "................",
            "......#.........",
            "......#.........",
            "......#.........",
            "......#.........",
            "................",
            "................",
        ],
        gt,
    )
    .expect("mask");

    // --- Test 1: zero buffer equals the edge mask ---
    for policy in [NoDataDistance::Transparent, NoDataDistance::Barrier] {
        let b = buffer_edges(&edges, 0.0, 30.0, policy).expect("buffer");
        rp.compare_masks(&edges, &b);
    }

    // --- Test 2: buffers are monotonic in distance ---
    let mut prev = edges.clone();
    for d in [15.0, 30.0, 45.0, 60.0, 90.0, 150.0, 300.0] {
        let b = buffer_edges(&edges, d, 30.0, NoDataDistance::Transparent).expect("buffer");
        rp.check(
            prev.is_subset_of(&b).expect("same grid"),
            "larger distance keeps every cell",
        );
        if rp.display() {
            eprintln!("  d = {d}: {} cells", b.count_ones());
        }
        prev = b;
    }

    // --- Test 3: a one pixel radius keeps only the edge ---
    let b = buffer_edges(&edges, 30.0, 30.0, NoDataDistance::Transparent).expect("buffer");
    rp.compare_masks(&edges, &b);
    let b = buffer_edges(&edges, 60.0, 30.0, NoDataDistance::Transparent).expect("buffer");
    // Distances 0, 1 and sqrt(2) fall inside a 2 px radius: a 3x6 block
    rp.compare_values(18.0, b.count_ones() as f64, 0.0);

    // --- Test 4: a no-data wall blocks a barrier buffer ---
    let walled = mask_from_ascii(
        &[
            "#.x.....",
            "#.x.....",
            "#.x.....",
            "#.x.....",
        ],
        gt,
    )
    .expect("mask");
    let transparent =
        buffer_edges(&walled, 120.0, 30.0, NoDataDistance::Transparent).expect("buffer");
    let barrier = buffer_edges(&walled, 120.0, 30.0, NoDataDistance::Barrier).expect("buffer");
    // Columns 0..=3 lie within 4 px; column 2 is no-data in both
    rp.compare_values(12.0, transparent.count_ones() as f64, 0.0);
    rp.compare_values(8.0, barrier.count_ones() as f64, 0.0);
    rp.compare_values(4.0, barrier.count_nodata() as f64, 0.0);
    rp.check(
        barrier.is_subset_of(&transparent).expect("same grid"),
        "barrier buffer is within the transparent buffer",
    );

    // --- Test 5: distance field reaches the far corner ---
    let field = euclidean_distance(&edges);
    let far = field.get(15, 7).expect("in grid");
    rp.compare_values((81.0f64 + 4.0).sqrt(), far, 1e-9);

    assert!(rp.cleanup(), "buffer regression test failed");
}
