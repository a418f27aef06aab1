//! Edge detection regression test
//!
//! Runs Canny on the preliminary classification of synthetic scenes and
//! checks edge placement, thickness and the weak/strong labelling.

use edgeotsu_core::{BinaryMask, EdgeClass, GeoTransform, Raster};
use edgeotsu_filter::{CannyOptions, canny, canny_mask, gaussian_smooth, gradient_magnitude};
use edgeotsu_test::RegParams;
use edgeotsu_test::scene::{SplitScene, disk_scene};

/// Classification of `raster` at `t` without going through the threshold crate
fn classify(raster: &Raster, t: f32) -> BinaryMask {
    let data = raster.data().iter().map(|&v| u8::from(v < t)).collect();
    BinaryMask::from_data(raster.width(), raster.height(), data, *raster.transform())
        .expect("mask")
}

#[test]
fn edge_reg() {
    let mut rp = RegParams::new("edge");

    // --- Test 1: clean split scene, one boundary two columns thick ---
    let scene = SplitScene {
        width: 32,
        height: 32,
        spread: 4.0,
        ..SplitScene::default()
    }
    .build()
    .expect("scene");
    let classes = classify(&scene, -12.5);
    rp.compare_values(512.0, classes.count_ones() as f64, 0.0);
    let edges = canny_mask(&classes, &CannyOptions::default()).expect("canny");
    rp.compare_values(64.0, edges.edge_count() as f64, 0.0);
    for y in 0..32 {
        rp.check(
            edges.is_edge(15, y) && edges.is_edge(16, y),
            "boundary columns are edges",
        );
    }
    if rp.display() {
        eprintln!("  split scene: {} edge cells", edges.edge_count());
    }

    // --- Test 2: all edges of a clean boundary are strong ---
    let cls = edges.weak_strong_classes(0.05).expect("classes");
    rp.compare_values(64.0, cls.count(EdgeClass::Strong) as f64, 0.0);
    rp.compare_values(0.0, cls.count(EdgeClass::Weak) as f64, 0.0);

    // --- Test 3: disk boundary forms a closed ring ---
    let disk = disk_scene(40, 10.0, -20.0, -5.0, 2.0, 9).expect("disk");
    let edges = canny_mask(&classify(&disk, -12.5), &CannyOptions::default()).expect("canny");
    let n = edges.edge_count() as f64;
    // Perimeter 2*pi*10 ~ 63, one to two cells thick
    rp.check(n > 40.0 && n < 200.0, "disk edge count follows the perimeter");
    rp.check(!edges.is_edge(20, 20), "disk center is not an edge");
    rp.check(!edges.is_edge(0, 0), "background corner is not an edge");

    // --- Test 4: raw raster edges with smoothing ---
    let smooth = gaussian_smooth(&scene, 1.0).expect("smooth");
    rp.compare_values(scene.width() as f64, smooth.width() as f64, 0.0);
    let mag = gradient_magnitude(&scene).expect("gradient");
    let m_edge = mag.get(16, 16).unwrap_or(0.0);
    let m_flat = mag.get(4, 16).unwrap_or(f32::MAX);
    rp.check(m_edge > m_flat, "gradient peaks at the class boundary");
    let opts = CannyOptions::new(1.0, 20.0, 10.0);
    let edges = canny(&scene, &opts).expect("canny raster");
    rp.check(edges.is_edge(15, 16) || edges.is_edge(16, 16), "raster boundary found");

    // --- Test 5: no-data hole stays no-data and does not create edges ---
    let gt = GeoTransform::default();
    let mut holed = Raster::filled(16, 16, 1.0, gt).expect("raster").to_mut();
    for y in 6..10 {
        for x in 6..10 {
            holed.set_nodata(x, y).expect("nodata");
        }
    }
    let holed: Raster = holed.into();
    let edges = canny(&holed, &CannyOptions::default()).expect("canny holed");
    rp.compare_values(0.0, edges.edge_count() as f64, 0.0);
    rp.check(edges.get(7, 7).is_none(), "hole remains no-data");

    // --- Test 6: the low threshold decides which weaker edges survive ---
    // Half-plane in the upper rows with a one-pixel line below it; the line
    // has weaker edges than the half-plane border
    let line = BinaryMask::from_data(
        32,
        32,
        (0..32 * 32)
            .map(|i| {
                let (x, y) = (i % 32, i / 32);
                u8::from((y < 16 && x < 16) || x == 15)
            })
            .collect(),
        GeoTransform::default(),
    )
    .expect("mask");
    let keep = canny_mask(&line, &CannyOptions::new(1.0, 2.0, 1.0)).expect("canny");
    let drop = canny_mask(&line, &CannyOptions::new(1.0, 2.0, 2.0)).expect("canny");
    rp.check(
        keep.is_edge(14, 24) && keep.is_edge(16, 24),
        "line edges above the low threshold survive",
    );
    rp.check(
        !drop.is_edge(14, 24) && !drop.is_edge(16, 24),
        "line edges below the low threshold are discarded",
    );
    rp.check(drop.is_edge(16, 4), "half-plane border is kept either way");
    rp.check(
        drop.edge_count() < keep.edge_count(),
        "raising the low threshold removes edges",
    );

    assert!(rp.cleanup(), "edge regression test failed");
}
