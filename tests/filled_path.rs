// Copyright 2025 Lars Brubaker
// Winding-partitioned fill tests: packing, rule ranges and winding exactness.

mod helpers;

use euclid::default::Box2D;
use euclid::point2;
use helpers::{
    area, assert_close, centroid, circle, filled_area, init_logging, path_from_contours, path_from_dat,
    tessellate, triangles, winding_at,
};
use winding_tess::{FillAttributes, FillOptions, FillRule, FilledPath, Point, TessellatedPath};

const STAR: &str = include_str!("data/star.dat");
const NESTED: &str = include_str!("data/nested.dat");
const BOWTIE: &str = include_str!("data/bowtie.dat");
const OVERLAP: &str = include_str!("data/overlap.dat");

fn datasets() -> Vec<(&'static str, &'static str)> {
    vec![("star", STAR), ("nested", NESTED), ("bowtie", BOWTIE), ("overlap", OVERLAP)]
}

fn build(data: &str) -> (Vec<Vec<Point>>, TessellatedPath, FilledPath) {
    init_logging();
    let (contours, path) = path_from_dat(data);
    let filled = FilledPath::new(&path).expect("fill failed");
    (contours, path, filled)
}

/// Area of the winding-zero boundary for a path with these bounds.
fn boundary_area(path: &TessellatedPath) -> f64 {
    let b = path.bounds().unwrap().to_f64();
    let (w, h) = (b.width(), b.height());
    let pad = w.max(h) * f64::from(FillOptions::DEFAULT_BOUNDARY_MARGIN);
    (w + 2.0 * pad) * (h + 2.0 * pad)
}

#[test]
fn windings_partition_the_index_array() {
    for (label, data) in datasets() {
        let (_, path, filled) = build(data);
        let total: usize = filled.winding_numbers().iter().map(|&w| filled.indices(w).len()).sum();
        assert_eq!(total, filled.rule_indices(FillRule::NonZero).len() + filled.zero_winding_indices().len());
        assert_eq!(
            total,
            filled.odd_winding_indices().len() + filled.even_winding_indices().len(),
            "{}",
            label
        );
        assert!(filled.winding_numbers().windows(2).all(|w| w[0] < w[1]));
        for &w in filled.winding_numbers() {
            assert!(!filled.indices(w).is_empty(), "{}: empty bucket {}", label, w);
        }
        for i in filled.indices_where(|_| true) {
            assert!((i as usize) < filled.points().len());
        }

        // Zero and non-zero together tile the boundary box.
        let covered = filled_area(&filled, filled.nonzero_winding_indices())
            + filled_area(&filled, filled.zero_winding_indices());
        assert_close(covered, boundary_area(&path), 1.0e-4, label);
    }
}

#[test]
fn rule_ranges_match_predicates() {
    for (label, data) in datasets() {
        let (_, _, filled) = build(data);
        for rule in FillRule::ALL {
            let mut range = filled.rule_indices(rule).to_vec();
            let mut selected = filled.indices_where(|w| rule.accepts(w));
            assert_eq!(range.len(), selected.len(), "{} {:?}", label, rule);
            range.sort_unstable();
            selected.sort_unstable();
            assert_eq!(range, selected, "{} {:?}", label, rule);
        }
    }
}

#[test]
fn rule_areas_match_direct_tessellation() {
    let rules: [(FillRule, fn(i32) -> bool); 2] = [
        (FillRule::OddEven, |w| w % 2 != 0),
        (FillRule::NonZero, |w| w != 0),
    ];
    for (label, data) in datasets() {
        let (contours, _, filled) = build(data);
        for (rule, accept) in rules {
            let direct = tessellate(&contours, accept);
            assert!(direct.errors.is_empty(), "{}: {:?}", label, direct.errors);
            let got = filled_area(&filled, filled.rule_indices(rule));
            assert_close(got, direct.area(), 1.0e-4, label);
        }
    }
}

#[test]
fn triangles_carry_exact_windings() {
    for (label, data) in datasets() {
        let (contours, _, filled) = build(data);
        for &w in filled.winding_numbers() {
            for tri in triangles(filled.points(), filled.indices(w)) {
                let c = centroid(tri);
                assert_eq!(winding_at(&contours, c), w, "{}: triangle {:?}", label, tri);
            }
        }
    }
}

#[test]
fn nested_squares_areas() {
    let (_, path, filled) = build(NESTED);
    assert_eq!(filled.winding_numbers(), &[0, 1, 2]);
    assert_close(filled_area(&filled, filled.indices(1)), 96.0, 1.0e-5, "winding 1");
    assert_close(filled_area(&filled, filled.indices(2)), 48.0, 1.0e-5, "winding 2");
    assert_close(filled_area(&filled, filled.odd_winding_indices()), 96.0, 1.0e-5, "odd");
    assert_close(
        filled_area(&filled, filled.zero_winding_indices()),
        boundary_area(&path) - 144.0,
        1.0e-3,
        "zero",
    );
}

#[test]
fn zero_region_spans_large_path() {
    init_logging();
    let square = vec![vec![
        point2(0.0, 0.0),
        point2(1000.0, 0.0),
        point2(1000.0, 1000.0),
        point2(0.0, 1000.0),
    ]];
    let path = path_from_contours(&square);
    let b = path.bounds().unwrap();
    assert_eq!((b.min, b.max), (point2(0.0, 0.0), point2(1000.0, 1000.0)));

    let filled = FilledPath::new(&path).unwrap();
    assert_close(filled_area(&filled, filled.nonzero_winding_indices()), 1.0e6, 1.0e-6, "square");
    let zero = filled_area(&filled, filled.zero_winding_indices());
    assert_close(zero, boundary_area(&path) - 1.0e6, 1.0e-2, "zero ring");
    assert!(zero > 3.0e3);
}

#[test]
fn construction_is_deterministic() {
    for (label, data) in datasets() {
        let (_, path, first) = build(data);
        let second = FilledPath::new(&path).unwrap();
        assert_eq!(first.points(), second.points(), "{}", label);
        assert_eq!(first.winding_numbers(), second.winding_numbers(), "{}", label);
        assert_eq!(
            first.rule_indices(FillRule::ComplementOddEven),
            second.rule_indices(FillRule::ComplementOddEven),
            "{}",
            label
        );
        assert_eq!(first.odd_winding_indices(), second.odd_winding_indices(), "{}", label);
    }
}

#[test]
fn two_point_contour_is_empty() {
    init_logging();
    let mut path = TessellatedPath::new();
    path.begin(point2(0.0, 0.0)).line_to(point2(3.0, 1.0)).end();
    let filled = FilledPath::new(&path).unwrap();
    assert!(filled.winding_numbers().is_empty());
    assert!(filled.nonzero_winding_indices().is_empty());
    assert!(filled.zero_winding_indices().is_empty());
    assert!(filled.indices_where(|_| true).is_empty());
}

#[test]
fn square_is_two_positive_triangles() {
    let square = vec![vec![point2(0.0, 0.0), point2(1.0, 0.0), point2(1.0, 1.0), point2(0.0, 1.0)]];
    init_logging();
    let filled = FilledPath::new(&path_from_contours(&square)).unwrap();

    assert_eq!(filled.indices(1).len(), 6);
    assert_eq!(filled.odd_winding_indices(), filled.indices(1));
    for tri in triangles(filled.points(), filled.indices(1)) {
        assert!(helpers::triangle_area(tri[0], tri[1], tri[2]) > 0.0);
    }

    let direct = tessellate(&square, |w| w != 0);
    assert_eq!(direct.triangles().len(), 2);
    assert!(direct.triangles().iter().all(|&(w, _)| w == 1));
    assert_close(filled_area(&filled, filled.indices(1)), direct.area(), 1.0e-6, "square");
}

#[test]
fn bowtie_lobes_land_in_separate_buckets() {
    let (_, _, filled) = build(BOWTIE);
    assert_eq!(filled.winding_numbers(), &[-1, 0, 1]);
    assert_close(filled_area(&filled, filled.indices(1)), 1.0, 1.0e-4, "left lobe");
    assert_close(filled_area(&filled, filled.indices(-1)), 1.0, 1.0e-4, "right lobe");
    for tri in triangles(filled.points(), filled.indices(1)) {
        assert!(centroid(tri).x < 1.0);
    }
    for tri in triangles(filled.points(), filled.indices(-1)) {
        assert!(centroid(tri).x > 1.0);
    }
    assert_eq!(
        filled.odd_winding_indices().len(),
        filled.indices(1).len() + filled.indices(-1).len()
    );
    assert_eq!(filled.nonzero_winding_indices(), filled.odd_winding_indices());
}

#[test]
fn zero_region_stays_outside_the_path() {
    let (contours, path, filled) = build(NESTED);
    let bounds = path.bounds().unwrap();
    let outside: Vec<&Point> = filled
        .points()
        .iter()
        .filter(|p| p.x < bounds.min.x || p.y < bounds.min.y || p.x > bounds.max.x || p.y > bounds.max.y)
        .collect();
    assert_eq!(outside.len(), 4);
    for p in outside {
        assert!(p.x < bounds.min.x || p.x > bounds.max.x);
        assert!(p.y < bounds.min.y || p.y > bounds.max.y);
    }
    for tri in triangles(filled.points(), filled.zero_winding_indices()) {
        assert_eq!(winding_at(&contours, centroid(tri)), 0);
    }
}

#[test]
fn guide_boxes_keep_areas() {
    init_logging();
    let ring = vec![circle(point2(0.0, 0.0), 50.0, 300), {
        let mut hole = circle(point2(0.0, 0.0), 20.0, 90);
        hole.reverse();
        hole
    }];
    let path = path_from_contours(&ring);
    let plain = FilledPath::with_options(&path, &FillOptions::DEFAULT.with_guide_boxes(false)).unwrap();
    let guided = FilledPath::new(&path).unwrap();

    assert!(guided.points().len() > plain.points().len());
    assert_eq!(plain.winding_numbers(), &[0, 1]);
    assert_eq!(guided.winding_numbers(), &[0, 1]);
    let expected = area(plain.points(), plain.indices(1));
    assert_close(filled_area(&guided, guided.indices(1)), expected, 1.0e-4, "ring");
    for tri in triangles(guided.points(), guided.indices(1)) {
        assert_eq!(winding_at(&ring, centroid(tri)), 1);
    }
}

#[test]
fn attribute_data_is_built_once() {
    let (_, _, filled) = build(OVERLAP);
    let first = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| filled.attribute_data() as *const _ as usize)).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
    });
    assert!(first.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(filled.attribute_data() as *const _ as usize, first[0]);

    let attrs = filled.attribute_data();
    assert_eq!(attrs.vertices().len(), filled.points().len());
    assert_eq!(&attrs.vertices()[0].position[2..], &[0.0, 0.0]);
    for rule in FillRule::ALL {
        assert_eq!(attrs.chunk(FillAttributes::chunk_from_fill_rule(rule)), filled.rule_indices(rule));
    }
    for &w in filled.winding_numbers() {
        assert_eq!(attrs.chunk(FillAttributes::chunk_from_winding(w)), filled.indices(w));
    }
}

fn ring() -> Vec<Vec<Point>> {
    let mut hole = circle(point2(0.0, 0.0), 20.0, 90);
    hole.reverse();
    vec![circle(point2(0.0, 0.0), 50.0, 300), hole]
}

/// Ids of the unsplit subsets at or below `id`.
fn leaves(filled: &FilledPath, id: usize) -> Vec<usize> {
    match filled.subset_children(id) {
        Some([a, b]) => {
            let mut out = leaves(filled, a);
            out.extend(leaves(filled, b));
            out
        }
        None => vec![id],
    }
}

#[test]
fn leaf_subsets_tile_the_path() {
    init_logging();
    let contours = ring();
    let filled = FilledPath::new(&path_from_contours(&contours)).unwrap();
    assert!(filled.number_subsets() > 1);
    assert!(std::ptr::eq(filled.subset(0).unwrap().points(), filled.points()));

    let mut covered = 0.0;
    for leaf in leaves(&filled, 0) {
        let subset = filled.subset(leaf).unwrap();
        let b = filled.subset_bounds(leaf).inflate(1.0e-3, 1.0e-3);
        for &w in subset.winding_numbers().iter().filter(|&&w| w != 0) {
            for tri in triangles(subset.points(), subset.indices(w)) {
                let c = centroid(tri);
                assert!(b.contains(c), "subset {}: {:?} outside {:?}", leaf, c, b);
                assert_eq!(winding_at(&contours, c), w, "subset {}", leaf);
            }
        }
        covered += area(subset.points(), subset.nonzero_winding_indices());
    }
    assert_close(covered, filled_area(&filled, filled.nonzero_winding_indices()), 1.0e-3, "leaves");
}

#[test]
fn split_subset_merges_its_halves() {
    init_logging();
    let filled = FilledPath::new(&path_from_contours(&ring())).unwrap();
    let (id, [a, b]) = (1..filled.number_subsets())
        .find_map(|id| filled.subset_children(id).map(|c| (id, c)))
        .expect("no split subset below the root");
    let (parent, low, high) = (
        filled.subset(id).unwrap(),
        filled.subset(a).unwrap(),
        filled.subset(b).unwrap(),
    );
    assert_eq!(parent.points().len(), low.points().len() + high.points().len());
    assert_eq!(
        parent.nonzero_winding_indices().len(),
        low.nonzero_winding_indices().len() + high.nonzero_winding_indices().len()
    );
    for &w in low.winding_numbers().iter().chain(high.winding_numbers()) {
        assert!(parent.winding_numbers().contains(&w));
    }
    // Built once.
    assert!(std::ptr::eq(parent, filled.subset(id).unwrap()));
}

#[test]
fn selection_follows_clip_and_budget() {
    init_logging();
    let path = path_from_contours(&ring());
    let filled = FilledPath::new(&path).unwrap();
    let bounds = path.bounds().unwrap();
    let everything = bounds.inflate(1.0, 1.0);

    assert_eq!(filled.select_subsets(&everything, usize::MAX, usize::MAX).unwrap(), vec![0]);
    let away = Box2D::new(point2(500.0, 500.0), point2(600.0, 600.0));
    assert!(filled.select_subsets(&away, usize::MAX, usize::MAX).unwrap().is_empty());

    // A clip over the left side only picks subsets that reach it.
    let left = Box2D::new(point2(-60.0, -60.0), point2(-45.0, 60.0));
    let picked = filled.select_subsets(&left, usize::MAX, usize::MAX).unwrap();
    assert!(!picked.is_empty());
    assert!(!picked.contains(&0));
    for &id in &picked {
        let b = filled.subset_bounds(id);
        assert!(b.min.x <= left.max.x, "subset {} at {:?}", id, b);
    }

    // A tight budget splits the selection, which still covers every
    // non-empty leaf exactly once.
    let budget = 200;
    let picked = filled.select_subsets(&everything, budget, usize::MAX).unwrap();
    assert!(picked.len() > 1);
    let mut covered: Vec<usize> = Vec::new();
    for &id in &picked {
        let sizes = filled.subset(id).unwrap().sizes();
        assert!(sizes.attributes <= budget || filled.subset_children(id).is_none());
        covered.extend(leaves(&filled, id));
    }
    covered.sort_unstable();
    let mut expected: Vec<usize> = leaves(&filled, 0)
        .into_iter()
        .filter(|&l| !filled.subset(l).unwrap().points().is_empty())
        .collect();
    expected.sort_unstable();
    let covered: Vec<usize> = covered
        .into_iter()
        .filter(|&l| !filled.subset(l).unwrap().points().is_empty())
        .collect();
    assert_eq!(covered, expected);
}
