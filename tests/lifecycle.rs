//! End-to-end frame lifecycle: load, attach features, promote, store.

use std::sync::Arc;

use image::{GrayImage, Luma, Rgb};
use nalgebra::{DMatrix, Point2, Vector3};

use vslam_frontend::atlas::{KeyFrame, KeyFrameId, KeyFrameIdAllocator, Map};
use vslam_frontend::config::FrontendConfig;
use vslam_frontend::feature_cache::{CachedFeatureProvider, FeatureCache};
use vslam_frontend::geometry::SE3;
use vslam_frontend::io::DirectoryImageSource;
use vslam_frontend::tracking::Frame;
use vslam_frontend::tracking::frame::{ExtractionMode, FeatureSet, FeatureTriple};

fn five_features() -> FeatureTriple {
    FeatureTriple {
        points: vec![
            Point2::new(10.0, 12.0),
            Point2::new(20.5, 8.0),
            Point2::new(31.0, 40.0),
            Point2::new(5.0, 55.0),
            Point2::new(60.0, 2.0),
        ],
        descriptors: DMatrix::from_row_slice(
            5,
            3,
            &[
                0.1, 0.2, 0.3, //
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                0.5, 0.5, 0.5, //
                0.9, 0.8, 0.7,
            ],
        ),
        colors: vec![
            Rgb([255, 0, 0]),
            Rgb([0, 255, 0]),
            Rgb([0, 0, 255]),
            Rgb([10, 20, 30]),
            Rgb([200, 200, 200]),
        ],
    }
}

fn three_features(_: &str, _: Option<&GrayImage>) -> Option<FeatureTriple> {
    Some(FeatureTriple {
        points: vec![Point2::new(1.0, 1.0), Point2::new(2.0, 2.0), Point2::new(3.0, 3.0)],
        descriptors: DMatrix::from_element(3, 32, 0.25),
        colors: vec![Rgb([1, 1, 1]); 3],
    })
}

fn write_image(dir: &std::path::Path, name: &str) {
    let mut img = GrayImage::new(64, 64);
    img.put_pixel(3, 3, Luma([200]));
    img.save(dir.join(name)).unwrap();
}

#[test]
fn test_fresh_frame_sentinel_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "0000.png");
    let images = DirectoryImageSource::new(dir.path());

    let frame = Frame::new("0000.png", 0, &images);

    assert_eq!(frame.keyframe_id(), -1);
    assert!(frame.relative_pose_to_keyframe().is_identity(1e-12));
    assert!(!frame.has_features());
    assert_eq!(frame.record().image().unwrap().dimensions(), (64, 64));
}

#[test]
fn test_cache_mode_against_empty_cache() {
    let cache = FeatureCache::with_capacity(8);
    let mut frame = Frame::from_image("0000.png", 0, Some(GrayImage::new(4, 4)));

    let has = frame.extract_features(&cache, ExtractionMode::Cache).unwrap();

    assert!(!has);
    assert!(!frame.has_features());
    assert!(frame.load_points_desc_colors().is_none());
}

#[test]
fn test_fresh_extraction_with_stub_extractor() {
    let cache = Arc::new(FeatureCache::with_capacity(8));
    let provider = CachedFeatureProvider::new(three_features, Arc::clone(&cache));
    let mut frame = Frame::from_image("0001.png", 1, Some(GrayImage::new(4, 4)));

    assert!(frame.extract_features(&provider, ExtractionMode::Extract).unwrap());

    let (points, descriptors, colors) = frame.load_points_desc_colors().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(descriptors.nrows(), 3);
    assert_eq!(colors.len(), 3);

    // The extraction is now cached for the next frame with the same name.
    let mut again = Frame::from_image("0001.png", 2, None);
    assert!(again.extract_features(&provider, ExtractionMode::Cache).unwrap());
    assert_eq!(again.num_features(), 3);
}

#[test]
fn test_cache_mode_applies_mask() {
    let cache = FeatureCache::with_capacity(8);
    let features = FeatureSet::try_from(five_features()).unwrap();
    cache
        .insert("0003.png", features, Some(vec![true, true, false, true, false]))
        .unwrap();

    let mut frame = Frame::from_image("0003.png", 3, None);
    frame.extract_features(&cache, ExtractionMode::Cache).unwrap();

    let (points, descriptors, colors) = frame.load_points_desc_colors().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(descriptors.nrows(), 3);
    assert_eq!(colors[2], Rgb([10, 20, 30]));
}

#[test]
fn test_unmasked_loads_from_config_return_every_point() {
    let config = FrontendConfig::from_toml_str("[feature_cache]\nmasked_loads = false\n").unwrap();
    let cache = FeatureCache::from_params(&config.feature_cache);
    let features = FeatureSet::try_from(five_features()).unwrap();
    cache
        .insert("0003.png", features, Some(vec![true, true, false, true, false]))
        .unwrap();

    let mut frame = Frame::from_image("0003.png", 3, None);
    frame
        .extract_features_with(&cache, ExtractionMode::Cache, &config.feature_cache)
        .unwrap();

    assert_eq!(frame.num_features(), 5);
}

#[test]
fn test_promotion_transfers_five_features() {
    let expected = five_features();
    let mut frame = Frame::from_image("0004.png", 4, Some(GrayImage::new(8, 8)));
    frame.record_mut().attach_features(Some(expected.clone())).unwrap();
    frame.set_parent_keyframe(
        KeyFrameId::new(0),
        SE3::from_translation(Vector3::new(0.5, 0.0, 0.0)),
    );

    let kf = KeyFrame::promote(&mut frame, KeyFrameId::new(1));

    let (points, descriptors, colors) = kf.load_points_desc_colors().unwrap();
    assert_eq!(points, expected.points.as_slice());
    assert_eq!(descriptors, &expected.descriptors);
    assert_eq!(colors, expected.colors.as_slice());
    assert_eq!(points.len(), 5);

    assert!(kf.relative_pose_to_keyframe().is_identity(1e-12));
    assert!(!frame.has_features());
}

#[test]
fn test_pose_refinement_visible_through_frame() {
    let mut frame = Frame::from_image("0005.png", 5, None);
    let kf = KeyFrame::promote(&mut frame, KeyFrameId::new(2));

    let refined = SE3::from_translation(Vector3::new(4.0, 5.0, 6.0));
    kf.world_pose().set(refined);

    assert_eq!(frame.world_pose().get(), refined);
}

#[test]
fn test_full_pipeline_keeps_records_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let config = FrontendConfig::from_toml_str(
        "[feature_cache]\ncapacity = 2\n\n[pyramid]\nlevels = 3\nscale_factor = 2.0\n",
    )
    .unwrap();

    let images = DirectoryImageSource::new(dir.path());
    let cache = Arc::new(FeatureCache::from_params(&config.feature_cache));
    let provider = CachedFeatureProvider::new(three_features, Arc::clone(&cache));
    let ids = KeyFrameIdAllocator::new();
    let mut map = Map::new();

    for i in 0..6u64 {
        let name = format!("{:04}.png", i);
        write_image(dir.path(), &name);

        let mut frame = Frame::new(name, i, &images);
        assert_eq!(frame.build_pyramid(&config.pyramid), 3);
        frame
            .extract_features(&provider, ExtractionMode::Extract)
            .unwrap();
        assert!(frame.assign_grid(&config.grid));

        if i % 3 == 0 {
            let kf = KeyFrame::promote_with(&mut frame, &ids);
            frame.set_parent_keyframe(kf.id(), SE3::identity());
            assert_eq!(kf.num_features(), 3);
            map.insert_keyframe(kf);
        }
        map.retire_frame(frame);
    }

    assert_eq!(map.num_keyframes(), 2);
    assert_eq!(map.num_frames(), 6);
    assert_eq!(cache.len(), 2);
    assert!(map.keyframes().all(|kf| !kf.record().holds_heavy_buffers()));
    assert!(map.frames().all(|f| !f.has_features() && f.record().image().is_none()));
    assert_eq!(map.get_frame(3).unwrap().keyframe_id(), 1);
}
