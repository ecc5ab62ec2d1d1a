//! Asset Loader Tests
//!
//! Tests for:
//! - Texture decoding from disk into RGBA8
//! - Cube maps requiring equal face sizes
//! - Missing files counted as failures
//! - Background loads feeding the inbox and the tracker
//! - Registration after the session sealed
//! - glTF meshes with embedded base64 buffers

use std::path::Path;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};

use lumen::assets::{AssetLoader, AssetRequest, LoadTracker, LoadedAsset};
use lumen::errors::{AssetError, Error};
use lumen::renderer::surface::ColorSpace;

fn write_png(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 4]) {
    RgbaImage::from_pixel(width, height, Rgba(color))
        .save(dir.join(name))
        .unwrap();
}

// ============================================================================
// Blocking loads
// ============================================================================

#[test]
fn loads_texture_and_counts_missing_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_png(dir.path(), "normal.png", 4, 2, [128, 128, 255, 255]);

    let tracker = LoadTracker::new(Duration::ZERO);
    let loader = AssetLoader::new(dir.path(), tracker.clone())?;
    let assets = loader.load_blocking([
        AssetRequest::texture("normal.png", ColorSpace::Linear),
        AssetRequest::texture("missing.png", ColorSpace::Srgb),
    ])?;

    assert_eq!(assets.len(), 1);
    let LoadedAsset::Texture { texture, .. } = &assets[0] else {
        panic!("expected a texture");
    };
    assert_eq!((texture.width, texture.height), (4, 2));
    assert_eq!(texture.color_space, ColorSpace::Linear);
    assert_eq!(&texture.data[..4], &[128, 128, 255, 255]);

    let progress = tracker.progress();
    assert_eq!((progress.loaded, progress.failed, progress.total), (2, 1, 2));
    assert!(tracker.poll(Instant::now()));
    Ok(())
}

#[test]
fn cube_faces_must_match() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let faces = ["px", "nx", "py", "ny", "pz", "nz"];
    for face in faces {
        write_png(dir.path(), &format!("{face}.png"), 2, 2, [10, 20, 30, 255]);
    }
    write_png(dir.path(), "bad_nz.png", 4, 4, [10, 20, 30, 255]);

    let tracker = LoadTracker::new(Duration::ZERO);
    let loader = AssetLoader::new(dir.path(), tracker.clone())?;
    let good = faces.map(|f| format!("{f}.png"));
    let mut bad = good.clone();
    bad[5] = "bad_nz.png".to_string();

    let assets = loader.load_blocking([
        AssetRequest::cube_texture(good, ColorSpace::Srgb),
        AssetRequest::cube_texture(bad, ColorSpace::Srgb),
    ])?;

    assert_eq!(assets.len(), 1);
    assert!(matches!(&assets[0], LoadedAsset::CubeTexture { faces, .. } if faces[5].width == 2));
    assert_eq!(tracker.progress().failed, 1);
    Ok(())
}

#[test]
fn undecodable_bytes_fail() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("junk.png"), b"not an image")?;

    let tracker = LoadTracker::new(Duration::ZERO);
    let loader = AssetLoader::new(dir.path(), tracker.clone())?;
    let assets = loader.load_blocking([AssetRequest::texture("junk.png", ColorSpace::Srgb)])?;
    assert!(assets.is_empty());
    assert_eq!(tracker.progress().failed, 1);
    Ok(())
}

// ============================================================================
// Background loads
// ============================================================================

#[test]
fn background_load_fills_inbox() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_png(dir.path(), "a.png", 1, 1, [255, 0, 0, 255]);
    write_png(dir.path(), "b.png", 1, 1, [0, 255, 0, 255]);

    let tracker = LoadTracker::new(Duration::ZERO);
    let loader = AssetLoader::new(dir.path(), tracker.clone())?;
    let count = loader.load([
        AssetRequest::texture("a.png", ColorSpace::Srgb),
        AssetRequest::texture("b.png", ColorSpace::Srgb),
    ])?;
    assert_eq!(count, 2);
    assert_eq!(tracker.progress().total, 2);

    let mut labels = Vec::new();
    for _ in 0..2 {
        let asset = loader.inbox().recv_timeout(Duration::from_secs(10))?;
        labels.push(asset.label().to_string());
    }
    labels.sort();
    assert_eq!(labels, ["a.png", "b.png"]);

    let deadline = Instant::now() + Duration::from_secs(10);
    while !tracker.progress().is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(tracker.poll(Instant::now()));
    Ok(())
}

#[test]
fn sealed_session_rejects_new_batch() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_png(dir.path(), "a.png", 1, 1, [0, 0, 0, 255]);

    let tracker = LoadTracker::new(Duration::ZERO);
    let loader = AssetLoader::new(dir.path(), tracker.clone())?;
    loader.load_blocking([AssetRequest::texture("a.png", ColorSpace::Srgb)])?;

    let late = loader.load([AssetRequest::texture("a.png", ColorSpace::Srgb)]);
    assert!(matches!(late, Err(Error::Asset(AssetError::SessionSealed(_)))));
    assert_eq!(tracker.progress().total, 1);
    Ok(())
}

#[cfg(not(feature = "gltf"))]
#[test]
fn mesh_without_gltf_feature_fails() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("m.gltf"), b"{}")?;
    let tracker = LoadTracker::new(Duration::ZERO);
    let loader = AssetLoader::new(dir.path(), tracker.clone())?;
    loader.load_blocking([AssetRequest::mesh("m.gltf")])?;
    assert_eq!(tracker.progress().failed, 1);
    Ok(())
}

#[cfg(feature = "gltf")]
#[test]
fn invalid_gltf_fails() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("m.gltf"), b"{ not json")?;
    let tracker = LoadTracker::new(Duration::ZERO);
    let loader = AssetLoader::new(dir.path(), tracker.clone())?;
    let assets = loader.load_blocking([AssetRequest::mesh("m.gltf")])?;
    assert!(assets.is_empty());
    assert_eq!(tracker.progress().failed, 1);
    Ok(())
}

/// One triangle whose buffer is embedded as a base64 `data:` URI.
#[cfg(feature = "gltf")]
const EMBEDDED_TRIANGLE: &str = r#"{
  "asset": { "version": "2.0" },
  "buffers": [{
    "byteLength": 36,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
  }],
  "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
  "accessors": [{
    "bufferView": 0,
    "componentType": 5126,
    "count": 3,
    "type": "VEC3",
    "min": [0.0, 0.0, 0.0],
    "max": [1.0, 1.0, 0.0]
  }],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }]
}"#;

#[cfg(feature = "gltf")]
#[test]
fn gltf_with_embedded_buffer_loads() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("tri.gltf"), EMBEDDED_TRIANGLE)?;
    let tracker = LoadTracker::new(Duration::ZERO);
    let loader = AssetLoader::new(dir.path(), tracker.clone())?;
    let assets = loader.load_blocking([AssetRequest::mesh("tri.gltf")])?;

    let [LoadedAsset::Mesh { mesh, .. }] = assets.as_slice() else {
        panic!("expected one mesh, got {assets:?}");
    };
    assert_eq!(mesh.positions.len(), 3);
    assert_eq!(mesh.indices, [0, 1, 2]);
    assert_eq!(mesh.positions[1], glam::Vec3::X);
    assert_eq!(tracker.progress().failed, 0);
    Ok(())
}

#[cfg(feature = "gltf")]
#[test]
fn gltf_with_non_base64_data_uri_fails() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let doc = EMBEDDED_TRIANGLE.replace(";base64,", ",");
    std::fs::write(dir.path().join("tri.gltf"), doc)?;
    let tracker = LoadTracker::new(Duration::ZERO);
    let loader = AssetLoader::new(dir.path(), tracker.clone())?;
    let assets = loader.load_blocking([AssetRequest::mesh("tri.gltf")])?;
    assert!(assets.is_empty());
    assert_eq!(tracker.progress().failed, 1);
    Ok(())
}
