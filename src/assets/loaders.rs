//! Asset Loaders (native)
//!
//! Texture, cube texture and glTF mesh loading on a background tokio runtime.
//! Every request is registered with the [`LoadTracker`] before any task is
//! spawned, then each task reads bytes with `tokio::fs`, decodes on the
//! blocking pool and either delivers the asset and resolves its handle, or
//! fails the handle.
//!
//! # Usage
//!
//! ```rust,ignore
//! let loader = AssetLoader::new("assets", tracker.clone())?;
//! loader.load([
//!     AssetRequest::texture("textures/interfaceNormalMap.png", ColorSpace::Linear),
//!     AssetRequest::mesh("models/DamagedHelmet/glTF/DamagedHelmet.gltf"),
//! ])?;
//!
//! // Each frame:
//! for asset in loader.inbox().try_iter() { /* … */ }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;

use crate::assets::image::TextureData;
use crate::assets::mesh::MeshData;
use crate::assets::tracker::{LoadHandle, LoadTracker, ResourceKind};
use crate::errors::{AssetError, Result};
use crate::renderer::surface::ColorSpace;
use crate::renderer::uniforms::TextureRef;

/// One resource to load, relative to the loader's root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRequest {
    Texture {
        path: PathBuf,
        color_space: ColorSpace,
    },
    /// Faces in +X, -X, +Y, -Y, +Z, -Z order.
    CubeTexture {
        paths: [PathBuf; 6],
        color_space: ColorSpace,
    },
    Mesh {
        path: PathBuf,
    },
}

impl AssetRequest {
    pub fn texture(path: impl Into<PathBuf>, color_space: ColorSpace) -> Self {
        Self::Texture {
            path: path.into(),
            color_space,
        }
    }

    pub fn cube_texture<P: Into<PathBuf>>(paths: [P; 6], color_space: ColorSpace) -> Self {
        Self::CubeTexture {
            paths: paths.map(Into::into),
            color_space,
        }
    }

    pub fn mesh(path: impl Into<PathBuf>) -> Self {
        Self::Mesh { path: path.into() }
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Texture { .. } => ResourceKind::Texture,
            Self::CubeTexture { .. } => ResourceKind::CubeTexture,
            Self::Mesh { .. } => ResourceKind::Mesh,
        }
    }

    /// Label used for tracking and logging.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Texture { path, .. } | Self::Mesh { path } => path.display().to_string(),
            Self::CubeTexture { paths, .. } => paths[0]
                .parent()
                .unwrap_or(Path::new(""))
                .display()
                .to_string(),
        }
    }
}

/// A decoded asset delivered through [`AssetLoader::inbox`].
#[derive(Debug, Clone)]
pub enum LoadedAsset {
    Texture {
        label: String,
        texture: TextureRef,
    },
    CubeTexture {
        label: String,
        faces: Arc<[TextureData; 6]>,
    },
    Mesh {
        label: String,
        mesh: Arc<MeshData>,
    },
}

impl LoadedAsset {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Texture { label, .. } | Self::CubeTexture { label, .. } | Self::Mesh { label, .. } => {
                label
            }
        }
    }
}

/// Background loader feeding a [`LoadTracker`].
pub struct AssetLoader {
    root: PathBuf,
    tracker: LoadTracker,
    runtime: Arc<Runtime>,
    outbox: flume::Sender<LoadedAsset>,
    inbox: flume::Receiver<LoadedAsset>,
}

impl AssetLoader {
    /// Creates a loader reading files under `root`.
    pub fn new(root: impl Into<PathBuf>, tracker: LoadTracker) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("lumen-assets")
            .enable_all()
            .build()?;
        let (outbox, inbox) = flume::unbounded();
        Ok(Self {
            root: root.into(),
            tracker,
            runtime: Arc::new(runtime),
            outbox,
            inbox,
        })
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &LoadTracker {
        &self.tracker
    }

    /// Decoded assets, in completion order.
    #[inline]
    #[must_use]
    pub fn inbox(&self) -> &flume::Receiver<LoadedAsset> {
        &self.inbox
    }

    /// Registers every request, then starts loading all of them.
    ///
    /// # Errors
    ///
    /// [`AssetError::SessionSealed`] if the tracker's session already started
    /// settling. Nothing is spawned in that case; handles registered by this
    /// call before the rejection settle as failures.
    pub fn load(&self, requests: impl IntoIterator<Item = AssetRequest>) -> Result<usize> {
        let mut pending = Vec::new();
        for request in requests {
            let handle = self.tracker.register(request.kind(), request.label())?;
            pending.push((request, handle));
        }

        let count = pending.len();
        for (request, handle) in pending {
            let root = self.root.clone();
            let outbox = self.outbox.clone();
            self.runtime.spawn(async move {
                run_request(&root, request, handle, &outbox).await;
            });
        }
        log::debug!("Started {count} asset loads from {}", self.root.display());
        Ok(count)
    }

    /// Loads every request and waits for all of them to settle. Intended for
    /// tools and tests; the viewer uses [`load`](Self::load).
    pub fn load_blocking(&self, requests: impl IntoIterator<Item = AssetRequest>) -> Result<Vec<LoadedAsset>> {
        let mut pending = Vec::new();
        for request in requests {
            let handle = self.tracker.register(request.kind(), request.label())?;
            pending.push((request, handle));
        }

        let root = self.root.clone();
        let outbox = self.outbox.clone();
        let (tx, rx) = flume::unbounded();
        self.runtime.block_on(async move {
            let tasks: Vec<_> = pending
                .into_iter()
                .map(|(request, handle)| {
                    let root = root.clone();
                    let outbox = outbox.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(asset) = run_request(&root, request, handle, &outbox).await {
                            let _ = tx.send(asset);
                        }
                    })
                })
                .collect();
            for task in tasks {
                task.await.map_err(|e| AssetError::TaskJoin(e.to_string()))?;
            }
            Ok::<_, AssetError>(())
        })?;
        Ok(rx.try_iter().collect())
    }
}

/// Loads one request and settles its handle. Returns the delivered asset.
async fn run_request(
    root: &Path,
    request: AssetRequest,
    handle: LoadHandle,
    outbox: &flume::Sender<LoadedAsset>,
) -> Option<LoadedAsset> {
    let label = handle.label().to_string();
    match load_request(root, &request, &label).await {
        Ok(asset) => {
            let _ = outbox.send(asset.clone());
            handle.resolve();
            Some(asset)
        }
        Err(e) => {
            handle.fail(e.to_string());
            None
        }
    }
}

async fn load_request(
    root: &Path,
    request: &AssetRequest,
    label: &str,
) -> std::result::Result<LoadedAsset, AssetError> {
    match request {
        AssetRequest::Texture { path, color_space } => {
            let bytes = read_bytes(root, path).await?;
            let texture = decode_image_async(bytes, *color_space, label.to_string()).await?;
            Ok(LoadedAsset::Texture {
                label: label.to_string(),
                texture: Arc::new(texture),
            })
        }
        AssetRequest::CubeTexture { paths, color_space } => {
            let mut faces = Vec::with_capacity(6);
            for path in paths {
                let bytes = read_bytes(root, path).await?;
                let face_label = path.display().to_string();
                faces.push(decode_image_async(bytes, *color_space, face_label).await?);
            }
            let faces: [TextureData; 6] = faces
                .try_into()
                .map_err(|_| AssetError::CubeMap(format!("{label}: expected 6 faces")))?;
            check_cube_faces(label, &faces)?;
            Ok(LoadedAsset::CubeTexture {
                label: label.to_string(),
                faces: Arc::new(faces),
            })
        }
        AssetRequest::Mesh { path } => {
            let bytes = read_bytes(root, path).await?;
            let label_owned = label.to_string();
            let base = root.join(path).parent().map(Path::to_path_buf).unwrap_or_default();
            let mesh = tokio::task::spawn_blocking(move || decode_gltf(&bytes, &base, &label_owned))
                .await
                .map_err(|e| AssetError::TaskJoin(e.to_string()))??;
            Ok(LoadedAsset::Mesh {
                label: label.to_string(),
                mesh: Arc::new(mesh),
            })
        }
    }
}

async fn read_bytes(root: &Path, path: &Path) -> std::result::Result<Vec<u8>, AssetError> {
    let full = root.join(path);
    tokio::fs::read(&full).await.map_err(|e| AssetError::Io {
        path: full.display().to_string(),
        reason: e.to_string(),
    })
}

async fn decode_image_async(
    bytes: Vec<u8>,
    color_space: ColorSpace,
    label: String,
) -> std::result::Result<TextureData, AssetError> {
    tokio::task::spawn_blocking(move || decode_image_cpu(&bytes, color_space, &label))
        .await
        .map_err(|e| AssetError::TaskJoin(e.to_string()))?
}

/// Decodes PNG / JPEG / HDR bytes into RGBA8.
pub fn decode_image_cpu(
    bytes: &[u8],
    color_space: ColorSpace,
    label: &str,
) -> std::result::Result<TextureData, AssetError> {
    let img = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
        label: label.to_string(),
        reason: e.to_string(),
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    TextureData::from_rgba8(label, width, height, color_space, rgba.into_raw()).ok_or_else(|| {
        AssetError::Decode {
            label: label.to_string(),
            reason: "empty image".to_string(),
        }
    })
}

fn check_cube_faces(label: &str, faces: &[TextureData; 6]) -> std::result::Result<(), AssetError> {
    let (w, h) = (faces[0].width, faces[0].height);
    if let Some(bad) = faces.iter().find(|f| (f.width, f.height) != (w, h)) {
        return Err(AssetError::CubeMap(format!(
            "{label}: face '{}' is {}x{}, expected {w}x{h}",
            bad.label, bad.width, bad.height
        )));
    }
    Ok(())
}

#[cfg(feature = "gltf")]
fn decode_gltf(bytes: &[u8], base: &Path, label: &str) -> std::result::Result<MeshData, AssetError> {
    let decode_err = |reason: String| AssetError::Decode {
        label: label.to_string(),
        reason,
    };

    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| decode_err(e.to_string()))?;
    let buffers = load_gltf_buffers(&gltf, base, label)?;

    let mut mesh = MeshData::default();
    for primitive in gltf.meshes().flat_map(|m| m.primitives()) {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let Some(positions) = reader.read_positions() else {
            continue;
        };

        let base_index = mesh.positions.len() as u32;
        mesh.positions.extend(positions.map(glam::Vec3::from_array));
        let end = mesh.positions.len() as u32;

        match reader.read_indices() {
            Some(indices) => mesh
                .indices
                .extend(indices.into_u32().map(|i| base_index + i)),
            None => mesh.indices.extend(base_index..end),
        }
        mesh.primitive_count += 1;
    }

    if mesh.primitive_count == 0 {
        return Err(decode_err("document contains no triangle data".to_string()));
    }
    Ok(mesh)
}

/// Resolves every buffer of the document: the GLB chunk, an embedded base64
/// `data:` URI, or a file next to it.
#[cfg(feature = "gltf")]
fn load_gltf_buffers(
    gltf: &gltf::Gltf,
    base: &Path,
    label: &str,
) -> std::result::Result<Vec<Vec<u8>>, AssetError> {
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf.blob.as_deref().ok_or_else(|| AssetError::Decode {
                    label: label.to_string(),
                    reason: "missing GLB binary chunk".to_string(),
                })?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                let data = decode_data_uri(uri).map_err(|reason| AssetError::Decode {
                    label: label.to_string(),
                    reason,
                })?;
                buffer_data.push(data);
            }
            gltf::buffer::Source::Uri(uri) => {
                let buffer_path = base.join(uri);
                let data = std::fs::read(&buffer_path).map_err(|e| AssetError::Io {
                    path: buffer_path.display().to_string(),
                    reason: e.to_string(),
                })?;
                buffer_data.push(data);
            }
        }
    }
    Ok(buffer_data)
}

/// Decodes a `data:[<mime>];base64,<payload>` URI.
#[cfg(feature = "gltf")]
fn decode_data_uri(uri: &str) -> std::result::Result<Vec<u8>, String> {
    use base64::Engine as _;

    let (header, payload) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| "malformed data URI".to_string())?;
    if !header.ends_with(";base64") {
        return Err(format!("unsupported data URI encoding '{header}'"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| format!("invalid base64 buffer: {e}"))
}

#[cfg(not(feature = "gltf"))]
fn decode_gltf(_bytes: &[u8], _base: &Path, label: &str) -> std::result::Result<MeshData, AssetError> {
    Err(AssetError::Decode {
        label: label.to_string(),
        reason: "glTF support is disabled (enable the `gltf` feature)".to_string(),
    })
}
