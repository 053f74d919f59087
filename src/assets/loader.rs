//! Background asset loading with a completion queue drained by the render thread

use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use crate::gfx::{
    resources::{
        material::Material,
        texture_resource::{CubeMapData, TextureData},
    },
    scene::{NodeId, NodeTree, Transform},
};

use super::{
    label::{parse_font, render_label, LabelRequest},
    model::load_model_tree,
    texture_data::{decode_cube_map, decode_texture},
    AssetError,
};

pub type LoadId = u64;

/// A model to load and how to place it once loaded
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Relative to the loader's asset root
    pub path: PathBuf,
    pub name: String,
    pub transform: Transform,
    /// Replaces every mesh material in the loaded model
    pub material_override: Option<Material>,
    /// Inserted as separate roots alongside the model
    pub attachments: Vec<NodeTree>,
}

impl ModelRequest {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, transform: Transform) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            transform,
            material_override: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_material_override(mut self, material: Material) -> Self {
        self.material_override = Some(material);
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<NodeTree>) -> Self {
        self.attachments.push(attachment.into());
        self
    }
}

/// Decoded asset ready to be placed on the render thread
#[derive(Debug)]
pub enum LoadedAsset {
    Model {
        tree: NodeTree,
        attachments: Vec<NodeTree>,
    },
    /// Texture for the material of `target`
    Texture {
        target: NodeId,
        texture: Arc<TextureData>,
    },
    CubeMap(Arc<CubeMapData>),
}

#[derive(Debug)]
pub struct LoadCompletion {
    pub id: LoadId,
    pub path: PathBuf,
    pub result: Result<LoadedAsset, AssetError>,
}

/// Spawns one short-lived worker thread per request
pub struct AssetLoader {
    root: PathBuf,
    sender: Sender<LoadCompletion>,
    receiver: Receiver<LoadCompletion>,
    next_id: LoadId,
    in_flight: usize,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            root: root.into(),
            sender,
            receiver,
            next_id: 0,
            in_flight: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_model(&mut self, request: ModelRequest) -> LoadId {
        let path = self.root.join(&request.path);
        let job_path = path.clone();
        self.spawn(path, move || {
            let mut tree = load_model_tree(&job_path, &request.name)?;
            tree.node.transform = request.transform;
            tree.visit_mut(&mut |node| {
                if node.is_mesh() {
                    node.cast_shadow = true;
                    node.receive_shadow = true;
                    if let (Some(material), Some(replacement)) =
                        (node.material_mut(), &request.material_override)
                    {
                        *material = replacement.clone();
                    }
                }
            });
            Ok(LoadedAsset::Model {
                tree,
                attachments: request.attachments,
            })
        })
    }

    pub fn load_texture(&mut self, path: impl AsRef<Path>, target: NodeId) -> LoadId {
        let path = self.root.join(path);
        let job_path = path.clone();
        self.spawn(path, move || {
            Ok(LoadedAsset::Texture {
                target,
                texture: Arc::new(decode_texture(&job_path)?),
            })
        })
    }

    /// Rasterizes `request` with the font at `font_path` into a texture for the
    /// material of `target`
    pub fn load_label(
        &mut self,
        font_path: impl AsRef<Path>,
        request: LabelRequest,
        target: NodeId,
    ) -> LoadId {
        let path = self.root.join(font_path);
        let job_path = path.clone();
        self.spawn(path, move || {
            let bytes = std::fs::read(&job_path).map_err(|source| AssetError::Io {
                path: job_path.clone(),
                source,
            })?;
            let font = parse_font(&job_path, &bytes)?;
            Ok(LoadedAsset::Texture {
                target,
                texture: Arc::new(render_label(&font, &request)?),
            })
        })
    }

    /// Faces ordered +X, -X, +Y, -Y, +Z, -Z
    pub fn load_cube_map(&mut self, faces: [PathBuf; 6]) -> LoadId {
        let faces = faces.map(|face| self.root.join(face));
        let path = faces[0].clone();
        self.spawn(path, move || {
            Ok(LoadedAsset::CubeMap(Arc::new(decode_cube_map(&faces)?)))
        })
    }

    fn spawn<F>(&mut self, path: PathBuf, job: F) -> LoadId
    where
        F: FnOnce() -> Result<LoadedAsset, AssetError> + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.in_flight += 1;
        log::debug!("Loading asset #{id} from {}", path.display());

        let sender = self.sender.clone();
        let job_path = path.clone();
        let spawned = thread::Builder::new()
            .name(format!("asset-loader-{id}"))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(job))
                    .unwrap_or_else(|_| Err(AssetError::WorkerPanicked(job_path.clone())));
                // Receiver gone means the app is shutting down
                let _ = sender.send(LoadCompletion {
                    id,
                    path: job_path,
                    result,
                });
            });

        if let Err(err) = spawned {
            let _ = self.sender.send(LoadCompletion {
                id,
                path,
                result: Err(AssetError::Spawn(err)),
            });
        }
        id
    }

    /// Returns every completion received so far without blocking.
    pub fn drain(&mut self) -> Vec<LoadCompletion> {
        let completions: Vec<_> = self.receiver.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(completions.len());
        completions
    }

    /// Blocks until every request has completed or `timeout` elapses.
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<LoadCompletion> {
        let deadline = Instant::now() + timeout;
        let mut completions = Vec::new();

        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(completion) => {
                    self.in_flight -= 1;
                    completions.push(completion);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        completions
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}
