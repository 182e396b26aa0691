//! Boundary to the background mesh loader (§5, §6.2): a single SPSC channel
//! pair. The worker never touches the Scene Graph; the main loop drains
//! ready responses once per tick and applies them itself.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use scene_core::entity::MeshHandle;
use scene_core::id::Id;

pub struct MeshLoadRequest {
    pub attachment_id: Id,
    pub paths: Vec<PathBuf>,
}

pub struct LoadedMesh {
    pub path: PathBuf,
    pub handle: MeshHandle,
}

pub enum MeshLoadResponse {
    Ok {
        attachment_id: Id,
        meshes: Vec<LoadedMesh>,
    },
    Err {
        attachment_id: Id,
        path: PathBuf,
        error: String,
    },
}

/// One loader function call per request path; swappable for a real mesh
/// importer. Errors are per-path so a batch can partially succeed.
pub type LoadOne = dyn Fn(&Path) -> Result<MeshHandle, String> + Send;

pub struct MeshLoaderHandle {
    requests: Sender<MeshLoadRequest>,
}

impl MeshLoaderHandle {
    pub fn submit(&self, request: MeshLoadRequest) {
        // The worker end is only dropped when the whole loader is torn
        // down; a send failure past that point is not actionable here.
        let _ = self.requests.send(request);
    }
}

/// Spawns the worker thread and returns the submission handle plus the
/// response receiver the main loop polls every tick.
pub fn spawn(load_one: Box<LoadOne>) -> (MeshLoaderHandle, Receiver<MeshLoadResponse>) {
    let (request_tx, request_rx) = mpsc::channel::<MeshLoadRequest>();
    let (response_tx, response_rx) = mpsc::channel::<MeshLoadResponse>();

    std::thread::spawn(move || {
        for request in request_rx {
            let mut loaded = Vec::new();
            for path in request.paths {
                match load_one(&path) {
                    Ok(handle) => loaded.push(LoadedMesh {
                        path,
                        handle,
                    }),
                    Err(error) => {
                        log::warn!("mesh load failed for {}: {error}", path.display());
                        let _ = response_tx.send(MeshLoadResponse::Err {
                            attachment_id: request.attachment_id,
                            path,
                            error,
                        });
                    }
                }
            }
            let _ = response_tx.send(MeshLoadResponse::Ok {
                attachment_id: request.attachment_id,
                meshes: loaded,
            });
        }
    });

    (MeshLoaderHandle { requests: request_tx }, response_rx)
}

/// Drains every response ready this tick, in send order, handing each to
/// `on_response`. Never blocks.
pub fn drain_ready(rx: &Receiver<MeshLoadResponse>, mut on_response: impl FnMut(MeshLoadResponse)) {
    while let Ok(response) = rx.try_recv() {
        on_response(response);
    }
}
