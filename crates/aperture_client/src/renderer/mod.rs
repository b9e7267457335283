pub mod backend;
pub mod context;
pub mod portal_scene;
pub mod recorder;

pub use backend::{DepthCompare, ProgramKind, RenderBackend, StencilOp, Uniform, UniformValue};
pub use context::{FrameGuard, RasterFlags, RasterState, RenderContext};
pub use portal_scene::{FrameParams, PortalSceneRenderer, RenderStats};
pub use recorder::{DrawRecord, RecordingBackend, RenderCommand};
