use std::path::PathBuf;

pub type RevealResult<T> = Result<T, RevealError>;

#[derive(thiserror::Error, Debug)]
pub enum RevealError {
    #[error("graph error: {0}")]
    Graph(String),

    #[error("stage error: `{input}` is not available in the {stage} stage")]
    Stage {
        input: &'static str,
        stage: &'static str,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse gallery config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("gpu error: {0}")]
    Gpu(String),

    #[error(transparent)]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error(transparent)]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

impl RevealError {
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }
}
