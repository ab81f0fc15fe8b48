pub mod backend;
pub mod broker;
pub mod cpal_backend;

pub use backend::{
    AudioFrame, CaptureBackend, CaptureConfig, CaptureConstraints, CaptureFactory,
    CpalCaptureFactory,
};
pub use broker::{CaptureBroker, CaptureHandle};
pub use cpal_backend::CpalBackend;
