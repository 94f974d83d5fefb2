use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use tracing::info;

/// Backend the classifier is trained on.
pub type TrainBackend = Autodiff<NdArray>;

/// Initializes the CPU device used for training and scoring.
///
/// This function only exists to be able to change the device at a single location.
#[must_use]
pub fn init_device() -> NdArrayDevice {
    info!("Initializing ndarray CPU device...");
    NdArrayDevice::default()
}
