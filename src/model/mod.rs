//! External model boundaries: the language model process and the imaging classifier.

pub mod imaging;
pub mod invoker;
pub mod process;

pub use imaging::{ImagingModel, PathologyScores, ProcessImagingModel, UnloadedImagingModel};
pub use invoker::{ModelInvoker, ProcessModelInvoker, UNAVAILABLE_MESSAGE};
pub use process::CommandSpec;
