/// Sentence embedding models running locally through fastembed's ONNX runtime.
#[cfg(feature = "fe-local")]
pub mod local;
