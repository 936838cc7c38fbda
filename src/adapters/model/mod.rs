//! Model adapters. Implement ModelLoader/InferenceSession.
//!
//! Provides the tract ONNX runtime and a mock for testing.

pub mod mock_adapter;
pub mod onnx_adapter;

pub use mock_adapter::{MockModelLoader, MockSession};
pub use onnx_adapter::{OnnxModelLoader, OnnxSession};
