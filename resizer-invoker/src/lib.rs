//! Image resize invoker
//!
//! Turns a resize event into a call to the external resizer executable and
//! returns its output base64-encoded.

pub mod error;
pub mod handler;
pub mod invoker;
pub mod options;
pub mod output;
pub mod request;

pub use error::ResizeError;
pub use handler::handle;
pub use invoker::{resize, Invoker, InvokerConfig};
pub use options::{build_args, OptionName, OptionSet, OptionValue};
pub use request::{DelegateEnv, ResizeEvent, ResizeRequest};
