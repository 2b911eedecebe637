pub mod render;
pub mod transport;

pub use render::RenderQuery;
pub use transport::{HttpTransport, RawResponse, Transport};
