mod dataset;
mod dispatch;
mod error;
mod extract;
mod query;

pub use dataset::{load, PaperRecord};
pub use dispatch::{dispatch, TOOL_NAME};
pub use error::{AgentError, Result};
pub use extract::{extract, ToolCallRequest};
pub use query::{search, Comparator, SearchQuery};
