pub mod ai;
pub mod test_dependencies;
pub mod traits;

pub use ai::OpenAIClient;
pub use traits::BaseAI;
