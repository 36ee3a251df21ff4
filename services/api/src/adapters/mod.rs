pub mod chat_llm;
pub mod db;
pub mod job_market;

pub use chat_llm::ChatCompletionAdapter;
pub use db::DbAdapter;
pub use job_market::LlmJobMarketAdapter;
