pub mod genai;
pub mod record_store;
pub mod session_token;
