pub mod conversation_cache;
pub mod extractor;
