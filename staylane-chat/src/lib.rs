pub mod thread;

pub use thread::{
    get_or_create_thread, record_message, ChatThread, LastMessage, Message, ThreadError,
    ThreadKey, ThreadOutcome, ThreadRepository,
};
