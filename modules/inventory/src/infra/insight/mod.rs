pub mod http_chat_client;

pub use http_chat_client::HttpChatClient;
