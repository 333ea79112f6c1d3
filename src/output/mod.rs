pub mod channel;
pub mod sentence;
