mod processor;

pub use processor::AsyncProcessor;
