mod pipeline;
mod server;
