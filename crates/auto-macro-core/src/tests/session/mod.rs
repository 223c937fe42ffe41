mod coordinator;
mod recorder;
