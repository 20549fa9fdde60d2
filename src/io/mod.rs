// Process-level I/O: signals, the instance lock, and talking to a running instance
pub mod instance;
pub mod lock;
pub mod signals;
