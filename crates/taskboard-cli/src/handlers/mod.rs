pub mod board;
pub mod reorder;
pub mod task;
