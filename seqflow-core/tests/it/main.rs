mod common;
mod exchange;
mod pipeline;
mod reorder;
mod router;
