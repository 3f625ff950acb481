use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref GENERATIONS_TOTAL: Counter =
        register_counter!("novelist_generations_total", "Total number of generation requests").unwrap();
    pub static ref GENERATION_FAILURES: Counter =
        register_counter!("novelist_generation_failures_total", "Generations that ended in an error").unwrap();
    pub static ref FRAGMENTS_TOTAL: Counter =
        register_counter!("novelist_fragments_total", "Text fragments received from the model server").unwrap();
    pub static ref GENERATION_LATENCY: Histogram = register_histogram!(
        "novelist_generation_latency_seconds",
        "Time from queueing a generation to its final frame"
    )
    .unwrap();
    pub static ref MODEL_CACHE_SIZE: Gauge =
        register_gauge!("novelist_model_cache_size", "Endpoints with a cached model list").unwrap();
}
