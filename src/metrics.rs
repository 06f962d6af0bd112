use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static::lazy_static! {
    pub static ref COMMANDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "annwire_commands_total", "Commands sent", &["verb", "outcome"]
    ).unwrap();
    pub static ref COMMAND_DURATION: HistogramVec = register_histogram_vec!(
        "annwire_command_duration_seconds", "Request/response round trip", &["verb"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0]
    ).unwrap();
    pub static ref FRAME_BYTES: HistogramVec = register_histogram_vec!(
        "annwire_frame_bytes", "Size of request and response lines", &["direction"],
        prometheus::exponential_buckets(16.0, 4.0, 12).unwrap()
    ).unwrap();
    pub static ref VECTORS_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        "annwire_vectors_sent_total", "Vectors transferred to the server", &["verb"]
    ).unwrap();
}

pub fn init() {
    lazy_static::initialize(&COMMANDS_TOTAL);
    lazy_static::initialize(&COMMAND_DURATION);
    lazy_static::initialize(&FRAME_BYTES);
    lazy_static::initialize(&VECTORS_SENT_TOTAL);
}
