use annwire::error::{ClientError, ErrorKind};

/// Assert that a vector has unit L2 norm.
pub fn assert_unit_norm(values: &[f32]) {
    let norm_sq: f32 = values.iter().map(|x| x * x).sum();
    assert!(
        (norm_sq - 1.0).abs() < 1e-5,
        "expected unit norm, got squared norm {norm_sq} for {values:?}"
    );
}

/// Assert that the error is a server-reported protocol error with exactly `message`.
pub fn assert_protocol_error(err: &ClientError, message: &str) {
    match err {
        ClientError::Protocol { message: got } => assert_eq!(got, message),
        other => panic!("expected protocol error '{message}', got: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

/// Assert the coarse classification of an error.
pub fn assert_kind(err: &ClientError, kind: ErrorKind) {
    assert_eq!(err.kind(), kind, "unexpected error kind for {err:?}");
}

/// Number of bracketed vectors in a command line.
pub fn vector_count(line: &str) -> usize {
    line.matches('[').count()
}
