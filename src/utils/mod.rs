pub(crate) mod logging;

pub(crate) use logging::{bootstrap_dispatch, init_tracing};
