//! Tracing bootstrap. Unlike an unconditional bootstrap, this whole module is gated behind the
//! `setup_tracing` feature, so the optional `ctor`/`tracing-subscriber` dependencies are never
//! pulled in by default.

#[cfg(feature = "setup_tracing")]
mod imp {
    use ctor::ctor;
    use tracing::Level;

    #[ctor]
    fn set_debug_level() {
        if std::env::var("DEBUG_GEOINDEX")
            .map_or(true, |v| v == "0" || v == "false" || v.is_empty())
        {
            // Logging stays disabled.
        } else {
            tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();
        }
    }
}
