use once_cell::sync::Lazy;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

/// Runs `fut` on the shared tokio runtime and hands its output to `done` on
/// the GTK main loop. A panicking task is logged and `done` is not called.
pub fn run_async_to_main<T, Fut, F>(fut: Fut, done: F)
where
    T: Send + 'static,
    Fut: std::future::Future<Output = T> + Send + 'static,
    F: FnOnce(T) + 'static,
{
    let handle = RUNTIME.spawn(fut);
    glib::MainContext::default().spawn_local(async move {
        match handle.await {
            Ok(value) => done(value),
            Err(e) => log::error!("background task failed: {e}"),
        }
    });
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return crate::app::DEFAULT_API_URL.to_string();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_adds_scheme_and_drops_slash() {
        assert_eq!(normalize_url(" localhost:8080/ "), "http://localhost:8080");
        assert_eq!(normalize_url("https://api.example.com/"), "https://api.example.com");
        assert_eq!(normalize_url(""), crate::app::DEFAULT_API_URL);
    }
}
