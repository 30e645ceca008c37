pub fn spawn<F, T>(name: &str, f: F) -> std::io::Result<std::thread::JoinHandle<T>>
where
    F: FnOnce() -> T,
    F: Send + 'static,
    T: Send + 'static,
{
    std::thread::Builder::new().name(name.to_string()).spawn(f)
}

#[cfg(test)]
mod tests {
    use crate::utils::thread::spawn;

    #[test]
    pub fn named_thread_test() {
        let handle = spawn("B-test", || {
            std::thread::current().name().map(|name| name.to_string())
        })
        .unwrap();
        assert_eq!(handle.join().unwrap(), Some("B-test".to_string()));
    }
}
