pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urljoin_handles_slashes() {
        assert_eq!(urljoin("http://h/", "/api/v1"), "http://h/api/v1");
        assert_eq!(urljoin("http://h", "api/v1"), "http://h/api/v1");
        assert_eq!(urljoin("http://h", "https://other/x"), "https://other/x");
    }
}
