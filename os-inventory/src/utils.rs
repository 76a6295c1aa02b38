pub fn chunked<T: Clone>(v: &[T], size: usize) -> Vec<Vec<T>> {
    v.chunks(size.max(1)).map(|c| c.to_vec()).collect()
}

pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_keeps_remainder() {
        let v: Vec<u32> = (1..=7).collect();
        let sizes: Vec<usize> = chunked(&v, 3).iter().map(Vec::len).collect();
        assert_eq!(sizes, [3, 3, 1]);
        assert!(chunked::<u32>(&[], 3).is_empty());
    }
}
