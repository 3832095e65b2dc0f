//! Header masking for logging (§4.2 "Header masking").

use std::collections::{BTreeMap, BTreeSet};

pub const MASKED_PLACEHOLDER: &str = "[MASKED]";

pub fn mask_headers(
    headers: &BTreeMap<String, String>,
    sensitive_headers: &BTreeSet<String>,
) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked = sensitive_headers
                .iter()
                .any(|sensitive| sensitive.eq_ignore_ascii_case(name));
            if masked {
                (name.clone(), MASKED_PLACEHOLDER.to_string())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{mask_headers, MASKED_PLACEHOLDER};
    use std::collections::BTreeMap;

    #[test]
    fn unit_mask_headers_replaces_case_insensitive_matches() {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer abc".to_string());
        headers.insert("X-Request-Id".to_string(), "req-1".to_string());
        let sensitive = ["authorization".to_string()].into_iter().collect();

        let masked = mask_headers(&headers, &sensitive);
        assert_eq!(masked.get("Authorization"), Some(&MASKED_PLACEHOLDER.to_string()));
        assert_eq!(masked.get("X-Request-Id"), Some(&"req-1".to_string()));
    }
}
