use serde::de::DeserializeOwned;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse an optional status filter.
pub fn parse_status<T>(raw: Option<&str>) -> anyhow::Result<Option<T>>
where
    T: DeserializeOwned,
{
    raw.map(|value| parse_enum(value, "status")).transpose()
}

#[cfg(test)]
mod tests {
    use cap_core::enums::{GroupStatus, SupervisionStatus};

    use super::{parse_enum, parse_status};

    #[test]
    fn parses_snake_case_enum() {
        let status: GroupStatus = parse_enum("forming", "status").expect("status should parse");
        assert_eq!(status, GroupStatus::Forming);
    }

    #[test]
    fn missing_filter_is_none() {
        let status: Option<SupervisionStatus> = parse_status(None).expect("none should parse");
        assert_eq!(status, None);
    }

    #[test]
    fn errors_on_invalid_enum() {
        let err = parse_enum::<GroupStatus>("done", "status").expect_err("should fail");
        assert!(err.to_string().contains("invalid status 'done'"));
    }
}
