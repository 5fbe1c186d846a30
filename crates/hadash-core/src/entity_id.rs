//! Domain parsing for dotted `domain.object_id` entity identifiers

/// Domain reported for entity ids without a `.` separator
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Extract the domain (device class) from an entity id.
///
/// The domain is the substring before the first `.`
/// (e.g., `"light"` for `"light.living_room"`). Ids without a separator
/// or with an empty domain part map to [`UNKNOWN_DOMAIN`]; this parser is
/// deliberately lenient because registry data arrives from an external
/// source.
pub fn domain_of(entity_id: &str) -> &str {
    match entity_id.split_once('.') {
        Some((domain, _)) if !domain.is_empty() => domain,
        _ => UNKNOWN_DOMAIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("light.living_room"), "light");
        assert_eq!(domain_of("climate.thermostat"), "climate");
    }

    #[test]
    fn test_domain_of_keeps_first_separator() {
        assert_eq!(domain_of("sensor.outdoor.temp"), "sensor");
    }

    #[test]
    fn test_missing_domain_is_unknown() {
        assert_eq!(domain_of("no_separator"), UNKNOWN_DOMAIN);
        assert_eq!(domain_of(".lamp"), UNKNOWN_DOMAIN);
        assert_eq!(domain_of(""), UNKNOWN_DOMAIN);
    }
}
