use chrono::Utc;
use ulid::Ulid;

///
/// FieldDefaults
///
/// Source of the values the lifecycle layer fills in: fresh identifiers and
/// the created/modified timestamps (milliseconds since the Unix epoch).
///

pub trait FieldDefaults: Send + Sync {
    fn identifier(&self) -> String;

    fn timestamp(&self) -> i64;
}

///
/// SystemDefaults
/// ULID identifiers and wall-clock UTC milliseconds.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemDefaults;

impl FieldDefaults for SystemDefaults {
    fn identifier(&self) -> String {
        Ulid::new().to_string()
    }

    fn timestamp(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_identifiers_are_distinct_ulids() {
        let a = SystemDefaults.identifier();
        let b = SystemDefaults.identifier();

        assert_ne!(a, b);
        assert!(Ulid::from_string(&a).is_ok());
    }

    #[test]
    fn system_timestamps_are_millis() {
        let now = SystemDefaults.timestamp();

        // 2020-01-01T00:00:00Z
        assert!(now > 1_577_836_800_000);
    }
}
