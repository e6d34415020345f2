use chrono::{SecondsFormat, Utc};
#[cfg(feature = "postgres")]
use diesel::{
    r2d2::{ConnectionManager, Pool},
    PgConnection,
};

#[cfg(feature = "postgres")]
pub type DbPool = Pool<ConnectionManager<PgConnection>>;

#[cfg(feature = "postgres")]
pub fn create_conn(database_url: &str, pool_size: u32) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(pool_size).build(manager)
}

/// Calendar date used for the `modified` field of flows, e.g. `2024-05-01`.
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// UTC timestamp with millisecond precision, e.g. `2024-05-01T10:20:30.123Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_format() {
        let day = today();
        assert_eq!(day.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&day, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn test_timestamp_is_utc_millis() {
        let ts = timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        assert_eq!(ts.len(), "2024-05-01T10:20:30.123Z".len());
    }
}
