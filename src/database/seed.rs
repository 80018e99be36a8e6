use sqlx::MySqlPool;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleUser {
    pub name: &'static str,
    pub max_daily_limit: i64,
    pub email: &'static str,
}

pub const SAMPLE_USERS: [SampleUser; 3] = [
    SampleUser {
        name: "Rex",
        max_daily_limit: 5,
        email: "rex@gmail.com.ph",
    },
    SampleUser {
        name: "Riz",
        max_daily_limit: 4,
        email: "riz@gmail.com.ph",
    },
    SampleUser {
        name: "Roux",
        max_daily_limit: 3,
        email: "roux@gmail.com.ph",
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Live rows found before seeding. Seeding only runs when this is zero.
    pub existing: i64,
    pub inserted: usize,
    pub failed: usize,
}

pub async fn count_users(db: &MySqlPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
        .fetch_one(db)
        .await
}

/// Inserts the sample users when the users table has no live rows.
///
/// Count-then-insert is not atomic: two instances starting together against an
/// empty table can both seed. Individual insert failures are logged and
/// counted, they never abort startup.
pub async fn seed_users(db: &MySqlPool) -> Result<SeedReport, sqlx::Error> {
    let existing = count_users(db).await?;
    let mut report = SeedReport {
        existing,
        ..SeedReport::default()
    };
    if existing != 0 {
        return Ok(report);
    }

    for user in &SAMPLE_USERS {
        let result = sqlx::query(
            "INSERT INTO users (created_at, updated_at, name, max_daily_limit, email) \
             VALUES (NOW(3), NOW(3), ?, ?, ?)",
        )
        .bind(user.name)
        .bind(user.max_daily_limit)
        .bind(user.email)
        .execute(db)
        .await;

        match result {
            Ok(_) => report.inserted += 1,
            Err(err) => {
                warn!(user = user.name, "could not seed sample user: {}", err);
                report.failed += 1;
            }
        }
    }

    info!(inserted = report.inserted, failed = report.failed, "seeded sample users");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_users_match_expected_names_and_limits() {
        let names: Vec<_> = SAMPLE_USERS.iter().map(|u| u.name).collect();
        let limits: Vec<_> = SAMPLE_USERS.iter().map(|u| u.max_daily_limit).collect();
        assert_eq!(names, ["Rex", "Riz", "Roux"]);
        assert_eq!(limits, [5, 4, 3]);
    }

    #[test]
    fn sample_emails_are_distinct() {
        let mut emails: Vec<_> = SAMPLE_USERS.iter().map(|u| u.email).collect();
        emails.sort_unstable();
        emails.dedup();
        assert_eq!(emails.len(), SAMPLE_USERS.len());
    }
}
