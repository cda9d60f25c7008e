use super::{CandidateFilter, MatchStore, UserDirectory};
use crate::domain::{
    AgeRange, CanonicalPair, Gender, Match, MatchPreferences, MatchStatus, MatchUpdate,
    SwipeAction, User, UserProfile,
};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

const MATCH_COLUMNS: &str = r#"
    id, user_a_id, user_b_id, user_a_action, user_b_action, status,
    compatibility_score, matched_at, version, created_at, updated_at
"#;

const USER_COLUMNS: &str = r#"
    id, name, age, gender, course, branch, college, interests, bio, photos,
    preferred_genders, age_min, age_max, blocked_user_ids,
    email_verified, is_active, is_banned
"#;

#[derive(Debug, sqlx::FromRow)]
struct MatchRow {
    id: Uuid,
    user_a_id: Uuid,
    user_b_id: Uuid,
    user_a_action: Option<String>,
    user_b_action: Option<String>,
    status: String,
    compatibility_score: Option<i16>,
    matched_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_action(value: Option<String>) -> Result<Option<SwipeAction>> {
    value
        .map(|v| {
            v.parse::<SwipeAction>()
                .map_err(|_| AppError::Internal(format!("unknown swipe action in store: {}", v)))
        })
        .transpose()
}

impl TryFrom<MatchRow> for Match {
    type Error = AppError;

    fn try_from(row: MatchRow) -> Result<Self> {
        let compatibility_score = row
            .compatibility_score
            .map(|s| {
                u8::try_from(s)
                    .map_err(|_| AppError::Internal(format!("stored score out of range: {}", s)))
            })
            .transpose()?;

        Ok(Match {
            id: row.id,
            user_a_id: row.user_a_id,
            user_b_id: row.user_b_id,
            user_a_action: parse_action(row.user_a_action)?,
            user_b_action: parse_action(row.user_b_action)?,
            status: row.status.parse::<MatchStatus>()?,
            compatibility_score,
            matched_at: row.matched_at,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL pair ledger (source of truth)
#[derive(Clone)]
pub struct PostgresMatchStore {
    pool: PgPool,
}

impl PostgresMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MatchStore for PostgresMatchStore {
    async fn find_by_pair(&self, pair: &CanonicalPair) -> Result<Option<Match>> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {} FROM matches WHERE user_a_id = $1 AND user_b_id = $2",
            MATCH_COLUMNS
        ))
        .bind(pair.first)
        .bind(pair.second)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Match::try_from).transpose()
    }

    async fn find_by_id(&self, match_id: Uuid) -> Result<Option<Match>> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {} FROM matches WHERE id = $1",
            MATCH_COLUMNS
        ))
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Match::try_from).transpose()
    }

    async fn create_pair(&self, pair: &CanonicalPair) -> Result<Match> {
        // The unique (user_a_id, user_b_id) constraint arbitrates concurrent
        // first swipes; the loser gets no row back.
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            INSERT INTO matches (id, user_a_id, user_b_id, status, version, created_at, updated_at)
            VALUES ($1, $2, $3, 'pending', 0, NOW(), NOW())
            ON CONFLICT (user_a_id, user_b_id) DO NOTHING
            RETURNING {}
            "#,
            MATCH_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(pair.first)
        .bind(pair.second)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                debug!(user_a = %pair.first, user_b = %pair.second, "Created match record");
                Match::try_from(row)
            }
            None => Err(AppError::Conflict(format!(
                "match for pair {} already exists",
                pair.key()
            ))),
        }
    }

    async fn update_pair(
        &self,
        match_id: Uuid,
        expected_version: i64,
        update: &MatchUpdate,
    ) -> Result<Match> {
        update.validate()?;

        let row = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            UPDATE matches
            SET user_a_action = $3,
                user_b_action = $4,
                status = $5,
                compatibility_score = $6,
                matched_at = $7,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
              AND (matched_at IS NULL OR matched_at = $7)
              AND (matched_at IS NOT NULL OR $7::timestamptz IS NULL OR $5 = 'matched')
            RETURNING {}
            "#,
            MATCH_COLUMNS
        ))
        .bind(match_id)
        .bind(expected_version)
        .bind(update.user_a_action.map(|a| a.as_str()))
        .bind(update.user_b_action.map(|a| a.as_str()))
        .bind(update.status.as_str())
        .bind(update.compatibility_score.map(i16::from))
        .bind(update.matched_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Match::try_from(row),
            None => match self.find_by_id(match_id).await? {
                Some(current) if current.version != expected_version => {
                    Err(AppError::Conflict(format!(
                        "match {} is at version {}, expected {}",
                        match_id, current.version, expected_version
                    )))
                }
                Some(current) => {
                    update.validate_against(&current)?;
                    Err(AppError::Internal(format!(
                        "update of match {} rejected by the store",
                        match_id
                    )))
                }
                None => Err(AppError::NotFound(format!("match {}", match_id))),
            },
        }
    }

    async fn counterpart_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT CASE WHEN user_a_id = $1 THEN user_b_id ELSE user_a_id END
            FROM matches
            WHERE user_a_id = $1 OR user_b_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn list_matched(&self, user_id: Uuid) -> Result<Vec<Match>> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            SELECT {}
            FROM matches
            WHERE (user_a_id = $1 OR user_b_id = $1) AND status = 'matched'
            ORDER BY matched_at DESC
            "#,
            MATCH_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Match::try_from).collect()
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    age: i32,
    gender: String,
    course: Option<String>,
    branch: Option<String>,
    college: Option<String>,
    interests: Vec<String>,
    bio: Option<String>,
    photos: Vec<String>,
    preferred_genders: Vec<String>,
    age_min: Option<i32>,
    age_max: Option<i32>,
    blocked_user_ids: Vec<Uuid>,
    email_verified: bool,
    is_active: bool,
    is_banned: bool,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        let gender = row.gender.parse::<Gender>().map_err(AppError::Internal)?;
        let genders = row
            .preferred_genders
            .iter()
            .map(|g| g.parse::<Gender>().map_err(AppError::Internal))
            .collect::<Result<Vec<_>>>()?;
        let age_range = match (row.age_min, row.age_max) {
            (Some(min), Some(max)) => Some(AgeRange { min, max }),
            _ => None,
        };

        Ok(User {
            id: row.id,
            profile: UserProfile {
                name: row.name,
                age: row.age,
                gender,
                course: row.course,
                branch: row.branch,
                college: row.college,
                interests: row.interests,
                bio: row.bio,
                photos: row.photos,
            },
            preferences: MatchPreferences { genders, age_range },
            blocked_user_ids: row.blocked_user_ids,
            email_verified: row.email_verified,
            is_active: row.is_active,
            is_banned: row.is_banned,
        })
    }
}

/// Reads the `users` projection maintained by the user-management service
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<User>> {
        let exclude: Vec<Uuid> = filter.exclude_ids.iter().copied().collect();
        let genders: Vec<&str> = filter.genders.iter().map(|g| g.as_str()).collect();
        let (age_min, age_max) = match filter.age_range {
            Some(range) => (Some(range.min), Some(range.max)),
            None => (None, None),
        };

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE NOT (id = ANY($1))
              AND email_verified
              AND is_active
              AND NOT is_banned
              AND (cardinality($2::text[]) = 0 OR gender = ANY($2))
              AND ($3::int4 IS NULL OR age >= $3)
              AND ($4::int4 IS NULL OR age <= $4)
              AND NOT ($6 = ANY(blocked_user_ids))
            ORDER BY created_at
            LIMIT $5
            "#,
            USER_COLUMNS
        ))
        .bind(&exclude)
        .bind(&genders)
        .bind(age_min)
        .bind(age_max)
        .bind(filter.limit as i64)
        .bind(filter.requester_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}
